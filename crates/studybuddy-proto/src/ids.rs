//! Identifier newtypes.
//!
//! The backend hands out identifiers as JSON strings in some endpoints and as
//! integers in others. Every identifier here accepts both on the way in and is
//! always stored (and sent back) as a string, so equality is never sensitive
//! to which endpoint produced the value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw identifier as it may appear on the wire.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    /// JSON string.
    Text(String),
    /// Negative or small JSON integer.
    Signed(i64),
    /// JSON integer above `i64::MAX`.
    Unsigned(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Signed(n) => n.to_string(),
            RawId::Unsigned(n) => n.to_string(),
        }
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(from = "RawId", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<RawId> for $name {
            fn from(raw: RawId) -> Self {
                Self(raw.into())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id! {
    /// Study group (chat room) identifier.
    GroupId
}

string_id! {
    /// Chat message identifier, server-assigned or client-temporary.
    MessageId
}

string_id! {
    /// User identifier.
    UserId
}

string_id! {
    /// Course identifier.
    CourseId
}

string_id! {
    /// Lesson identifier, unique within a course.
    LessonId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_decode_as_strings() {
        let id: GroupId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_str(), "42");

        let id: GroupId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(id, GroupId::from("42"));
    }

    #[test]
    fn ids_encode_as_strings() {
        let json = serde_json::to_string(&MessageId::new("m-1")).unwrap();
        assert_eq!(json, "\"m-1\"");
    }
}
