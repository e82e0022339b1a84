//! Real-time socket events.
//!
//! Every frame on the socket is a JSON text message shaped as an envelope:
//!
//! ```text
//! { "event": "<name>", "data": <payload> }
//! ```
//!
//! The event name selects the payload schema. Outbound events are the
//! client's room-membership and send intents; inbound events are pushes from
//! the server.
//!
//! # Invariants
//!
//! Each variant maps to exactly one event name (enforced by match
//! exhaustiveness in [`OutboundEvent::name`] and [`InboundEvent::name`]).

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    GroupId, MessageId, UserId,
    errors::{ProtocolError, Result},
};

/// Envelope wrapping every socket frame.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Intents sent from the client to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// Subscribe to a group's room.
    JoinGroup {
        /// Group to join.
        group_id: GroupId,
    },

    /// Unsubscribe from a group's room.
    LeaveGroup {
        /// Group to leave.
        group_id: GroupId,
    },

    /// Post a message to a group.
    SendMessage {
        /// Target group.
        group_id: GroupId,
        /// Message text.
        content: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageData<'a> {
    group_id: &'a GroupId,
    content: &'a str,
}

impl OutboundEvent {
    /// Event name on the wire.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::JoinGroup { .. } => "join_group",
            Self::LeaveGroup { .. } => "leave_group",
            Self::SendMessage { .. } => "send_message",
        }
    }

    /// Group this event targets.
    pub fn group_id(&self) -> &GroupId {
        match self {
            Self::JoinGroup { group_id }
            | Self::LeaveGroup { group_id }
            | Self::SendMessage { group_id, .. } => group_id,
        }
    }

    /// Encode as a JSON text frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if serialization fails
    pub fn encode(&self) -> Result<String> {
        let data = match self {
            Self::JoinGroup { group_id } | Self::LeaveGroup { group_id } => {
                serde_json::to_value(group_id)
            },
            Self::SendMessage { group_id, content } => {
                serde_json::to_value(SendMessageData { group_id, content })
            },
        }
        .map_err(|e| ProtocolError::Encode(e.to_string()))?;

        serde_json::to_string(&Envelope { event: self.name().to_owned(), data })
            .map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

/// User as carried by real-time pushes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUser {
    /// User identifier.
    pub id: UserId,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Avatar URL, if the user has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl WireUser {
    /// Display name, `"First Last"`, trimmed when either part is missing.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_owned()
    }
}

/// Message pushed by the server to every member of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    /// Server-assigned message identifier.
    pub id: MessageId,
    /// Group the message was posted to.
    pub group_id: GroupId,
    /// Message text.
    pub content: String,
    /// Author.
    pub sender: WireUser,
    /// Server timestamp (RFC 3339).
    #[serde(default)]
    pub timestamp: String,
}

/// Membership change pushed when a user joins or leaves a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipChange {
    /// Affected group.
    pub group_id: GroupId,
    /// Change details.
    pub data: MembershipData,
}

/// Body of a [`MembershipChange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipData {
    /// User who joined or left.
    pub user: WireUser,
    /// Member count after the change.
    pub member_count: u32,
}

/// Pushes received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// New message in a room.
    NewMessage(WireMessage),
    /// A user joined a group.
    MemberJoined(MembershipChange),
    /// A user left a group.
    MemberLeft(MembershipChange),
}

impl InboundEvent {
    /// Event name on the wire.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NewMessage(_) => "new_message",
            Self::MemberJoined(_) => "member_joined",
            Self::MemberLeft(_) => "member_left",
        }
    }

    /// Group this event concerns.
    pub fn group_id(&self) -> &GroupId {
        match self {
            Self::NewMessage(message) => &message.group_id,
            Self::MemberJoined(change) | Self::MemberLeft(change) => &change.group_id,
        }
    }

    /// Decode a JSON text frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Decode` if the frame is not an envelope or the data
    ///   does not match the event's schema
    /// - `ProtocolError::UnknownEvent` if the event name is not recognized
    pub fn decode(text: &str) -> Result<Self> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(|e| ProtocolError::Decode(e.to_string()))?;

        match envelope.event.as_str() {
            "new_message" => Ok(Self::NewMessage(data(envelope.data)?)),
            "member_joined" => Ok(Self::MemberJoined(data(envelope.data)?)),
            "member_left" => Ok(Self::MemberLeft(data(envelope.data)?)),
            _ => Err(ProtocolError::UnknownEvent(envelope.event)),
        }
    }

    /// Encode as a JSON text frame. Used by test servers and simulations.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if serialization fails
    pub fn encode(&self) -> Result<String> {
        let data = match self {
            Self::NewMessage(message) => serde_json::to_value(message),
            Self::MemberJoined(change) | Self::MemberLeft(change) => serde_json::to_value(change),
        }
        .map_err(|e| ProtocolError::Encode(e.to_string()))?;

        serde_json::to_string(&Envelope { event: self.name().to_owned(), data })
            .map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

fn data<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ProtocolError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_group_wire_shape() {
        let event = OutboundEvent::JoinGroup { group_id: GroupId::from("g1") };
        let json: Value = serde_json::from_str(&event.encode().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({ "event": "join_group", "data": "g1" }));
    }

    #[test]
    fn send_message_uses_camel_case() {
        let event =
            OutboundEvent::SendMessage { group_id: GroupId::from("g1"), content: "hi".into() };
        let json: Value = serde_json::from_str(&event.encode().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "send_message",
                "data": { "groupId": "g1", "content": "hi" }
            })
        );
    }

    #[test]
    fn decode_new_message() {
        let text = r#"{
            "event": "new_message",
            "data": {
                "id": 7,
                "groupId": "g1",
                "content": "hello",
                "sender": { "id": 3, "firstName": "Ada", "lastName": "Lovelace" },
                "timestamp": "2024-05-01T10:15:00Z"
            }
        }"#;

        let event = InboundEvent::decode(text).unwrap();
        let InboundEvent::NewMessage(message) = event else {
            panic!("expected NewMessage");
        };
        assert_eq!(message.id, MessageId::from("7"));
        assert_eq!(message.sender.id, UserId::from("3"));
        assert_eq!(message.sender.display_name(), "Ada Lovelace");
        assert_eq!(message.sender.avatar, None);
    }

    #[test]
    fn decode_member_left() {
        let text = r#"{
            "event": "member_left",
            "data": {
                "groupId": "g2",
                "data": { "user": { "id": "u9", "firstName": "Bo" }, "memberCount": 4 }
            }
        }"#;

        let event = InboundEvent::decode(text).unwrap();
        assert_eq!(event.group_id(), &GroupId::from("g2"));
        let InboundEvent::MemberLeft(change) = event else {
            panic!("expected MemberLeft");
        };
        assert_eq!(change.data.member_count, 4);
        assert_eq!(change.data.user.display_name(), "Bo");
    }

    #[test]
    fn unknown_event_is_ignorable() {
        let err = InboundEvent::decode(r#"{"event":"typing","data":{}}"#).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownEvent("typing".into()));
        assert!(err.is_ignorable());
    }

    #[test]
    fn malformed_payload_is_not_ignorable() {
        let err = InboundEvent::decode(r#"{"event":"new_message","data":{"id":1}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
        assert!(!err.is_ignorable());

        let err = InboundEvent::decode("not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }
}
