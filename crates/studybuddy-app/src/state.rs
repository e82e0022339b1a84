//! Application state types.
//!
//! These are the values a UI renders. They never hold instants or sockets:
//! timestamps are pre-formatted labels and the connection is summarized as a
//! [`ConnectionStatus`].

use std::time::Duration;

use studybuddy_proto::{GroupId, GroupSummary, MessageId};

use crate::sender::OWN_SENDER_LABEL;

/// Connection status as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// Not connected, not trying.
    #[default]
    Offline,
    /// Opening a transport.
    Connecting,
    /// Transport open, events flowing.
    Online,
    /// Transport dropped, retry scheduled.
    Reconnecting {
        /// Attempt number of the scheduled retry (1-based).
        attempt: u32,
        /// Delay before the retry fires.
        delay: Duration,
    },
    /// Retry budget spent. Only a manual connect resumes.
    GaveUp,
}

impl ConnectionStatus {
    /// True when outbound events will be delivered.
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

/// A study group the viewer belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Group identifier.
    pub id: GroupId,
    /// Display name.
    pub name: String,
    /// Subject category.
    pub category: String,
    /// Number of members, kept current by membership events.
    pub member_count: u32,
}

impl From<GroupSummary> for Group {
    fn from(summary: GroupSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            category: summary.category,
            member_count: summary.member_count,
        }
    }
}

/// A message in a group's thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Unique within the group. Server-assigned, or client-generated for
    /// optimistic sends.
    pub id: MessageId,
    /// Group the message belongs to.
    pub group_id: GroupId,
    /// Author label, `"You"` for the viewer's own messages.
    pub sender: String,
    /// Message text.
    pub content: String,
    /// `HH:MM` label.
    pub timestamp: String,
}

impl ChatMessage {
    /// Whether the viewer wrote this message.
    pub fn is_own(&self) -> bool {
        self.sender == OWN_SENDER_LABEL
    }
}
