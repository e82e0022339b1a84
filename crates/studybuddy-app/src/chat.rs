//! Chat reducers.
//!
//! [`ChatState`] combines the message store, unread tracker and selection
//! cursor behind the operations a session performs: send, receive, bulk
//! load, mark-read and select.
//!
//! Receiving a message authored by someone else increments the group's
//! unread counter whether or not the group is selected. Keeping the selected
//! group at zero is the caller's job, done by selecting or by
//! [`ChatState::mark_group_as_read`].

use chrono::FixedOffset;
use studybuddy_core::clock;
use studybuddy_proto::{GroupId, MessageId};

use crate::{
    messages::MessageStore,
    selection::{SelectionChange, SelectionCursor},
    sender::OWN_SENDER_LABEL,
    state::{ChatMessage, Group},
    unread::UnreadTracker,
};

/// Ingestion payload for a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    /// Target group.
    pub group_id: GroupId,
    /// Message text.
    pub content: String,
    /// Author label, already normalized to `"You"` for the viewer.
    pub sender: String,
    /// Server id. A client id is generated when absent.
    pub id: Option<MessageId>,
}

/// Messages, unread counters and selection for one session.
#[derive(Debug, Clone)]
pub struct ChatState {
    messages: MessageStore,
    unread: UnreadTracker,
    selection: SelectionCursor,
    offset: FixedOffset,
    local_seq: u64,
}

impl ChatState {
    /// Create empty state formatting timestamps in `offset`.
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            messages: MessageStore::new(),
            unread: UnreadTracker::new(),
            selection: SelectionCursor::new(),
            offset,
            local_seq: 0,
        }
    }

    /// Stored messages.
    pub fn messages(&self) -> &MessageStore {
        &self.messages
    }

    /// Unread counters.
    pub fn unread(&self) -> &UnreadTracker {
        &self.unread
    }

    /// Selected group.
    pub fn selected(&self) -> Option<&GroupId> {
        self.selection.selected()
    }

    /// Append a message the viewer wrote.
    ///
    /// Returns the id it was stored under, or `None` if the group already
    /// holds a message with that id.
    pub fn send_message(&mut self, message: NewMessage, now_millis: i64) -> Option<MessageId> {
        let (chat_message, id) = self.stamp(message, now_millis);
        self.messages.insert(chat_message).then_some(id)
    }

    /// Append a message from the real-time channel.
    ///
    /// Messages not labelled `"You"` bump the group's unread counter.
    /// Duplicates neither insert nor count. Returns whether it was inserted.
    pub fn receive_message(&mut self, message: NewMessage, now_millis: i64) -> bool {
        let (chat_message, _) = self.stamp(message, now_millis);
        let group_id = chat_message.group_id.clone();
        let from_other = chat_message.sender != OWN_SENDER_LABEL;

        if !self.messages.insert(chat_message) {
            tracing::trace!(group = %group_id, "duplicate message ignored");
            return false;
        }

        if from_other {
            self.unread.increment(&group_id);
        }
        true
    }

    /// Merge a page of already-formatted messages into `group_id`.
    ///
    /// Never touches unread counters. Returns the number added.
    pub fn load_messages(&mut self, group_id: &GroupId, messages: Vec<ChatMessage>) -> usize {
        let offered = messages.len();
        let added = self.messages.merge(group_id, messages);
        tracing::debug!(group = %group_id, offered, added, "history merged");
        added
    }

    /// Zero `group_id`'s unread counter regardless of selection.
    pub fn mark_group_as_read(&mut self, group_id: &GroupId) {
        self.unread.clear(group_id);
    }

    /// Move the selection to `group_id`.
    pub fn select_group(&mut self, group_id: GroupId) -> SelectionChange {
        self.selection.select(group_id, &mut self.unread)
    }

    /// Re-derive the selection after the membership list changed.
    pub fn reconcile(&mut self, groups: &[Group]) -> SelectionChange {
        self.selection.reconcile(groups, &mut self.unread)
    }

    fn stamp(&mut self, message: NewMessage, now_millis: i64) -> (ChatMessage, MessageId) {
        let id = match message.id {
            Some(id) => id,
            None => self.local_id(now_millis),
        };
        let chat_message = ChatMessage {
            id: id.clone(),
            group_id: message.group_id,
            sender: message.sender,
            content: message.content,
            timestamp: clock::display_time(now_millis, self.offset),
        };
        (chat_message, id)
    }

    /// Timestamp-based id with a sequence suffix, so two sends in the same
    /// millisecond stay distinct.
    fn local_id(&mut self, now_millis: i64) -> MessageId {
        self.local_seq += 1;
        MessageId::new(format!("local-{now_millis}-{}", self.local_seq))
    }
}
