//! Per-group message threads.

use std::collections::{HashMap, HashSet};

use studybuddy_proto::{GroupId, MessageId};

use crate::state::ChatMessage;

#[derive(Debug, Clone, Default)]
struct Thread {
    messages: Vec<ChatMessage>,
    ids: HashSet<MessageId>,
}

impl Thread {
    fn push(&mut self, message: ChatMessage) -> bool {
        if !self.ids.insert(message.id.clone()) {
            return false;
        }
        self.messages.push(message);
        true
    }
}

/// Ordered messages keyed by group.
///
/// Each thread keeps arrival order and never holds two messages with the
/// same id. Inserting a duplicate is a silent no-op.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    threads: HashMap<GroupId, Thread>,
}

impl MessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` to its group's thread.
    ///
    /// Returns `false` if the thread already holds a message with this id.
    pub fn insert(&mut self, message: ChatMessage) -> bool {
        self.threads.entry(message.group_id.clone()).or_default().push(message)
    }

    /// Append a batch to `group_id`'s thread, skipping ids already present.
    ///
    /// Every message is re-homed to `group_id`. Returns the number added.
    pub fn merge(
        &mut self,
        group_id: &GroupId,
        messages: impl IntoIterator<Item = ChatMessage>,
    ) -> usize {
        let thread = self.threads.entry(group_id.clone()).or_default();
        messages
            .into_iter()
            .map(|mut message| {
                message.group_id = group_id.clone();
                thread.push(message)
            })
            .filter(|added| *added)
            .count()
    }

    /// Whether `group_id`'s thread holds `message_id`.
    pub fn contains(&self, group_id: &GroupId, message_id: &MessageId) -> bool {
        self.threads.get(group_id).is_some_and(|t| t.ids.contains(message_id))
    }

    /// Messages of `group_id` in arrival order.
    pub fn messages(&self, group_id: &GroupId) -> &[ChatMessage] {
        self.threads.get(group_id).map_or(&[], |t| t.messages.as_slice())
    }

    /// Most recent message of `group_id`.
    pub fn last(&self, group_id: &GroupId) -> Option<&ChatMessage> {
        self.messages(group_id).last()
    }

    /// Groups with at least one stored message.
    pub fn groups(&self) -> impl Iterator<Item = &GroupId> {
        self.threads.iter().filter(|(_, t)| !t.messages.is_empty()).map(|(g, _)| g)
    }
}
