//! Per-group unread counters.

use std::collections::HashMap;

use studybuddy_proto::GroupId;

/// Unread message counts keyed by group.
///
/// Groups never seen have an implicit count of zero. Counters only move
/// through [`increment`](Self::increment) and [`clear`](Self::clear), so
/// they can never go negative.
#[derive(Debug, Clone, Default)]
pub struct UnreadTracker {
    counts: HashMap<GroupId, u32>,
}

impl UnreadTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more unread message in `group_id`. Returns the new count.
    pub fn increment(&mut self, group_id: &GroupId) -> u32 {
        let count = self.counts.entry(group_id.clone()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Zero the counter for `group_id`.
    pub fn clear(&mut self, group_id: &GroupId) {
        if let Some(count) = self.counts.get_mut(group_id) {
            *count = 0;
        }
    }

    /// Unread count for `group_id`.
    pub fn get(&self, group_id: &GroupId) -> u32 {
        self.counts.get(group_id).copied().unwrap_or(0)
    }

    /// Unread messages across all groups.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    /// Groups with at least one unread message.
    pub fn unread_groups(&self) -> impl Iterator<Item = (&GroupId, u32)> {
        self.counts.iter().filter(|(_, c)| **c > 0).map(|(g, c)| (g, *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_group_is_zero() {
        let unread = UnreadTracker::new();
        assert_eq!(unread.get(&GroupId::from("g1")), 0);
        assert_eq!(unread.total(), 0);
    }

    #[test]
    fn increments_and_clears() {
        let mut unread = UnreadTracker::new();
        let g1 = GroupId::from("g1");
        let g2 = GroupId::from("g2");

        assert_eq!(unread.increment(&g1), 1);
        assert_eq!(unread.increment(&g1), 2);
        unread.increment(&g2);
        assert_eq!(unread.total(), 3);

        unread.clear(&g1);
        assert_eq!(unread.get(&g1), 0);
        assert_eq!(unread.get(&g2), 1);
        assert_eq!(unread.unread_groups().count(), 1);
    }

    #[test]
    fn clearing_unknown_group_is_noop() {
        let mut unread = UnreadTracker::new();
        unread.clear(&GroupId::from("missing"));
        assert_eq!(unread.total(), 0);
    }
}
