//! Selected group cursor.
//!
//! The selected group is the one the user is reading. Moving the cursor
//! zeroes the unread counters of both the group being left and the group
//! being entered. After the membership list changes the cursor is
//! re-derived so it never points at a group the viewer does not belong to.

use studybuddy_proto::GroupId;

use crate::{state::Group, unread::UnreadTracker};

/// Outcome of moving or reconciling the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    /// Cursor stayed where it was.
    Unchanged,
    /// Cursor moved to `to`.
    Moved {
        /// Previously selected group, if any.
        from: Option<GroupId>,
        /// Newly selected group.
        to: GroupId,
    },
    /// Cursor cleared because no groups remain.
    Cleared {
        /// Previously selected group.
        from: GroupId,
    },
}

/// Which group is currently being read.
#[derive(Debug, Clone, Default)]
pub struct SelectionCursor {
    selected: Option<GroupId>,
}

impl SelectionCursor {
    /// Create a cursor with nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected group.
    pub fn selected(&self) -> Option<&GroupId> {
        self.selected.as_ref()
    }

    /// Whether `group_id` is the selected group.
    pub fn is_selected(&self, group_id: &GroupId) -> bool {
        self.selected.as_ref() == Some(group_id)
    }

    /// Select `group_id`, zeroing the unread counters of the previous and
    /// the new selection.
    ///
    /// Reselecting the current group still zeroes its counter.
    pub fn select(&mut self, group_id: GroupId, unread: &mut UnreadTracker) -> SelectionChange {
        unread.clear(&group_id);

        if self.is_selected(&group_id) {
            return SelectionChange::Unchanged;
        }

        if let Some(previous) = &self.selected {
            unread.clear(previous);
        }

        let from = self.selected.replace(group_id.clone());
        tracing::debug!(from = ?from, to = %group_id, "selected group");
        SelectionChange::Moved { from, to: group_id }
    }

    /// Re-derive the selection against the current membership list.
    ///
    /// A selection that is still a member stays. Otherwise the first
    /// remaining group is selected, or the cursor clears if none remain.
    pub fn reconcile(&mut self, groups: &[Group], unread: &mut UnreadTracker) -> SelectionChange {
        let still_member =
            self.selected.as_ref().is_some_and(|current| groups.iter().any(|g| &g.id == current));
        if still_member {
            return SelectionChange::Unchanged;
        }

        match groups.first() {
            Some(first) => self.select(first.id.clone(), unread),
            None => match self.selected.take() {
                Some(from) => {
                    tracing::debug!(from = %from, "selection cleared, no groups left");
                    SelectionChange::Cleared { from }
                },
                None => SelectionChange::Unchanged,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str) -> Group {
        Group {
            id: GroupId::from(id),
            name: format!("Group {id}"),
            category: "math".to_string(),
            member_count: 1,
        }
    }

    #[test]
    fn select_zeroes_old_and_new() {
        let mut unread = UnreadTracker::new();
        let mut cursor = SelectionCursor::new();
        let g1 = GroupId::from("g1");
        let g2 = GroupId::from("g2");

        cursor.select(g1.clone(), &mut unread);
        unread.increment(&g1);
        unread.increment(&g2);
        unread.increment(&g2);

        let change = cursor.select(g2.clone(), &mut unread);

        assert_eq!(change, SelectionChange::Moved { from: Some(g1.clone()), to: g2.clone() });
        assert_eq!(unread.get(&g1), 0);
        assert_eq!(unread.get(&g2), 0);
    }

    #[test]
    fn reselect_is_unchanged_but_clears() {
        let mut unread = UnreadTracker::new();
        let mut cursor = SelectionCursor::new();
        let g1 = GroupId::from("g1");

        cursor.select(g1.clone(), &mut unread);
        unread.increment(&g1);

        assert_eq!(cursor.select(g1.clone(), &mut unread), SelectionChange::Unchanged);
        assert_eq!(unread.get(&g1), 0);
    }

    #[test]
    fn reconcile_keeps_member_selection() {
        let mut unread = UnreadTracker::new();
        let mut cursor = SelectionCursor::new();
        cursor.select(GroupId::from("g2"), &mut unread);

        let change = cursor.reconcile(&[group("g1"), group("g2")], &mut unread);

        assert_eq!(change, SelectionChange::Unchanged);
        assert!(cursor.is_selected(&GroupId::from("g2")));
    }

    #[test]
    fn reconcile_falls_back_to_first_group() {
        let mut unread = UnreadTracker::new();
        let mut cursor = SelectionCursor::new();
        cursor.select(GroupId::from("gone"), &mut unread);

        let change = cursor.reconcile(&[group("g1"), group("g2")], &mut unread);

        assert_eq!(
            change,
            SelectionChange::Moved { from: Some(GroupId::from("gone")), to: GroupId::from("g1") }
        );
    }

    #[test]
    fn reconcile_selects_first_when_empty() {
        let mut unread = UnreadTracker::new();
        let mut cursor = SelectionCursor::new();

        let change = cursor.reconcile(&[group("g1")], &mut unread);

        assert_eq!(change, SelectionChange::Moved { from: None, to: GroupId::from("g1") });
    }

    #[test]
    fn reconcile_clears_without_groups() {
        let mut unread = UnreadTracker::new();
        let mut cursor = SelectionCursor::new();
        cursor.select(GroupId::from("g1"), &mut unread);

        assert_eq!(
            cursor.reconcile(&[], &mut unread),
            SelectionChange::Cleared { from: GroupId::from("g1") }
        );
        assert!(cursor.selected().is_none());
        assert_eq!(cursor.reconcile(&[], &mut unread), SelectionChange::Unchanged);
    }
}
