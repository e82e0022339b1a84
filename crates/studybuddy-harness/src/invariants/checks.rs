//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::HashSet;

use studybuddy_app::completion_percentage;

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// Selected group must be one the viewer belongs to.
///
/// If `selected` is `Some(group_id)`, then `groups` must contain `group_id`.
/// This prevents the UI from showing a thread the viewer cannot post to.
pub struct SelectedGroupIsMember;

impl Invariant for SelectedGroupIsMember {
    fn name(&self) -> &'static str {
        "selected_group_is_member"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            let Some(selected) = &session.selected else {
                continue;
            };
            if !session.groups.contains(selected) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "session {}: selected {} not in groups {:?}",
                        session.id, selected, session.groups
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Selected group has no unread messages.
///
/// The selected thread is on screen, so its counter must read zero.
pub struct SelectedGroupRead;

impl Invariant for SelectedGroupRead {
    fn name(&self) -> &'static str {
        "selected_group_read"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            let Some(selected) = &session.selected else {
                continue;
            };
            let count = session.unread.get(selected).copied().unwrap_or(0);
            if count != 0 {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("session {}: selected {} has {count} unread", session.id, selected),
                });
            }
        }
        Ok(())
    }
}

/// No thread holds two messages with the same id.
pub struct UniqueMessageIds;

impl Invariant for UniqueMessageIds {
    fn name(&self) -> &'static str {
        "unique_message_ids"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            for (group_id, ids) in &session.threads {
                let mut seen = HashSet::new();
                if let Some(duplicate) = ids.iter().find(|id| !seen.insert(*id)) {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "session {}: group {} holds message {} twice",
                            session.id, group_id, duplicate
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Course aggregates agree with their lesson maps.
///
/// `completed_lessons` equals the completed entries in the map and the
/// percentage is the rounded ratio to `total_lessons`.
pub struct ProgressArithmetic;

impl Invariant for ProgressArithmetic {
    fn name(&self) -> &'static str {
        "progress_arithmetic"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            for (course_id, course) in &session.courses {
                let completed_matches =
                    usize::try_from(course.completed_lessons).is_ok_and(|c| c == course.completed_in_map);
                if !completed_matches {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "session {}: course {} counts {} completed but map has {}",
                            session.id, course_id, course.completed_lessons, course.completed_in_map
                        ),
                    });
                }

                let expected = completion_percentage(course.completed_lessons, course.total_lessons);
                if course.completion_percentage != expected || course.completion_percentage > 100 {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "session {}: course {} reports {}% but {}/{} gives {expected}%",
                            session.id,
                            course_id,
                            course.completion_percentage,
                            course.completed_lessons,
                            course.total_lessons
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use studybuddy_proto::{CourseId, GroupId, MessageId};

    use super::*;
    use crate::invariants::{CourseSnapshot, SessionSnapshot};

    #[test]
    fn selected_outside_groups_violates() {
        let session = SessionSnapshot::new(1)
            .with_group(GroupId::from("g1"))
            .with_selected(Some(GroupId::from("g2")));
        let result = SelectedGroupIsMember.check(&SystemSnapshot::single(session));
        assert!(result.is_err());
    }

    #[test]
    fn unread_selected_violates() {
        let session = SessionSnapshot::new(1)
            .with_group(GroupId::from("g1"))
            .with_selected(Some(GroupId::from("g1")))
            .with_unread(GroupId::from("g1"), 2);
        assert!(SelectedGroupRead.check(&SystemSnapshot::single(session)).is_err());
    }

    #[test]
    fn unread_elsewhere_is_fine() {
        let session = SessionSnapshot::new(1)
            .with_group(GroupId::from("g1"))
            .with_selected(Some(GroupId::from("g1")))
            .with_unread(GroupId::from("g2"), 2);
        assert!(SelectedGroupRead.check(&SystemSnapshot::single(session)).is_ok());
    }

    #[test]
    fn duplicate_ids_violate() {
        let session = SessionSnapshot::new(1).with_thread(
            GroupId::from("g1"),
            [MessageId::from("1"), MessageId::from("2"), MessageId::from("1")],
        );
        let violation = UniqueMessageIds.check(&SystemSnapshot::single(session)).unwrap_err();
        assert_eq!(violation.invariant, "unique_message_ids");
    }

    #[test]
    fn inconsistent_progress_violates() {
        let course =
            CourseSnapshot { total_lessons: 4, completed_lessons: 1, completion_percentage: 50, completed_in_map: 1 };
        let session = SessionSnapshot::new(1).with_course(CourseId::from("c1"), course);
        assert!(ProgressArithmetic.check(&SystemSnapshot::single(session)).is_err());
    }

    #[test]
    fn consistent_progress_passes() {
        let course =
            CourseSnapshot { total_lessons: 4, completed_lessons: 1, completion_percentage: 25, completed_in_map: 1 };
        let session = SessionSnapshot::new(1).with_course(CourseId::from("c1"), course);
        assert!(ProgressArithmetic.check(&SystemSnapshot::single(session)).is_ok());
    }
}
