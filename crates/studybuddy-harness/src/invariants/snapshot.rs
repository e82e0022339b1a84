//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the system at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use std::collections::{HashMap, HashSet};

use studybuddy_app::{App, ConnectionStatus};
use studybuddy_proto::{CourseId, GroupId, MessageId};

/// Snapshot of the entire system state.
///
/// Contains observable state from one or more sessions for invariant
/// checking.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-session state snapshots.
    pub sessions: Vec<SessionSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no sessions).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single session.
    pub fn single(session: SessionSnapshot) -> Self {
        Self { sessions: vec![session] }
    }

    /// Create a snapshot from multiple sessions.
    pub fn from_sessions(sessions: Vec<SessionSnapshot>) -> Self {
        Self { sessions }
    }

    /// Add a session snapshot.
    pub fn add_session(&mut self, session: SessionSnapshot) {
        self.sessions.push(session);
    }
}

/// Snapshot of a single session's observable state.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Session identifier.
    pub id: u64,
    /// Currently selected group. `None` if nothing is selected.
    pub selected: Option<GroupId>,
    /// Groups the viewer belongs to.
    pub groups: HashSet<GroupId>,
    /// Unread counters.
    pub unread: HashMap<GroupId, u32>,
    /// Message ids per group, in thread order.
    pub threads: HashMap<GroupId, Vec<MessageId>>,
    /// Progress per course.
    pub courses: HashMap<CourseId, CourseSnapshot>,
    /// Connection status.
    pub status: ConnectionStatus,
    /// Selected thread rendered as `HH:MM sender: content` lines.
    pub selected_thread: Vec<String>,
}

impl SessionSnapshot {
    /// Create an empty session snapshot.
    pub fn new(id: u64) -> Self {
        Self { id, ..Default::default() }
    }

    /// Capture the observable state of `app`.
    pub fn from_app(id: u64, app: &App) -> Self {
        let chat = app.chat();
        let store = chat.messages();

        let threads = store
            .groups()
            .map(|group_id| {
                let ids = store.messages(group_id).iter().map(|m| m.id.clone()).collect();
                (group_id.clone(), ids)
            })
            .collect();

        let courses = app
            .progress()
            .courses()
            .map(|(course_id, course)| {
                let completed_in_map = course.lessons.values().filter(|l| l.is_completed).count();
                let snapshot = CourseSnapshot {
                    total_lessons: course.total_lessons,
                    completed_lessons: course.completed_lessons,
                    completion_percentage: course.completion_percentage,
                    completed_in_map,
                };
                (course_id.clone(), snapshot)
            })
            .collect();

        Self {
            id,
            selected: app.selected_group().cloned(),
            groups: app.groups().iter().map(|g| g.id.clone()).collect(),
            unread: chat.unread().unread_groups().map(|(g, c)| (g.clone(), c)).collect(),
            threads,
            courses,
            status: app.status().clone(),
            selected_thread: app
                .selected_messages()
                .iter()
                .map(|m| format!("{} {}: {}", m.timestamp, m.sender, m.content))
                .collect(),
        }
    }

    /// Set selected group.
    pub fn with_selected(mut self, group_id: Option<GroupId>) -> Self {
        self.selected = group_id;
        self
    }

    /// Add a member group.
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.groups.insert(group_id);
        self
    }

    /// Set a group's unread counter.
    pub fn with_unread(mut self, group_id: GroupId, count: u32) -> Self {
        self.unread.insert(group_id, count);
        self
    }

    /// Set a group's thread.
    pub fn with_thread(mut self, group_id: GroupId, ids: impl IntoIterator<Item = MessageId>) -> Self {
        self.threads.insert(group_id, ids.into_iter().collect());
        self
    }

    /// Set a course's progress.
    pub fn with_course(mut self, course_id: CourseId, course: CourseSnapshot) -> Self {
        self.courses.insert(course_id, course);
        self
    }
}

/// Snapshot of a course's progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourseSnapshot {
    /// Lessons in the course.
    pub total_lessons: u32,
    /// Aggregate completed count.
    pub completed_lessons: u32,
    /// Aggregate percentage.
    pub completion_percentage: u8,
    /// Lessons marked completed in the per-lesson map.
    pub completed_in_map: usize,
}
