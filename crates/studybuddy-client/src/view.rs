//! Published session view.
//!
//! The runtime owns the [`App`]; front ends read an owned copy of what they
//! need to draw, refreshed on every render.

use std::collections::HashMap;

use studybuddy_app::{App, ChatMessage, ConnectionStatus};
use studybuddy_proto::{CourseId, GroupId};

/// A group row in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupView {
    /// Group identifier.
    pub id: GroupId,
    /// Display name.
    pub name: String,
    /// Subject category.
    pub category: String,
    /// Number of members.
    pub member_count: u32,
    /// Unread messages.
    pub unread: u32,
    /// Most recent message, for the sidebar preview.
    pub last_message: Option<ChatMessage>,
}

/// Snapshot of everything a front end renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionView {
    /// Connection indicator.
    pub status: ConnectionStatus,
    /// Groups in server order.
    pub groups: Vec<GroupView>,
    /// Selected group.
    pub selected: Option<GroupId>,
    /// Thread of the selected group.
    pub messages: Vec<ChatMessage>,
    /// One-line notice for the status bar.
    pub status_message: Option<String>,
    /// Per-course completion percentage.
    pub course_progress: HashMap<CourseId, u8>,
    /// Mean completion across loaded courses.
    pub overall_progress: u8,
    /// Unread messages across all groups.
    pub total_unread: u64,
}

impl SessionView {
    /// Capture the current state of `app`.
    pub fn from_app(app: &App) -> Self {
        let store = app.chat().messages();
        let groups = app
            .groups()
            .iter()
            .map(|group| GroupView {
                id: group.id.clone(),
                name: group.name.clone(),
                category: group.category.clone(),
                member_count: group.member_count,
                unread: app.unread(&group.id),
                last_message: store.last(&group.id).cloned(),
            })
            .collect();

        let course_progress = app
            .progress()
            .courses()
            .map(|(id, course)| (id.clone(), course.completion_percentage))
            .collect();

        Self {
            status: app.status().clone(),
            groups,
            selected: app.selected_group().cloned(),
            messages: app.selected_messages().to_vec(),
            status_message: app.status_message().map(str::to_owned),
            course_progress,
            overall_progress: app.progress().overall_percentage(),
            total_unread: app.chat().unread().total(),
        }
    }
}
