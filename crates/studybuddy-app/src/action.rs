//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.
//! Socket intents are routed through the [`crate::Bridge`]; REST intents are
//! handed to the [`crate::Driver`].

use studybuddy_proto::{CourseId, GroupId, LessonId, LessonProgressUpdate};

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Open the real-time connection.
    Connect {
        /// Bearer token.
        token: String,
    },

    /// Close the real-time connection.
    Disconnect,

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

    /// Send a chat message.
    SendMessage {
        /// Target group.
        group_id: GroupId,
        /// Message text.
        content: String,
    },

    /// Fetch the viewer's groups.
    FetchGroups,

    /// Fetch a group's message history.
    FetchHistory {
        /// Group whose history to fetch.
        group_id: GroupId,
    },

    /// Fetch progress for a course.
    FetchProgress {
        /// Course to fetch.
        course_id: CourseId,
    },

    /// Persist a lesson's progress.
    SaveLessonProgress {
        /// Course the lesson belongs to.
        course_id: CourseId,
        /// Lesson to update.
        lesson_id: LessonId,
        /// Fields to change.
        update: LessonProgressUpdate,
    },
}
