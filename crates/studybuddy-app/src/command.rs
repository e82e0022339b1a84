//! User intents.
//!
//! A [`Command`] is what a frontend sends when the user does something. The
//! [`crate::App`] turns it into state changes and [`crate::AppAction`]s.

use studybuddy_proto::{CourseId, GroupId, LessonId};

/// Intents issued by the user interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the real-time connection with a bearer token.
    Connect {
        /// Bearer token.
        token: String,
    },
    /// Close the real-time connection.
    Disconnect,
    /// Re-fetch the viewer's groups.
    RefreshGroups,
    /// Open a group's thread.
    SelectGroup(GroupId),
    /// Send a message.
    SendMessage {
        /// Target group.
        group_id: GroupId,
        /// Message text.
        content: String,
    },
    /// Zero a group's unread counter.
    MarkGroupAsRead(GroupId),
    /// Fetch a course's progress.
    LoadProgress(CourseId),
    /// Mark a lesson completed.
    MarkLessonComplete {
        /// Course.
        course_id: CourseId,
        /// Lesson.
        lesson_id: LessonId,
    },
    /// Mark a lesson not completed.
    MarkLessonIncomplete {
        /// Course.
        course_id: CourseId,
        /// Lesson.
        lesson_id: LessonId,
    },
    /// Stop the session.
    Quit,
}
