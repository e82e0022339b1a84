//! REST payloads.
//!
//! Bodies exchanged with the HTTP API:
//!
//! - `GET /groups/user/my` returns `[GroupSummary]`
//! - `GET /groups/:id/messages` returns `[HistoricalMessage]`
//! - `GET /progress/courses/:id` returns [`CourseProgressResponse`]
//! - `PUT /progress/courses/:id/lessons/:lesson` accepts
//!   [`LessonProgressUpdate`] and returns [`LessonProgressRecord`]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CourseId, GroupId, LessonId, MessageId, UserId};

/// Group as listed in "my groups".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    /// Group identifier.
    pub id: GroupId,
    /// Display name.
    pub name: String,
    /// Subject category.
    #[serde(default)]
    pub category: String,
    /// Number of members.
    #[serde(default)]
    pub member_count: u32,
    /// Whether the current user belongs to the group.
    #[serde(default = "default_true")]
    pub is_member: bool,
}

fn default_true() -> bool {
    true
}

/// Message returned by the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalMessage {
    /// Message identifier.
    pub id: MessageId,
    /// Group the message belongs to.
    pub group_id: GroupId,
    /// Message text.
    pub content: String,
    /// Author's identifier. Missing in payloads produced before the field
    /// was added.
    #[serde(default)]
    pub sender_id: Option<UserId>,
    /// Author's free-text display name.
    #[serde(default)]
    pub sender: String,
    /// Server timestamp (RFC 3339).
    #[serde(default)]
    pub timestamp: String,
}

/// Aggregate progress as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    /// Lessons in the course.
    pub total_lessons: u32,
    /// Lessons the user completed.
    #[serde(default)]
    pub completed_lessons: u32,
    /// Rounded completion percentage (0-100).
    #[serde(default)]
    pub completion_percentage: u8,
}

/// Per-lesson progress as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgressRecord {
    /// Lesson identifier.
    pub lesson_id: LessonId,
    /// Whether the lesson is completed.
    #[serde(default)]
    pub is_completed: bool,
    /// When the lesson was completed.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Seconds spent on the lesson.
    #[serde(default)]
    pub time_spent: u64,
    /// When the lesson was last opened.
    #[serde(default)]
    pub last_accessed_at: Option<DateTime<Utc>>,
}

/// Progress endpoint response for one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressResponse {
    /// Course the response describes. Filled in by the client when the
    /// server omits it.
    #[serde(default)]
    pub course_id: Option<CourseId>,
    /// Per-lesson records.
    #[serde(default)]
    pub lessons: Vec<LessonProgressRecord>,
    /// Aggregate counts.
    pub progress: ProgressSummary,
}

/// Partial update for one lesson's progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgressUpdate {
    /// New completion flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    /// Seconds spent, replacing the stored value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u64>,
}

impl LessonProgressUpdate {
    /// Update that marks a lesson complete or incomplete.
    pub fn completion(is_completed: bool) -> Self {
        Self { is_completed: Some(is_completed), time_spent: None }
    }
}
