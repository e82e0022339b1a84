//! Application input events.
//!
//! This module defines [`AppEvent`], the set of notifications that drive the
//! [`crate::App`] state machine.
//!
//! Events originate from two sources:
//! - Connection notifications translated by the [`crate::Bridge`].
//! - REST responses delivered by the [`crate::Driver`].
//!
//! User intents arrive separately as [`crate::Command`]s.

use std::time::Duration;

use studybuddy_proto::{
    CourseId, CourseProgressResponse, GroupId, GroupSummary, HistoricalMessage, LessonId,
    LessonProgressRecord, MembershipChange, WireMessage,
};

/// Events processed by the App state machine.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic tick.
    Tick,

    /// Connection in progress.
    Connecting,

    /// Real-time connection open.
    Connected,

    /// Connection dropped, retry scheduled.
    Reconnecting {
        /// Attempt number of the scheduled retry (1-based).
        attempt: u32,
        /// Delay before the retry fires.
        delay: Duration,
    },

    /// Connection closed and no retry is pending.
    Disconnected {
        /// Whether the retry budget was spent.
        exhausted: bool,
        /// Why the connection closed.
        reason: String,
    },

    /// Live message pushed by the server.
    MessageReceived {
        /// The message.
        message: WireMessage,
        /// Wall clock at arrival, Unix milliseconds.
        received_at: i64,
    },

    /// A user joined a group.
    MemberJoined(MembershipChange),

    /// A user left a group.
    MemberLeft(MembershipChange),

    /// "My groups" fetched.
    GroupsLoaded {
        /// Groups returned by the server.
        groups: Vec<GroupSummary>,
    },

    /// A group's history fetched.
    HistoryLoaded {
        /// Group the history belongs to.
        group_id: GroupId,
        /// Messages oldest first.
        messages: Vec<HistoricalMessage>,
        /// Wall clock at arrival, Unix milliseconds.
        received_at: i64,
    },

    /// A course's progress fetched.
    ProgressLoaded {
        /// Course the snapshot belongs to.
        course_id: CourseId,
        /// Server snapshot.
        response: CourseProgressResponse,
    },

    /// The server acknowledged a lesson update.
    LessonProgressSaved {
        /// Course the lesson belongs to.
        course_id: CourseId,
        /// Stored record.
        record: LessonProgressRecord,
    },

    /// A REST request failed.
    RequestFailed {
        /// Which request failed.
        request: FailedRequest,
        /// Error description.
        message: String,
    },

    /// Error occurred.
    Error {
        /// Error description.
        message: String,
    },
}

/// REST request that produced a [`AppEvent::RequestFailed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailedRequest {
    /// "My groups".
    Groups,
    /// A group's history.
    History(GroupId),
    /// A course's progress.
    Progress(CourseId),
    /// A lesson update.
    LessonProgress(CourseId, LessonId),
}
