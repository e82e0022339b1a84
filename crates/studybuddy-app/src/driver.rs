//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use studybuddy_proto::{CourseId, GroupId, LessonId, LessonProgressUpdate};

use crate::{App, AppEvent, Command, TransportCommand, TransportEvent};

/// One input for the runtime to process.
#[derive(Debug, Clone)]
pub enum DriverInput {
    /// User intent from the frontend.
    Command(Command),
    /// Something happened on a socket.
    Transport(TransportEvent),
    /// A REST request completed.
    Response(AppEvent),
}

/// REST requests the runtime delegates to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    /// `GET /groups/user/my`
    FetchGroups,
    /// `GET /groups/:id/messages`
    FetchHistory {
        /// Group whose history to fetch.
        group_id: GroupId,
    },
    /// `GET /progress/courses/:id`
    FetchProgress {
        /// Course to fetch.
        course_id: CourseId,
    },
    /// `PUT /progress/courses/:id/lessons/:lesson`
    SaveLessonProgress {
        /// Course the lesson belongs to.
        course_id: CourseId,
        /// Lesson to update.
        lesson_id: LessonId,
        /// Fields to change.
        update: LessonProgressUpdate,
    },
}

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs against a real server and in
/// simulation.
///
/// # Implementations
///
/// - **Network**: WebSocket transport and HTTP API client
/// - **Simulation**: Scripted inputs and recorded outputs
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input.
    ///
    /// Returns `None` when nothing arrived within one tick interval, so the
    /// runtime can tick the connection manager. A closed input source should
    /// surface as [`Command::Quit`].
    ///
    /// # Errors
    ///
    /// Returns an error if the driver can no longer produce inputs.
    fn next_input(
        &mut self,
    ) -> impl Future<Output = Result<Option<DriverInput>, Self::Error>> + Send;

    /// Perform socket I/O for the connection manager.
    ///
    /// Opening is asynchronous: the outcome is reported later through
    /// [`DriverInput::Transport`]. Sends to a socket that is gone are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an error only for driver-level failures, never for a failed
    /// socket.
    fn execute(
        &mut self,
        command: TransportCommand,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Start a REST request. The result arrives later as
    /// [`DriverInput::Response`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be started.
    fn request(&mut self, request: ApiRequest) -> Result<(), Self::Error>;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Close sockets and abandon in-flight requests.
    fn stop(&mut self);
}
