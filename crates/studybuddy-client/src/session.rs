//! Session handle.
//!
//! One [`Session`] per signed-in user. Starting a session spawns the
//! [`Runtime`] on the current tokio runtime; the handle sends commands in
//! and exposes the published [`SessionView`].

use studybuddy_app::{Command, Runtime};
use studybuddy_proto::{CourseId, GroupId, LessonId};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{
    ClientConfig, NetworkDriver, SessionView, SystemEnv, api::ApiClient, error::DriverError,
};

/// Depth of the command channel.
const COMMAND_CAPACITY: usize = 32;

/// Handle to a running session.
pub struct Session {
    token: String,
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<SessionView>,
    task: JoinHandle<Result<(), DriverError>>,
}

impl Session {
    /// Spawn a session for the viewer and endpoints in `config`.
    ///
    /// The session starts offline; call [`Session::connect`] to open the
    /// socket and load groups.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &ClientConfig) -> Result<Self, DriverError> {
        config.validate()?;
        let api = ApiClient::new(&config.api_base_url, config.auth_token.as_str())?;
        let chat = config.chat_config();

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (view_tx, view_rx) = watch::channel(SessionView::default());

        let driver = NetworkDriver::new(
            config.socket_url.as_str(),
            api,
            chat.tick_interval,
            command_rx,
            view_tx,
        );
        let runtime = Runtime::new(driver, SystemEnv::new(), config.viewer(), chat);

        tracing::info!(viewer = %config.viewer.id, socket_url = %config.socket_url, "session starting");
        let task = tokio::spawn(runtime.run());

        Ok(Self { token: config.auth_token.clone(), commands: command_tx, view: view_rx, task })
    }

    /// Send a command to the runtime.
    pub async fn send(&self, command: Command) -> Result<(), DriverError> {
        self.commands.send(command).await.map_err(|_| DriverError::SessionClosed)
    }

    /// Connect with the configured token and load groups.
    pub async fn connect(&self) -> Result<(), DriverError> {
        self.send(Command::Connect { token: self.token.clone() }).await
    }

    /// Close the socket. Automatic reconnection stops until the next
    /// [`Session::connect`].
    pub async fn disconnect(&self) -> Result<(), DriverError> {
        self.send(Command::Disconnect).await
    }

    /// Select a group.
    pub async fn select_group(&self, group_id: impl Into<GroupId>) -> Result<(), DriverError> {
        self.send(Command::SelectGroup(group_id.into())).await
    }

    /// Send a message to a group.
    pub async fn send_message(
        &self,
        group_id: impl Into<GroupId>,
        content: impl Into<String>,
    ) -> Result<(), DriverError> {
        self.send(Command::SendMessage { group_id: group_id.into(), content: content.into() })
            .await
    }

    /// Load a course's progress.
    pub async fn load_progress(&self, course_id: impl Into<CourseId>) -> Result<(), DriverError> {
        self.send(Command::LoadProgress(course_id.into())).await
    }

    /// Mark a lesson complete.
    pub async fn mark_lesson_complete(
        &self,
        course_id: impl Into<CourseId>,
        lesson_id: impl Into<LessonId>,
    ) -> Result<(), DriverError> {
        self.send(Command::MarkLessonComplete {
            course_id: course_id.into(),
            lesson_id: lesson_id.into(),
        })
        .await
    }

    /// Current view.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every render.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Quit and wait for the runtime to finish.
    pub async fn shutdown(self) -> Result<(), DriverError> {
        // The runtime may already be gone; its result is what matters.
        let _ = self.commands.send(Command::Quit).await;
        self.task.await.map_err(|e| DriverError::Join(e.to_string()))?
    }
}
