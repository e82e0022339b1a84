//! Network driver.
//!
//! Implements the [`Driver`] trait against a real server: sockets through
//! [`crate::transport`], REST through [`ApiClient`], and commands from a
//! [`Session`](crate::Session) handle. Socket events and REST completions
//! arrive on channels the driver owns, so the runtime loop never awaits the
//! network directly.

use std::{collections::HashMap, time::Duration};

use studybuddy_app::{
    ApiRequest, App, AppEvent, Command, Driver, DriverInput, TransportCommand, TransportEvent,
};
use studybuddy_core::env::Environment;
use tokio::{
    sync::{mpsc, watch},
    task::JoinSet,
};

use crate::{
    SessionView, SystemEnv,
    api::ApiClient,
    error::DriverError,
    transport::{self, SocketHandle},
};

/// Depth of the socket and response channels.
const CHANNEL_CAPACITY: usize = 64;

/// Driver that talks to a real StudyBuddy server.
pub struct NetworkDriver {
    env: SystemEnv,
    socket_url: String,
    api: ApiClient,
    tick_interval: Duration,
    commands: mpsc::Receiver<Command>,
    transport_tx: mpsc::Sender<TransportEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    responses_tx: mpsc::Sender<AppEvent>,
    responses_rx: mpsc::Receiver<AppEvent>,
    sockets: HashMap<u64, SocketHandle>,
    requests: JoinSet<()>,
    view: watch::Sender<SessionView>,
}

impl NetworkDriver {
    /// Create a driver.
    ///
    /// `commands` is the user-intent channel; closing it quits the session.
    /// Every render is published on `view`.
    pub fn new(
        socket_url: impl Into<String>,
        api: ApiClient,
        tick_interval: Duration,
        commands: mpsc::Receiver<Command>,
        view: watch::Sender<SessionView>,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (responses_tx, responses_rx) = mpsc::channel(CHANNEL_CAPACITY);
        Self {
            env: SystemEnv::new(),
            socket_url: socket_url.into(),
            api,
            tick_interval,
            commands,
            transport_tx,
            transport_rx,
            responses_tx,
            responses_rx,
            sockets: HashMap::new(),
            requests: JoinSet::new(),
            view,
        }
    }

    /// Number of sockets the driver holds open.
    pub fn open_sockets(&self) -> usize {
        self.sockets.len()
    }
}

impl Driver for NetworkDriver {
    type Error = DriverError;

    async fn next_input(&mut self) -> Result<Option<DriverInput>, Self::Error> {
        // Commands win ties. Socket tasks block on a full transport channel,
        // so `execute` must never wait on a socket's outbound queue.
        tokio::select! {
            biased;

            maybe_command = self.commands.recv() => {
                Ok(Some(DriverInput::Command(maybe_command.unwrap_or(Command::Quit))))
            }

            Some(event) = self.transport_rx.recv() => {
                if let TransportEvent::Closed { generation, .. } = &event {
                    self.sockets.remove(generation);
                }
                Ok(Some(DriverInput::Transport(event)))
            }

            Some(event) = self.responses_rx.recv() => {
                Ok(Some(DriverInput::Response(event)))
            }

            () = tokio::time::sleep(self.tick_interval) => Ok(None),
        }
    }

    async fn execute(&mut self, command: TransportCommand) -> Result<(), Self::Error> {
        match command {
            TransportCommand::Open { token, generation } => {
                let handle =
                    transport::open(&self.socket_url, &token, generation, self.transport_tx.clone())?;
                tracing::debug!(generation, "opening socket");
                self.sockets.insert(handle.generation(), handle);
            },
            TransportCommand::Send { generation, event } => match self.sockets.get(&generation) {
                Some(socket) => {
                    if let Err(e) = socket.send(event) {
                        tracing::debug!(generation, error = %e, "intent dropped");
                    }
                },
                None => tracing::debug!(generation, event = event.name(), "no socket for send"),
            },
            TransportCommand::Close { generation, reason } => {
                tracing::debug!(generation, %reason, "closing socket");
                self.sockets.remove(&generation);
            },
        }
        Ok(())
    }

    fn request(&mut self, request: ApiRequest) -> Result<(), Self::Error> {
        while self.requests.try_join_next().is_some() {}

        let api = self.api.clone();
        let env = self.env.clone();
        let responses = self.responses_tx.clone();
        self.requests.spawn(async move {
            let event = api.perform(request, || env.wall_clock_millis()).await;
            let _ = responses.send(event).await;
        });
        Ok(())
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.view.send_replace(SessionView::from_app(app));
        Ok(())
    }

    fn stop(&mut self) {
        self.requests.abort_all();
        self.sockets.clear();
    }
}

#[cfg(test)]
mod tests {
    use studybuddy_proto::{GroupId, OutboundEvent};

    use super::*;

    fn driver() -> (NetworkDriver, mpsc::Sender<Command>, watch::Receiver<SessionView>) {
        let (command_tx, command_rx) = mpsc::channel(8);
        let (view_tx, view_rx) = watch::channel(SessionView::default());
        let api = ApiClient::new("http://127.0.0.1:9", "tok").unwrap();
        let driver = NetworkDriver::new(
            "ws://127.0.0.1:9",
            api,
            Duration::from_millis(10),
            command_rx,
            view_tx,
        );
        (driver, command_tx, view_rx)
    }

    #[tokio::test]
    async fn idle_driver_times_out() {
        let (mut driver, _commands, _view) = driver();
        assert!(driver.next_input().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn closed_command_channel_quits() {
        let (mut driver, commands, _view) = driver();
        drop(commands);
        let input = driver.next_input().await.unwrap();
        assert!(matches!(input, Some(DriverInput::Command(Command::Quit))));
    }

    #[tokio::test]
    async fn refused_socket_is_reported_and_forgotten() {
        let (mut driver, _commands, _view) = driver();
        driver
            .execute(TransportCommand::Open { token: "tok".into(), generation: 1 })
            .await
            .unwrap();
        assert_eq!(driver.open_sockets(), 1);

        let input = loop {
            if let Some(input) = driver.next_input().await.unwrap() {
                break input;
            }
        };
        assert!(matches!(
            input,
            DriverInput::Transport(TransportEvent::Closed { generation: 1, .. })
        ));
        assert_eq!(driver.open_sockets(), 0);
    }

    #[tokio::test]
    async fn send_without_socket_is_dropped() {
        let (mut driver, _commands, _view) = driver();
        let send = TransportCommand::Send {
            generation: 4,
            event: OutboundEvent::JoinGroup { group_id: GroupId::from("g1") },
        };
        assert!(driver.execute(send).await.is_ok());
    }

    #[tokio::test]
    async fn failed_fetch_comes_back_as_response() {
        let (mut driver, _commands, _view) = driver();
        driver.request(ApiRequest::FetchGroups).unwrap();

        let input = loop {
            if let Some(input) = driver.next_input().await.unwrap() {
                break input;
            }
        };
        assert!(matches!(input, DriverInput::Response(AppEvent::RequestFailed { .. })));
    }

    #[test]
    fn render_publishes_view() {
        let (mut driver, _commands, view) = driver();
        let app = App::new(
            studybuddy_app::Viewer::new("me", "Ann", "Lee"),
            studybuddy_app::ChatConfig::default(),
        );
        driver.render(&app).unwrap();
        assert!(view.has_changed().unwrap());
    }
}
