//! Connection-to-Application translation layer.
//!
//! The [`Bridge`] owns the [`ConnectionManager`] and adapts it to the
//! application lifecycle.
//!
//! # Responsibilities
//!
//! - Converts socket-bound [`AppAction`]s into connection manager calls.
//! - Accumulates [`TransportCommand`]s for the driver to execute in the next
//!   I/O cycle.
//! - Filters [`TransportEvent`]s from stale transports and converts the rest
//!   into [`AppEvent`]s.
//! - Reads time from the [`Environment`] so reconnect backoff runs the same
//!   under real and virtual clocks.

use studybuddy_core::{
    ConnectionAction, ConnectionManager, ConnectionState, ReconnectPolicy, env::Environment,
};
use studybuddy_proto::{InboundEvent, OutboundEvent};

use crate::{AppAction, AppEvent};

/// I/O the driver performs on behalf of the connection manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    /// Open a socket authenticated by `token`.
    Open {
        /// Bearer token.
        token: String,
        /// Generation to tag the transport's events with.
        generation: u64,
    },
    /// Send an event over the socket of `generation`.
    Send {
        /// Transport generation.
        generation: u64,
        /// Event to send.
        event: OutboundEvent,
    },
    /// Close the socket of `generation`.
    Close {
        /// Transport generation.
        generation: u64,
        /// Why the socket is closing.
        reason: String,
    },
}

/// What the driver observed on a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Socket of `generation` finished its handshake.
    Opened {
        /// Transport generation.
        generation: u64,
    },
    /// Event decoded from the socket of `generation`.
    Received {
        /// Transport generation.
        generation: u64,
        /// Decoded event.
        event: InboundEvent,
    },
    /// Socket of `generation` failed to open or dropped.
    Closed {
        /// Transport generation.
        generation: u64,
        /// Failure description.
        reason: String,
    },
}

impl TransportEvent {
    /// Generation the event belongs to.
    pub fn generation(&self) -> u64 {
        match self {
            Self::Opened { generation }
            | Self::Received { generation, .. }
            | Self::Closed { generation, .. } => *generation,
        }
    }
}

/// Bridge between App and connection logic.
///
/// Generic over Environment to support both production and simulation.
/// The Instant type is determined by the Environment's associated type.
pub struct Bridge<E: Environment> {
    env: E,
    connection: ConnectionManager<E::Instant>,
    commands: Vec<TransportCommand>,
}

impl<E: Environment> Bridge<E> {
    /// Create a new Bridge with the given environment and reconnect policy.
    pub fn new(env: E, policy: ReconnectPolicy) -> Self {
        Self { env, connection: ConnectionManager::new(policy), commands: Vec::new() }
    }

    /// Environment the bridge reads time from.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Connection state machine.
    pub fn connection(&self) -> &ConnectionManager<E::Instant> {
        &self.connection
    }

    /// Process an App action and return resulting App events.
    ///
    /// Actions that do not touch the socket produce nothing.
    pub fn process_app_action(&mut self, action: AppAction) -> Vec<AppEvent> {
        match action {
            AppAction::Connect { token } => match self.connection.connect(token) {
                Ok(actions) => self.apply(actions),
                Err(e) => vec![AppEvent::Error { message: e.to_string() }],
            },
            AppAction::Disconnect => {
                let actions = self.connection.disconnect();
                let mut events = self.apply(actions);
                events.push(AppEvent::Disconnected {
                    exhausted: false,
                    reason: "disconnected".to_string(),
                });
                events
            },
            AppAction::JoinGroup { group_id } => {
                let actions = self.connection.join_group(group_id);
                self.apply(actions)
            },
            AppAction::LeaveGroup { group_id } => {
                let actions = self.connection.leave_group(group_id);
                self.apply(actions)
            },
            AppAction::SendMessage { group_id, content } => {
                let actions = self.connection.send_message(group_id, content);
                self.apply(actions)
            },
            AppAction::Render
            | AppAction::Quit
            | AppAction::FetchGroups
            | AppAction::FetchHistory { .. }
            | AppAction::FetchProgress { .. }
            | AppAction::SaveLessonProgress { .. } => vec![],
        }
    }

    /// Handle an event observed on a socket.
    pub fn handle_transport(&mut self, event: TransportEvent) -> Vec<AppEvent> {
        match event {
            TransportEvent::Opened { generation } => {
                if self.connection.handle_opened(generation) {
                    return vec![AppEvent::Connected];
                }
                // A superseded socket finished opening; nobody listens to it.
                self.commands.push(TransportCommand::Close {
                    generation,
                    reason: "superseded".to_string(),
                });
                vec![]
            },
            TransportEvent::Received { generation, event } => {
                if generation != self.connection.generation() || !self.connection.is_connected() {
                    tracing::debug!(
                        generation,
                        current = self.connection.generation(),
                        event = event.name(),
                        "dropping event from stale transport"
                    );
                    return vec![];
                }
                vec![self.translate(event)]
            },
            TransportEvent::Closed { generation, reason } => {
                let now = self.env.now();
                if let Some(error) = self.connection.handle_transport_error(generation, now, &reason)
                {
                    return vec![AppEvent::Disconnected { exhausted: true, reason: error.to_string() }];
                }

                let current = generation == self.connection.generation();
                if current && self.connection.state() == ConnectionState::Reconnecting {
                    vec![AppEvent::Reconnecting {
                        attempt: self.connection.attempts(),
                        delay: self.connection.retry_in(now).unwrap_or_default(),
                    }]
                } else {
                    vec![]
                }
            },
        }
    }

    /// Process a time tick. Fires a due reconnect.
    pub fn handle_tick(&mut self) -> Vec<AppEvent> {
        let now = self.env.now();
        let actions = self.connection.tick(now);
        self.apply(actions)
    }

    /// Take pending transport commands.
    pub fn take_commands(&mut self) -> Vec<TransportCommand> {
        std::mem::take(&mut self.commands)
    }

    fn translate(&self, event: InboundEvent) -> AppEvent {
        match event {
            InboundEvent::NewMessage(message) => {
                AppEvent::MessageReceived { message, received_at: self.env.wall_clock_millis() }
            },
            InboundEvent::MemberJoined(change) => AppEvent::MemberJoined(change),
            InboundEvent::MemberLeft(change) => AppEvent::MemberLeft(change),
        }
    }

    fn apply(&mut self, actions: Vec<ConnectionAction>) -> Vec<AppEvent> {
        let mut events = Vec::new();
        for action in actions {
            match action {
                ConnectionAction::Open { token, generation } => {
                    self.commands.push(TransportCommand::Open { token, generation });
                    events.push(AppEvent::Connecting);
                },
                ConnectionAction::Emit(event) => {
                    let generation = self.connection.generation();
                    self.commands.push(TransportCommand::Send { generation, event });
                },
                ConnectionAction::Close { generation, reason } => {
                    self.commands.push(TransportCommand::Close { generation, reason });
                },
            }
        }
        events
    }
}
