//! Real-time connection state machine.
//!
//! Manages the lifecycle of the single socket a session owns: opening it with
//! a bearer token, room-membership and send intents, and bounded reconnection
//! after transport failures. Uses the action pattern: methods take time as
//! input and return [`ConnectionAction`]s for the driver to execute.
//!
//! # State Machine
//!
//! ```text
//!                  connect()           opened
//! ┌──────────────┐ ───────> ┌────────────┐ ───────> ┌───────────┐
//! │ Disconnected │          │ Connecting │          │ Connected │
//! └──────────────┘ <─────── └────────────┘          └───────────┘
//!        ↑       disconnect()  ↑      │ error             │ error
//!        │                     │ tick │                   │
//!        │                     │      ↓                   ↓
//!        │                  ┌──────────────┐ <────────────┘
//!        │                  │ Reconnecting │
//!        │                  └──────────────┘
//!        │                         │ attempts > max
//!        │      connect()          ↓
//!        └──────────────────── ┌───────────┐
//!                              │ Exhausted │
//!                              └───────────┘
//! ```
//!
//! # Generations
//!
//! Every transport the manager opens gets a fresh generation number. Drivers
//! tag inbound events and failures with the generation of the transport that
//! produced them; anything from an older generation is discarded. This is
//! what guarantees inbound handlers are bound exactly once per connection
//! instance.
//!
//! # Failure semantics
//!
//! Intents issued while not connected are dropped silently (debug log only).
//! Callers of [`ConnectionManager::send_message`],
//! [`ConnectionManager::join_group`] and [`ConnectionManager::leave_group`]
//! never see an error.

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use studybuddy_proto::{GroupId, OutboundEvent};

use crate::error::ConnectionError;

/// Automatic reconnect attempts allowed after consecutive failures.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Delay unit for reconnect backoff. Attempt N waits N units.
pub const DEFAULT_RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Actions returned by the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a new transport authenticated by `token`.
    Open {
        /// Bearer token.
        token: String,
        /// Generation to tag this transport's events with.
        generation: u64,
    },

    /// Send this event over the open transport.
    Emit(OutboundEvent),

    /// Close the transport of this generation.
    Close {
        /// Generation being closed.
        generation: u64,
        /// Reason for closing.
        reason: String,
    },
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport, no pending retry
    Disconnected,
    /// Transport open requested, waiting for the driver to confirm
    Connecting,
    /// Transport open
    Connected,
    /// Transport failed, retry scheduled
    Reconnecting,
    /// Retry budget spent; only a manual `connect` resumes
    Exhausted,
}

/// Bounded, linearly increasing reconnect delays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Automatic attempts allowed between manual connects.
    pub max_attempts: u32,
    /// Attempt N waits `N * base_delay`.
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            base_delay: DEFAULT_RECONNECT_BASE_DELAY,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before automatic attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Retry scheduled after a failure.
#[derive(Debug, Clone, Copy)]
struct PendingRetry<I> {
    failed_at: I,
    delay: Duration,
}

/// Connection state machine
///
/// Owns the bearer token and attempt counter for one session. Pure: no I/O,
/// no stored environment. Generic over `Instant` so simulation can drive it
/// with virtual time.
#[derive(Debug, Clone)]
pub struct ConnectionManager<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    state: ConnectionState,
    policy: ReconnectPolicy,
    token: Option<String>,
    /// Generation of the most recently opened transport. Zero before the
    /// first open.
    generation: u64,
    /// Consecutive failures since the last successful open or manual connect.
    attempts: u32,
    retry: Option<PendingRetry<I>>,
}

impl<I> ConnectionManager<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a manager in [`ConnectionState::Disconnected`].
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            policy,
            token: None,
            generation: 0,
            attempts: 0,
            retry: None,
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Last known connection status.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Generation of the most recently opened transport.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Consecutive failures counted against the reconnect budget.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Reconnect policy in force.
    #[must_use]
    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Time left until the scheduled retry fires. `None` if no retry is
    /// pending.
    #[must_use]
    pub fn retry_in(&self, now: I) -> Option<Duration> {
        self.retry.map(|retry| retry.delay.saturating_sub(now - retry.failed_at))
    }

    /// Open a connection authenticated by `token`.
    ///
    /// No-op if already connected or connecting. Always resets the attempt
    /// counter, so a manual connect after exhaustion resumes reconnection.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::MissingToken` if `token` is empty
    pub fn connect(
        &mut self,
        token: impl Into<String>,
    ) -> Result<Vec<ConnectionAction>, ConnectionError> {
        let token = token.into();
        if token.is_empty() {
            return Err(ConnectionError::MissingToken);
        }

        self.attempts = 0;
        self.retry = None;

        match self.state {
            ConnectionState::Connected | ConnectionState::Connecting => {
                tracing::debug!(state = ?self.state, "connect ignored, transport already active");
                Ok(vec![])
            },
            ConnectionState::Disconnected
            | ConnectionState::Reconnecting
            | ConnectionState::Exhausted => {
                self.token = Some(token);
                Ok(self.open())
            },
        }
    }

    /// Transport of `generation` finished opening.
    ///
    /// Stale generations are ignored. Resets the attempt counter.
    pub fn handle_opened(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.state != ConnectionState::Connecting {
            tracing::debug!(generation, current = self.generation, "ignoring stale open");
            return false;
        }

        if self.attempts > 0 {
            tracing::info!(generation, attempts = self.attempts, "reconnected");
        } else {
            tracing::info!(generation, "connected");
        }

        self.state = ConnectionState::Connected;
        self.attempts = 0;
        true
    }

    /// Transport of `generation` failed to open or dropped.
    ///
    /// Schedules the next attempt after `attempt * base_delay`, or gives up
    /// once the budget is spent. Returns the error describing the outcome
    /// when the policy is exhausted, `None` otherwise.
    pub fn handle_transport_error(
        &mut self,
        generation: u64,
        now: I,
        reason: &str,
    ) -> Option<ConnectionError> {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "ignoring stale failure");
            return None;
        }

        match self.state {
            ConnectionState::Connecting | ConnectionState::Connected => {},
            ConnectionState::Disconnected
            | ConnectionState::Reconnecting
            | ConnectionState::Exhausted => return None,
        }

        self.attempts += 1;

        if self.attempts > self.policy.max_attempts {
            let attempts = self.policy.max_attempts;
            tracing::warn!(attempts, %reason, "reconnect attempts exhausted, staying offline");
            self.state = ConnectionState::Exhausted;
            self.retry = None;
            return Some(ConnectionError::RetriesExhausted { attempts });
        }

        let delay = self.policy.delay_for(self.attempts);
        tracing::warn!(
            attempt = self.attempts,
            delay_ms = delay.as_millis() as u64,
            %reason,
            "transport failed, scheduling reconnect"
        );

        self.state = ConnectionState::Reconnecting;
        self.retry = Some(PendingRetry { failed_at: now, delay });
        None
    }

    /// Process periodic maintenance. Fires a due reconnect.
    pub fn tick(&mut self, now: I) -> Vec<ConnectionAction> {
        let Some(retry) = self.retry else {
            return vec![];
        };

        if self.state != ConnectionState::Reconnecting || now - retry.failed_at < retry.delay {
            return vec![];
        }

        self.retry = None;
        tracing::debug!(attempt = self.attempts, "reconnect attempt due");
        self.open()
    }

    /// Subscribe to a group's room. No-op if not connected.
    pub fn join_group(&self, group_id: GroupId) -> Vec<ConnectionAction> {
        self.emit(OutboundEvent::JoinGroup { group_id })
    }

    /// Unsubscribe from a group's room. No-op if not connected.
    pub fn leave_group(&self, group_id: GroupId) -> Vec<ConnectionAction> {
        self.emit(OutboundEvent::LeaveGroup { group_id })
    }

    /// Fire-and-forget message send. No-op if not connected.
    pub fn send_message(&self, group_id: GroupId, content: String) -> Vec<ConnectionAction> {
        self.emit(OutboundEvent::SendMessage { group_id, content })
    }

    /// Tear down the connection and forget the token.
    pub fn disconnect(&mut self) -> Vec<ConnectionAction> {
        let actions = match self.state {
            ConnectionState::Connecting | ConnectionState::Connected => {
                vec![ConnectionAction::Close {
                    generation: self.generation,
                    reason: "client disconnect".to_string(),
                }]
            },
            ConnectionState::Disconnected
            | ConnectionState::Reconnecting
            | ConnectionState::Exhausted => vec![],
        };

        self.state = ConnectionState::Disconnected;
        self.token = None;
        self.attempts = 0;
        self.retry = None;
        actions
    }

    fn emit(&self, event: OutboundEvent) -> Vec<ConnectionAction> {
        if self.state == ConnectionState::Connected {
            vec![ConnectionAction::Emit(event)]
        } else {
            tracing::debug!(event = event.name(), group_id = %event.group_id(), "dropping intent while offline");
            vec![]
        }
    }

    fn open(&mut self) -> Vec<ConnectionAction> {
        let Some(token) = self.token.clone() else {
            self.state = ConnectionState::Disconnected;
            return vec![];
        };

        self.generation += 1;
        self.state = ConnectionState::Connecting;
        vec![ConnectionAction::Open { token, generation: self.generation }]
    }
}
