//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the network driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`studybuddy_app::Runtime`] orchestration code runs in both production
//! and simulation.
//!
//! Inputs are scripted as [`SimStep`]s. Once the script runs out the driver
//! reports [`Command::Quit`], so `Runtime::run` always terminates.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use studybuddy_app::{
    ApiRequest, App, AppEvent, Command, Driver, DriverInput, TransportCommand, TransportEvent,
};

use crate::{
    SimEnv,
    invariants::{InvariantRegistry, SessionSnapshot, SystemSnapshot},
};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// One scripted step.
#[derive(Debug, Clone)]
pub enum SimStep {
    /// Deliver this input.
    Input(DriverInput),
    /// Move the virtual clock forward, then let the runtime tick.
    Advance(Duration),
}

/// How the simulated server reacts to socket opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportBehavior {
    /// Opens never resolve unless the script says so.
    #[default]
    Manual,
    /// Every open succeeds on the next cycle.
    Accept,
    /// Every open fails on the next cycle.
    Refuse,
}

/// Shared state for step injection and output capture.
///
/// This allows injection from outside async contexts.
#[derive(Default)]
struct SharedState {
    steps: VecDeque<SimStep>,
    behavior: TransportBehavior,
    executed: Vec<TransportCommand>,
    requests: Vec<ApiRequest>,
    renders: usize,
    last_snapshot: Option<SessionSnapshot>,
    stopped: bool,
}

/// Simulation driver for deterministic testing.
///
/// Clones share state, so a test can keep one handle for injection and
/// inspection while the runtime owns the other.
#[derive(Clone)]
pub struct SimDriver {
    env: SimEnv,
    state: Arc<Mutex<SharedState>>,
    invariants: Option<Arc<InvariantRegistry>>,
}

impl SimDriver {
    /// Create a new simulation driver advancing `env`'s clock.
    pub fn new(env: SimEnv) -> Self {
        Self { env, state: Arc::new(Mutex::new(SharedState::default())), invariants: None }
    }

    /// Enable invariant checking on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(Arc::new(registry));
        self
    }

    /// Set how socket opens resolve.
    pub fn set_transport_behavior(&self, behavior: TransportBehavior) {
        self.lock().behavior = behavior;
    }

    /// Queue a user command.
    pub fn inject_command(&self, command: Command) {
        self.push(SimStep::Input(DriverInput::Command(command)));
    }

    /// Queue a socket event.
    pub fn inject_transport(&self, event: TransportEvent) {
        self.push(SimStep::Input(DriverInput::Transport(event)));
    }

    /// Queue a REST response.
    pub fn inject_response(&self, event: AppEvent) {
        self.push(SimStep::Input(DriverInput::Response(event)));
    }

    /// Queue a clock advance.
    pub fn inject_advance(&self, duration: Duration) {
        self.push(SimStep::Advance(duration));
    }

    /// Take all executed transport commands.
    pub fn take_executed(&self) -> Vec<TransportCommand> {
        std::mem::take(&mut self.lock().executed)
    }

    /// Take all started REST requests.
    pub fn take_requests(&self) -> Vec<ApiRequest> {
        std::mem::take(&mut self.lock().requests)
    }

    /// Number of renders so far.
    pub fn renders(&self) -> usize {
        self.lock().renders
    }

    /// Snapshot taken at the most recent render.
    pub fn last_snapshot(&self) -> Option<SessionSnapshot> {
        self.lock().last_snapshot.clone()
    }

    /// Whether the runtime stopped the driver.
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Check if there are scripted steps left.
    pub fn has_pending(&self) -> bool {
        !self.lock().steps.is_empty()
    }

    fn push(&self, step: SimStep) {
        self.lock().steps.push_back(step);
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn next_input(&mut self) -> Result<Option<DriverInput>, Self::Error> {
        let step = self.lock().steps.pop_front();
        match step {
            Some(SimStep::Input(input)) => Ok(Some(input)),
            Some(SimStep::Advance(duration)) => {
                self.env.advance(duration);
                Ok(None)
            },
            None => Ok(Some(DriverInput::Command(Command::Quit))),
        }
    }

    async fn execute(&mut self, command: TransportCommand) -> Result<(), Self::Error> {
        let mut state = self.lock();

        if let TransportCommand::Open { generation, .. } = &command {
            let generation = *generation;
            let reaction = match state.behavior {
                TransportBehavior::Manual => None,
                TransportBehavior::Accept => Some(TransportEvent::Opened { generation }),
                TransportBehavior::Refuse => Some(TransportEvent::Closed {
                    generation,
                    reason: "connection refused".to_string(),
                }),
            };
            if let Some(event) = reaction {
                state.steps.push_front(SimStep::Input(DriverInput::Transport(event)));
            }
        }

        state.executed.push(command);
        Ok(())
    }

    fn request(&mut self, request: ApiRequest) -> Result<(), Self::Error> {
        self.lock().requests.push(request);
        Ok(())
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        let snapshot = SessionSnapshot::from_app(0, app);
        if let Some(registry) = &self.invariants {
            let context = format!("after render {}", self.lock().renders + 1);
            registry.assert_all(&SystemSnapshot::single(snapshot.clone()), &context);
        }

        let mut state = self.lock();
        state.renders += 1;
        state.last_snapshot = Some(snapshot);
        Ok(())
    }

    fn stop(&mut self) {
        self.lock().stopped = true;
    }
}
