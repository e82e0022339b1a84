//! Generic runtime for session orchestration.
//!
//! The Runtime drives the session event loop, coordinating between:
//! - [`App`]: Session state machine
//! - [`Bridge`]: Connection manager and transport translation
//! - [`Driver`]: Platform-specific I/O

use studybuddy_core::env::Environment;

use crate::{
    ApiRequest, App, AppAction, AppEvent, Bridge, ChatConfig, Driver, DriverInput, Viewer,
};

/// Generic runtime that orchestrates App, Bridge, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment providing time
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    app: App,
    bridge: Bridge<E>,
}

impl<D, E> Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    /// Create a new runtime for `viewer`.
    pub fn new(driver: D, env: E, viewer: Viewer, config: ChatConfig) -> Self {
        let bridge = Bridge::new(env, config.reconnect.clone());
        let app = App::new(viewer, config);
        Self { driver, app, bridge }
    }

    /// Run the main event loop until a quit command.
    ///
    /// Each cycle:
    /// 1. Waits for one input from the driver (or a tick timeout)
    /// 2. Routes it to the App or the Bridge
    /// 3. Executes resulting actions, feeding Bridge events back to the App
    /// 4. Ticks the connection manager so due reconnects fire
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app)?;

        loop {
            let should_quit = self.process_cycle().await?;
            if should_quit {
                break;
            }
        }

        self.driver.stop();
        Ok(())
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the session should quit.
    async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        match self.driver.next_input().await? {
            Some(DriverInput::Command(command)) => {
                let now = self.bridge.env().wall_clock_millis();
                let actions = self.app.apply(command, now);
                if self.process_actions(actions).await? {
                    return Ok(true);
                }
            },
            Some(DriverInput::Transport(event)) => {
                let events = self.bridge.handle_transport(event);
                self.flush_transport().await?;
                if self.process_bridge_events(events).await? {
                    return Ok(true);
                }
            },
            Some(DriverInput::Response(event)) => {
                let actions = self.app.handle(event);
                if self.process_actions(actions).await? {
                    return Ok(true);
                }
            },
            None => {},
        }

        let events = self.bridge.handle_tick();
        self.flush_transport().await?;
        if self.process_bridge_events(events).await? {
            return Ok(true);
        }

        let actions = self.app.handle(AppEvent::Tick);
        self.process_actions(actions).await
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.driver.render(&self.app)?,
                    AppAction::Quit => return Ok(true),

                    // Socket operations go through the bridge
                    AppAction::Connect { .. }
                    | AppAction::Disconnect
                    | AppAction::JoinGroup { .. }
                    | AppAction::LeaveGroup { .. }
                    | AppAction::SendMessage { .. } => {
                        let events = self.bridge.process_app_action(action);
                        self.flush_transport().await?;
                        for event in events {
                            let new_actions = self.app.handle(event);
                            pending_actions.extend(new_actions);
                        }
                    },

                    // REST operations go straight to the driver
                    AppAction::FetchGroups => self.driver.request(ApiRequest::FetchGroups)?,
                    AppAction::FetchHistory { group_id } => {
                        self.driver.request(ApiRequest::FetchHistory { group_id })?;
                    },
                    AppAction::FetchProgress { course_id } => {
                        self.driver.request(ApiRequest::FetchProgress { course_id })?;
                    },
                    AppAction::SaveLessonProgress { course_id, lesson_id, update } => {
                        self.driver.request(ApiRequest::SaveLessonProgress {
                            course_id,
                            lesson_id,
                            update,
                        })?;
                    },
                }
            }
        }
        Ok(false)
    }

    /// Process events from Bridge back to App.
    async fn process_bridge_events(&mut self, events: Vec<AppEvent>) -> Result<bool, D::Error> {
        for event in events {
            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Execute all pending transport commands through the driver.
    async fn flush_transport(&mut self) -> Result<(), D::Error> {
        let commands = self.bridge.take_commands();
        for command in commands {
            self.driver.execute(command).await?;
        }
        Ok(())
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a reference to the Bridge
    pub fn bridge(&self) -> &Bridge<E> {
        &self.bridge
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }
}
