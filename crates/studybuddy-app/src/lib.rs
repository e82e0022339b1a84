//! Application layer for StudyBuddy
//!
//! Pure state machines and a generic runtime for the group-chat session and
//! the course progress tracker. The same code runs against a real socket in
//! production and against a scripted driver in simulation.
//!
//! # Components
//!
//! - [`ChatState`]: Message store, unread tracker and selection cursor
//! - [`ProgressTracker`]: Per-course lesson completion
//! - [`App`]: Session state machine (events in, actions out)
//! - [`Bridge`]: Owns the connection manager, translates between App and
//!   transport
//! - [`Driver`]: Trait for platform-specific I/O
//! - [`Runtime`]: Session controller running the event loop

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
mod chat;
mod command;
mod config;
mod driver;
mod event;
mod messages;
mod progress;
mod runtime;
mod selection;
mod sender;
mod state;
mod unread;

pub use action::AppAction;
pub use app::App;
pub use bridge::{Bridge, TransportCommand, TransportEvent};
pub use chat::{ChatState, NewMessage};
pub use command::Command;
pub use config::{ChatConfig, DEFAULT_TICK_INTERVAL};
pub use driver::{ApiRequest, Driver, DriverInput};
pub use event::{AppEvent, FailedRequest};
pub use messages::MessageStore;
pub use progress::{CourseProgress, LessonProgress, ProgressTracker, completion_percentage};
pub use runtime::Runtime;
pub use selection::{SelectionChange, SelectionCursor};
pub use sender::{OWN_SENDER_LABEL, Viewer, name_matches_viewer};
pub use state::{ChatMessage, ConnectionStatus, Group};
pub use unread::UnreadTracker;
