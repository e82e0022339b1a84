//! Production driver for the StudyBuddy chat engine.
//!
//! A thin shell over [`studybuddy_app::Driver`] that provides real I/O. All
//! orchestration lives in the generic [`studybuddy_app::Runtime`].
//!
//! # Components
//!
//! - [`SystemEnv`]: system clock and tokio timers
//! - [`transport`]: WebSocket sockets tagged by connection generation
//! - [`ApiClient`]: REST endpoints for groups, history and progress
//! - [`NetworkDriver`]: the [`Driver`](studybuddy_app::Driver) implementation
//! - [`Session`]: spawns a runtime and sends it commands
//! - [`ClientConfig`]: TOML configuration

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod api;
pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod session;
pub mod system_env;
pub mod transport;
pub mod view;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use driver::NetworkDriver;
pub use error::{ApiError, ConfigError, DriverError, TransportError};
pub use logging::init_tracing;
pub use session::Session;
pub use system_env::SystemEnv;
pub use view::{GroupView, SessionView};
