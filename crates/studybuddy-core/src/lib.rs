//! Core state machines for the StudyBuddy chat engine.
//!
//! Everything in this crate is Sans-IO: methods take the current time as an
//! argument and return actions for a driver to execute. No sockets, no
//! timers, no global state.
//!
//! # Components
//!
//! - [`env::Environment`]: Time source abstraction (real or simulated)
//! - [`connection::ConnectionManager`]: Real-time connection lifecycle and
//!   bounded reconnect backoff
//! - [`clock`]: Formatting of wall-clock instants into display timestamps

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod clock;
pub mod connection;
pub mod env;
pub mod error;

pub use connection::{ConnectionAction, ConnectionManager, ConnectionState, ReconnectPolicy};
pub use env::Environment;
pub use error::ConnectionError;
