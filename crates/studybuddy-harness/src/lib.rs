//! Deterministic simulation harness for StudyBuddy session testing.
//!
//! Virtual-time implementations of the Environment and Driver traits for
//! deterministic, reproducible testing of connection loss, reconnect backoff
//! and message delivery races.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the common
//! session invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_driver;
pub mod sim_env;

pub use invariants::{
    CourseSnapshot, Invariant, InvariantRegistry, InvariantResult, ProgressArithmetic,
    SelectedGroupIsMember, SelectedGroupRead, SessionSnapshot, SystemSnapshot, UniqueMessageIds,
    Violation,
};
pub use sim_driver::{SimDriver, SimDriverError, SimStep, TransportBehavior};
pub use sim_env::{SimEnv, SimInstant};
