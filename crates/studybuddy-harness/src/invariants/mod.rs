//! Session invariants.
//!
//! Each check looks at a [`SessionSnapshot`], the observable state of one
//! `App` after a step: its selection, member groups, unread counters, stored
//! thread ids and course progress. Scripted runs check after every render
//! (see `SimDriver::with_invariants`); property tests and the fuzzer check
//! after every operation.
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! app.handle(AppEvent::GroupsLoaded { groups });
//! registry.check_app(&app)?;
//! ```

mod checks;
mod snapshot;

use std::fmt;

use studybuddy_app::App;

pub use checks::{ProgressArithmetic, SelectedGroupIsMember, SelectedGroupRead, UniqueMessageIds};
pub use snapshot::{CourseSnapshot, SessionSnapshot, SystemSnapshot};

/// Outcome of one check.
pub type InvariantResult = Result<(), Violation>;

/// A broken session property.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Check that failed.
    pub invariant: &'static str,
    /// Offending session and values.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property every session snapshot must satisfy.
pub trait Invariant: Send + Sync {
    /// Stable name used in reports.
    fn name(&self) -> &'static str;

    /// Check every session in `state`.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Set of checks run together.
#[derive(Default)]
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Registry with no checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection membership, read selection, unique thread ids and
    /// progress arithmetic.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(SelectedGroupIsMember);
        registry.add(SelectedGroupRead);
        registry.add(UniqueMessageIds);
        registry.add(ProgressArithmetic);
        registry
    }

    /// Register a check.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Run every check. Collects all violations rather than stopping early.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Snapshot `app` as session 0 and run every check.
    pub fn check_app(&self, app: &App) -> Result<(), Vec<Violation>> {
        self.check_all(&SystemSnapshot::single(SessionSnapshot::from_app(0, app)))
    }

    /// Run every check and panic with all violations, labelled by `context`.
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        let Err(violations) = self.check_all(state) else {
            return;
        };
        let report = violations.iter().fold(String::new(), |mut report, v| {
            report.push_str("\n  ");
            report.push_str(&v.to_string());
            report
        });
        panic!("session invariants broken {context}:{report}");
    }

    /// Number of registered checks.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Whether no checks are registered.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
