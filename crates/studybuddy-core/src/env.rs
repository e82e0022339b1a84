//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from system resources. Production drivers use real
//! clocks; simulation uses a virtual clock that only moves when the test
//! advances it, so reconnect backoff and display timestamps are reproducible.

use std::time::Duration;

/// Abstract environment providing time and async sleep.
///
/// Implementations MUST guarantee that `now()` never goes backwards.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`, while simulation
    /// environments use virtual time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code awaits this; state machines never do.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Wall-clock time as milliseconds since the Unix epoch.
    ///
    /// Used for client-generated message ids and display timestamps, which
    /// are formatted at ingestion time rather than stored as instants.
    fn wall_clock_millis(&self) -> i64;
}
