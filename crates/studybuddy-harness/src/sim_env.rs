//! Virtual-time environment.
//!
//! [`SimEnv`] implements [`Environment`] with a clock that only moves when
//! the test advances it (or when something sleeps on it). Clones share the
//! same clock, so the driver and the runtime observe the same time.

use std::{
    future::Future,
    ops::Sub,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use studybuddy_core::env::Environment;

/// Wall clock at virtual time zero: 2024-05-01T10:15:30Z.
pub const DEFAULT_EPOCH_MILLIS: i64 = 1_714_558_530_000;

/// Instant on the virtual clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Time since the clock started.
    pub fn elapsed_since_start(self) -> Duration {
        self.0
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// Deterministic environment with a shared virtual clock.
#[derive(Debug, Clone)]
pub struct SimEnv {
    elapsed_micros: Arc<AtomicU64>,
    epoch_millis: i64,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Create a clock starting at [`DEFAULT_EPOCH_MILLIS`].
    pub fn new() -> Self {
        Self::starting_at(DEFAULT_EPOCH_MILLIS)
    }

    /// Create a clock whose wall time starts at `epoch_millis`.
    pub fn starting_at(epoch_millis: i64) -> Self {
        Self { elapsed_micros: Arc::new(AtomicU64::new(0)), epoch_millis }
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.elapsed_micros.fetch_add(micros, Ordering::SeqCst);
    }

    /// Time since the clock started.
    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.elapsed_micros.load(Ordering::SeqCst))
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.elapsed())
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        // Sleeping is instantaneous in virtual time.
        self.advance(duration);
        std::future::ready(())
    }

    fn wall_clock_millis(&self) -> i64 {
        let elapsed = i64::try_from(self.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.epoch_millis.saturating_add(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::new();
        let other = env.clone();
        let start = env.now();

        other.advance(Duration::from_millis(1500));

        assert_eq!(env.now() - start, Duration::from_millis(1500));
        assert_eq!(env.wall_clock_millis(), DEFAULT_EPOCH_MILLIS + 1500);
    }

    #[test]
    fn instants_never_underflow() {
        let early = SimInstant::default();
        let env = SimEnv::new();
        env.advance(Duration::from_secs(1));
        assert_eq!(early - env.now(), Duration::ZERO);
    }

    #[tokio::test]
    async fn sleep_advances_time() {
        let env = SimEnv::new();
        env.sleep(Duration::from_secs(3)).await;
        assert_eq!(env.elapsed(), Duration::from_secs(3));
    }
}
