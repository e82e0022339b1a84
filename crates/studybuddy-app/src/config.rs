//! Session tuning.

use std::time::Duration;

use chrono::FixedOffset;
use studybuddy_core::{ReconnectPolicy, clock};

/// Default interval between runtime ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Chat session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Insert the viewer's messages locally before the server echoes them.
    ///
    /// Off by default: the server broadcasts every message back to its
    /// sender, and that echo is what lands in the thread.
    pub optimistic_send: bool,
    /// Offset east of UTC, in minutes, used for display timestamps.
    pub display_offset_minutes: i32,
    /// How often the runtime ticks the connection manager.
    pub tick_interval: Duration,
    /// Reconnect backoff.
    pub reconnect: ReconnectPolicy,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            optimistic_send: false,
            display_offset_minutes: 0,
            tick_interval: DEFAULT_TICK_INTERVAL,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ChatConfig {
    /// Offset used to format display timestamps.
    pub fn display_offset(&self) -> FixedOffset {
        clock::offset_from_minutes(self.display_offset_minutes)
    }
}
