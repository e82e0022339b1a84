//! Display timestamps.
//!
//! Chat messages carry a pre-formatted `HH:MM` label computed when the
//! message is ingested, never a raw instant. Formatting happens in a fixed
//! UTC offset chosen by configuration so simulation output does not depend
//! on the host's timezone.

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// `strftime` pattern for message timestamps.
pub const DISPLAY_FORMAT: &str = "%H:%M";

/// Offset `minutes` east of UTC. Out-of-range values fall back to UTC.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt).unwrap_or_else(|| Utc.fix())
}

/// Format Unix milliseconds as `HH:MM` in `offset`.
///
/// Returns an empty label for instants chrono cannot represent.
pub fn display_time(unix_millis: i64, offset: FixedOffset) -> String {
    DateTime::<Utc>::from_timestamp_millis(unix_millis)
        .map(|t| t.with_timezone(&offset).format(DISPLAY_FORMAT).to_string())
        .unwrap_or_default()
}

/// Format an RFC 3339 server timestamp as `HH:MM` in `offset`.
///
/// `None` if the timestamp does not parse.
pub fn parse_display_time(rfc3339: &str, offset: FixedOffset) -> Option<String> {
    DateTime::parse_from_rfc3339(rfc3339)
        .ok()
        .map(|t| t.with_timezone(&offset).format(DISPLAY_FORMAT).to_string())
}
