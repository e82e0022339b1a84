//! Fuzz target for ConnectionManager
//!
//! Bound automatic reconnects under arbitrary transport behavior
//!
//! # Strategy
//!
//! - Failures: errors for the current or a stale generation
//! - Opens: confirmations for the current or a stale generation
//! - Time: arbitrary clock advances between ticks
//! - User: manual connects (with and without a token) and disconnects
//!
//! # Invariants
//!
//! - At most `max_attempts` automatic opens between resets
//! - Exhausted manager NEVER opens on tick
//! - Generation never decreases and every open gets a fresh one
//! - Intents are emitted ONLY while connected

#![no_main]

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use studybuddy_core::{ConnectionAction, ConnectionManager, ConnectionState, ReconnectPolicy};
use studybuddy_proto::GroupId;

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    max_attempts: u8,
    base_delay_ms: u16,
    ops: Vec<Op>,
}

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Connect { with_token: bool },
    Opened { stale: bool },
    Failed { stale: bool },
    Advance { millis: u32 },
    Join,
    Disconnect,
}

fuzz_target!(|scenario: Scenario| {
    let policy = ReconnectPolicy {
        max_attempts: u32::from(scenario.max_attempts % 8),
        base_delay: Duration::from_millis(u64::from(scenario.base_delay_ms)),
    };
    let max_attempts = policy.max_attempts;
    let mut conn = ConnectionManager::new(policy);

    let mut now = Instant::now();
    let mut automatic_opens = 0u32;
    let mut last_generation = conn.generation();

    for op in scenario.ops {
        let before = conn.state();
        let actions = match op {
            Op::Connect { with_token } => {
                let token = if with_token { "token" } else { "" };
                match conn.connect(token) {
                    Ok(actions) => {
                        automatic_opens = 0;
                        actions
                    },
                    Err(_) => {
                        assert!(!with_token);
                        vec![]
                    },
                }
            },
            Op::Opened { stale } => {
                let generation = conn.generation().wrapping_sub(u64::from(stale));
                if conn.handle_opened(generation) {
                    assert!(!stale);
                    automatic_opens = 0;
                }
                vec![]
            },
            Op::Failed { stale } => {
                let generation = conn.generation().wrapping_sub(u64::from(stale));
                let _ = conn.handle_transport_error(generation, now, "fuzz");
                vec![]
            },
            Op::Advance { millis } => {
                now += Duration::from_millis(u64::from(millis));
                let actions = conn.tick(now);
                if before == ConnectionState::Exhausted {
                    assert!(actions.is_empty(), "exhausted manager reopened");
                }
                automatic_opens += actions
                    .iter()
                    .filter(|a| matches!(a, ConnectionAction::Open { .. }))
                    .count() as u32;
                actions
            },
            Op::Join => conn.join_group(GroupId::from("g1")),
            Op::Disconnect => conn.disconnect(),
        };

        assert!(automatic_opens <= max_attempts, "{automatic_opens} automatic opens");

        for action in &actions {
            match action {
                ConnectionAction::Open { generation, .. } => {
                    assert!(*generation > last_generation);
                },
                ConnectionAction::Emit(_) => assert_eq!(conn.state(), ConnectionState::Connected),
                ConnectionAction::Close { .. } => {},
            }
        }
        assert!(conn.generation() >= last_generation);
        last_generation = conn.generation();
    }
});
