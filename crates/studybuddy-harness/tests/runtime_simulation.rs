//! End-to-end simulation of the session runtime.
//!
//! Each test scripts a session against [`SimDriver`], runs the real
//! [`Runtime`] to completion, and inspects what the driver saw. Invariants
//! are checked on every render.

use std::time::Duration;

use studybuddy_app::{
    ApiRequest, AppEvent, ChatConfig, Command, ConnectionStatus, Runtime, TransportCommand,
    TransportEvent, Viewer,
};
use studybuddy_harness::{
    InvariantRegistry, SimDriver, SimEnv, TransportBehavior, sim_env::DEFAULT_EPOCH_MILLIS,
};
use studybuddy_proto::{
    GroupId, GroupSummary, HistoricalMessage, InboundEvent, MessageId, OutboundEvent, UserId,
    WireMessage, WireUser,
};

fn viewer() -> Viewer {
    Viewer::new("me", "Ann", "Lee")
}

fn summary(id: &str) -> GroupSummary {
    GroupSummary {
        id: GroupId::from(id),
        name: format!("Group {id}"),
        category: "math".to_string(),
        member_count: 3,
        is_member: true,
    }
}

fn push(
    generation: u64,
    group: &str,
    id: &str,
    from: (&str, &str, &str),
    content: &str,
) -> TransportEvent {
    let (user_id, first, last) = from;
    TransportEvent::Received {
        generation,
        event: InboundEvent::NewMessage(WireMessage {
            id: MessageId::from(id),
            group_id: GroupId::from(group),
            content: content.to_string(),
            sender: WireUser {
                id: UserId::from(user_id),
                first_name: first.to_string(),
                last_name: last.to_string(),
                avatar: None,
            },
            timestamp: String::new(),
        }),
    }
}

fn history(id: &str, sender_id: Option<&str>, sender: &str, content: &str) -> HistoricalMessage {
    HistoricalMessage {
        id: MessageId::from(id),
        group_id: GroupId::from("g1"),
        content: content.to_string(),
        sender_id: sender_id.map(UserId::from),
        sender: sender.to_string(),
        timestamp: "2024-05-01T10:15:00Z".to_string(),
    }
}

fn groups_loaded(ids: &[&str]) -> AppEvent {
    AppEvent::GroupsLoaded { groups: ids.iter().map(|id| summary(id)).collect() }
}

fn opens(executed: &[TransportCommand]) -> Vec<u64> {
    executed
        .iter()
        .filter_map(|c| match c {
            TransportCommand::Open { generation, .. } => Some(*generation),
            _ => None,
        })
        .collect()
}

fn runtime(driver: &SimDriver, env: &SimEnv) -> Runtime<SimDriver, SimEnv> {
    Runtime::new(driver.clone(), env.clone(), viewer(), ChatConfig::default())
}

fn sim() -> (SimDriver, SimEnv) {
    let env = SimEnv::new();
    let driver = SimDriver::new(env.clone()).with_invariants(InvariantRegistry::standard());
    (driver, env)
}

#[tokio::test]
async fn session_selects_joins_and_tracks_unread() {
    let (driver, env) = sim();
    driver.set_transport_behavior(TransportBehavior::Accept);

    driver.inject_command(Command::Connect { token: "tok".to_string() });
    driver.inject_response(groups_loaded(&["g1", "g2"]));
    driver.inject_transport(push(1, "g2", "m1", ("u2", "Bob", "Stone"), "hi"));
    driver.inject_command(Command::SelectGroup(GroupId::from("g2")));

    runtime(&driver, &env).run().await.unwrap();

    let executed = driver.take_executed();
    assert_eq!(executed, vec![
        TransportCommand::Open { token: "tok".to_string(), generation: 1 },
        TransportCommand::Send {
            generation: 1,
            event: OutboundEvent::JoinGroup { group_id: GroupId::from("g1") },
        },
        TransportCommand::Send {
            generation: 1,
            event: OutboundEvent::LeaveGroup { group_id: GroupId::from("g1") },
        },
        TransportCommand::Send {
            generation: 1,
            event: OutboundEvent::JoinGroup { group_id: GroupId::from("g2") },
        },
    ]);

    assert_eq!(driver.take_requests(), vec![
        ApiRequest::FetchGroups,
        ApiRequest::FetchHistory { group_id: GroupId::from("g1") },
        ApiRequest::FetchHistory { group_id: GroupId::from("g2") },
    ]);

    let snapshot = driver.last_snapshot().unwrap();
    assert_eq!(snapshot.selected, Some(GroupId::from("g2")));
    assert!(snapshot.unread.is_empty());
    assert_eq!(snapshot.status, ConnectionStatus::Online);
    assert!(driver.is_stopped());
}

#[tokio::test]
async fn reconnect_gives_up_after_five_attempts_and_resumes_on_connect() {
    let (driver, env) = sim();

    driver.inject_command(Command::Connect { token: "tok".to_string() });
    driver.inject_transport(TransportEvent::Closed { generation: 1, reason: "refused".to_string() });
    for attempt in 1..=5u64 {
        driver.inject_advance(Duration::from_secs(attempt));
        driver.inject_transport(TransportEvent::Closed {
            generation: attempt + 1,
            reason: "refused".to_string(),
        });
    }
    // Long after the budget is spent, nothing retries on its own.
    driver.inject_advance(Duration::from_secs(600));
    driver.inject_command(Command::Connect { token: "tok".to_string() });
    driver.inject_transport(TransportEvent::Opened { generation: 7 });

    runtime(&driver, &env).run().await.unwrap();

    // One manual open, five automatic retries, one manual open after giving up.
    assert_eq!(opens(&driver.take_executed()), vec![1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(driver.last_snapshot().unwrap().status, ConnectionStatus::Online);
}

#[tokio::test]
async fn exhausted_session_reports_gave_up() {
    let (driver, env) = sim();
    driver.set_transport_behavior(TransportBehavior::Refuse);

    driver.inject_command(Command::Connect { token: "tok".to_string() });
    for attempt in 1..=5u64 {
        driver.inject_advance(Duration::from_secs(attempt));
    }
    driver.inject_advance(Duration::from_secs(600));

    runtime(&driver, &env).run().await.unwrap();

    assert_eq!(opens(&driver.take_executed()).len(), 6);
    assert_eq!(driver.last_snapshot().unwrap().status, ConnectionStatus::GaveUp);
}

#[tokio::test]
async fn reconnect_rejoins_and_drops_stale_pushes() {
    let (driver, env) = sim();

    driver.inject_command(Command::Connect { token: "tok".to_string() });
    driver.inject_transport(TransportEvent::Opened { generation: 1 });
    driver.inject_response(groups_loaded(&["g1"]));
    driver.inject_transport(TransportEvent::Closed { generation: 1, reason: "reset".to_string() });
    driver.inject_advance(Duration::from_secs(1));
    driver.inject_transport(TransportEvent::Opened { generation: 2 });
    driver.inject_transport(push(1, "g1", "late", ("u2", "Bob", "Stone"), "from the dead socket"));
    driver.inject_transport(push(2, "g1", "m2", ("u2", "Bob", "Stone"), "hi"));

    runtime(&driver, &env).run().await.unwrap();

    let executed = driver.take_executed();
    assert!(executed.contains(&TransportCommand::Send {
        generation: 2,
        event: OutboundEvent::JoinGroup { group_id: GroupId::from("g1") },
    }));

    let history_fetches = driver
        .take_requests()
        .into_iter()
        .filter(|r| matches!(r, ApiRequest::FetchHistory { .. }))
        .count();
    assert_eq!(history_fetches, 2);

    let snapshot = driver.last_snapshot().unwrap();
    assert_eq!(snapshot.threads[&GroupId::from("g1")], vec![MessageId::from("m2")]);
}

#[tokio::test]
async fn history_and_echo_merge_without_duplicates() {
    let (driver, env) = sim();
    driver.set_transport_behavior(TransportBehavior::Accept);

    driver.inject_command(Command::Connect { token: "tok".to_string() });
    driver.inject_response(groups_loaded(&["g1"]));
    driver.inject_transport(push(1, "g1", "m1", ("u2", "Bob", "Stone"), "hi"));
    driver.inject_command(Command::SendMessage {
        group_id: GroupId::from("g1"),
        content: "hello back".to_string(),
    });
    driver.inject_transport(push(1, "g1", "m2", ("me", "Ann", "Lee"), "hello back"));
    // History arrives late and overlaps with both pushes.
    driver.inject_response(AppEvent::HistoryLoaded {
        group_id: GroupId::from("g1"),
        messages: vec![
            history("m1", Some("u2"), "Bob Stone", "hi"),
            history("m2", None, "Ann Lee", "hello back"),
        ],
        received_at: DEFAULT_EPOCH_MILLIS,
    });

    runtime(&driver, &env).run().await.unwrap();

    let snapshot = driver.last_snapshot().unwrap();
    insta::assert_snapshot!(snapshot.selected_thread.join("\n"), @r"
    10:15 Bob Stone: hi
    10:15 You: hello back
    ");
}
