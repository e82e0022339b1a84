//! Fuzz target for the session App
//!
//! Keep chat and progress state consistent under arbitrary event orderings
//!
//! # Strategy
//!
//! - Group lists: arbitrary subsets, including empty and duplicated ids
//! - Pushes and history pages: overlapping message ids in any order
//! - User intents: selection, sends, mark-as-read, lesson marks
//! - Membership: the viewer leaving groups, including the selected one
//!
//! # Invariants
//!
//! - Selected group is ALWAYS a member group
//! - Selected group NEVER shows unread messages
//! - Message ids are unique within every thread
//! - Progress percentages match the rounded completion ratio

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use studybuddy_app::{App, AppEvent, ChatConfig, Command, Viewer};
use studybuddy_harness::{InvariantRegistry, SessionSnapshot, SystemSnapshot};
use studybuddy_proto::{
    CourseId, CourseProgressResponse, GroupId, GroupSummary, HistoricalMessage, LessonId,
    LessonProgressRecord, MembershipChange, MembershipData, MessageId, ProgressSummary, UserId,
    WireMessage, WireUser,
};

// 2024-05-01T10:15:30Z
const NOW: i64 = 1_714_558_530_000;

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    optimistic_send: bool,
    ops: Vec<Op>,
}

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Groups(Vec<u8>),
    Push { group: u8, id: u8, own: bool },
    History { group: u8, ids: Vec<u8>, sender: String },
    Select(u8),
    Send { group: u8, content: String },
    MarkRead(u8),
    Left(u8),
    Connected,
    Mark { course: u8, lesson: u8, complete: bool },
    Snapshot { course: u8, total: u8, completed: Vec<u8> },
}

fn group(i: u8) -> GroupId {
    GroupId::new(format!("g{}", i % 6))
}

fn course(i: u8) -> CourseId {
    CourseId::new(format!("c{}", i % 3))
}

fn user(own: bool) -> WireUser {
    let (id, first, last) = if own { ("me", "Ann", "Lee") } else { ("u2", "Bob", "Stone") };
    WireUser {
        id: UserId::from(id),
        first_name: first.to_string(),
        last_name: last.to_string(),
        avatar: None,
    }
}

fn apply(app: &mut App, op: Op) {
    match op {
        Op::Groups(indices) => {
            let groups = indices
                .into_iter()
                .map(|i| GroupSummary {
                    id: group(i),
                    name: format!("Group {i}"),
                    category: String::new(),
                    member_count: 1,
                    is_member: i % 7 != 0,
                })
                .collect();
            app.handle(AppEvent::GroupsLoaded { groups });
        },
        Op::Push { group: g, id, own } => {
            app.handle(AppEvent::MessageReceived {
                message: WireMessage {
                    id: MessageId::new(id.to_string()),
                    group_id: group(g),
                    content: "text".to_string(),
                    sender: user(own),
                    timestamp: String::new(),
                },
                received_at: NOW,
            });
        },
        Op::History { group: g, ids, sender } => {
            let messages = ids
                .into_iter()
                .map(|id| HistoricalMessage {
                    id: MessageId::new(id.to_string()),
                    group_id: group(g),
                    content: "old".to_string(),
                    sender_id: None,
                    sender: sender.clone(),
                    timestamp: String::new(),
                })
                .collect();
            app.handle(AppEvent::HistoryLoaded { group_id: group(g), messages, received_at: NOW });
        },
        Op::Select(g) => {
            app.apply(Command::SelectGroup(group(g)), NOW);
        },
        Op::Send { group: g, content } => {
            app.apply(Command::SendMessage { group_id: group(g), content }, NOW);
        },
        Op::MarkRead(g) => {
            app.apply(Command::MarkGroupAsRead(group(g)), NOW);
        },
        Op::Left(g) => {
            app.handle(AppEvent::MemberLeft(MembershipChange {
                group_id: group(g),
                data: MembershipData { user: user(true), member_count: 0 },
            }));
        },
        Op::Connected => {
            app.handle(AppEvent::Connected);
        },
        Op::Mark { course: c, lesson, complete } => {
            let lesson_id = LessonId::new(format!("l{}", lesson % 8));
            let command = if complete {
                Command::MarkLessonComplete { course_id: course(c), lesson_id }
            } else {
                Command::MarkLessonIncomplete { course_id: course(c), lesson_id }
            };
            app.apply(command, NOW);
        },
        Op::Snapshot { course: c, total, completed } => {
            let lessons = completed
                .into_iter()
                .map(|l| LessonProgressRecord {
                    lesson_id: LessonId::new(format!("l{}", l % 8)),
                    is_completed: true,
                    completed_at: None,
                    time_spent: 0,
                    last_accessed_at: None,
                })
                .collect();
            app.handle(AppEvent::ProgressLoaded {
                course_id: course(c),
                response: CourseProgressResponse {
                    course_id: None,
                    lessons,
                    progress: ProgressSummary {
                        total_lessons: u32::from(total % 10),
                        completed_lessons: 0,
                        completion_percentage: 0,
                    },
                },
            });
        },
    }
}

fuzz_target!(|scenario: Scenario| {
    let registry = InvariantRegistry::standard();
    let config = ChatConfig { optimistic_send: scenario.optimistic_send, ..ChatConfig::default() };
    let mut app = App::new(Viewer::new("me", "Ann", "Lee"), config);

    for (i, op) in scenario.ops.into_iter().enumerate() {
        apply(&mut app, op);
        let snapshot = SystemSnapshot::single(SessionSnapshot::from_app(0, &app));
        registry.assert_all(&snapshot, &format!("after op {i}"));
    }
});
