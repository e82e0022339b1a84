//! Property-based tests for the chat and progress reducers.
//!
//! Tests verify that invariants hold under arbitrary operation sequences.
//! This ensures behavioral correctness across all possible execution paths.

use std::collections::HashSet;

use chrono::DateTime;
use proptest::prelude::*;
use studybuddy_app::{ChatMessage, ChatState, NewMessage, ProgressTracker, completion_percentage};
use studybuddy_core::clock;
use studybuddy_proto::{
    CourseId, CourseProgressResponse, GroupId, LessonId, LessonProgressRecord, MessageId,
    ProgressSummary,
};

// 2024-05-01T10:15:30Z
const NOW: i64 = 1_714_558_530_000;

#[derive(Debug, Clone)]
enum Ingest {
    Receive(u8),
    Load(Vec<u8>),
}

fn ingest_strategy() -> impl Strategy<Value = Ingest> {
    prop_oneof![
        (0u8..6).prop_map(Ingest::Receive),
        prop::collection::vec(0u8..6, 0..5).prop_map(Ingest::Load),
    ]
}

fn chat() -> ChatState {
    ChatState::new(clock::offset_from_minutes(0))
}

fn incoming(group: &GroupId, id: &str, sender: &str) -> NewMessage {
    NewMessage {
        group_id: group.clone(),
        content: "text".to_string(),
        sender: sender.to_string(),
        id: Some(MessageId::from(id)),
    }
}

fn stored(group: &GroupId, id: &str) -> ChatMessage {
    ChatMessage {
        id: MessageId::from(id),
        group_id: group.clone(),
        sender: "Alice".to_string(),
        content: "text".to_string(),
        timestamp: "10:00".to_string(),
    }
}

proptest! {
    #[test]
    fn ingestion_is_idempotent(ops in prop::collection::vec(ingest_strategy(), 1..40)) {
        let mut chat = chat();
        let g1 = GroupId::from("g1");
        let mut offered = HashSet::new();

        for op in ops {
            match op {
                Ingest::Receive(id) => {
                    offered.insert(id);
                    chat.receive_message(incoming(&g1, &id.to_string(), "Alice"), NOW);
                },
                Ingest::Load(ids) => {
                    offered.extend(ids.iter().copied());
                    let page = ids.iter().map(|id| stored(&g1, &id.to_string())).collect();
                    chat.load_messages(&g1, page);
                },
            }
        }

        let thread = chat.messages().messages(&g1);
        let unique: HashSet<_> = thread.iter().map(|m| m.id.clone()).collect();
        prop_assert_eq!(unique.len(), thread.len());
        prop_assert_eq!(thread.len(), offered.len());
    }

    #[test]
    fn unread_counts_then_resets_on_select(n in 0u32..50) {
        let mut chat = chat();
        let g1 = GroupId::from("g1");
        let g2 = GroupId::from("g2");
        chat.select_group(g2);

        for i in 0..n {
            chat.receive_message(incoming(&g1, &i.to_string(), "Bob"), NOW);
        }
        prop_assert_eq!(chat.unread().get(&g1), n);

        chat.select_group(g1.clone());
        prop_assert_eq!(chat.unread().get(&g1), 0);
    }

    #[test]
    fn selecting_twice_clears_both(a_unread in 0u32..10, b_unread in 0u32..10) {
        let mut chat = chat();
        let a = GroupId::from("a");
        let b = GroupId::from("b");

        for i in 0..a_unread {
            chat.receive_message(incoming(&a, &format!("a{i}"), "Bob"), NOW);
        }
        chat.select_group(a.clone());
        for i in 0..b_unread {
            chat.receive_message(incoming(&b, &format!("b{i}"), "Bob"), NOW);
        }
        chat.select_group(b.clone());

        prop_assert_eq!(chat.unread().get(&a), 0);
        prop_assert_eq!(chat.unread().get(&b), 0);
        prop_assert_eq!(chat.selected(), Some(&b));
    }

    #[test]
    fn percentage_matches_rounded_ratio(completed in 0u32..200, total in 1u32..200) {
        prop_assume!(completed <= total);
        let expected = (f64::from(completed) * 100.0 / f64::from(total)).round() as u8;
        prop_assert_eq!(completion_percentage(completed, total), expected);
    }
}

fn five_lesson_course(course: &CourseId) -> ProgressTracker {
    let mut tracker = ProgressTracker::new();
    tracker.apply_course_progress(course.clone(), CourseProgressResponse {
        course_id: None,
        lessons: vec![],
        progress: ProgressSummary { total_lessons: 5, completed_lessons: 0, completion_percentage: 0 },
    });
    tracker
}

#[test]
fn marking_lessons_one_at_a_time() {
    let course = CourseId::from("c1");
    let mut tracker = five_lesson_course(&course);
    let now = DateTime::from_timestamp(1_714_558_530, 0).unwrap();

    let percentages: Vec<u8> = (1..=5)
        .map(|i| {
            tracker.mark_lesson_complete(&course, &LessonId::new(format!("l{i}")), now);
            tracker.course(&course).unwrap().completion_percentage
        })
        .collect();
    assert_eq!(percentages, [20, 40, 60, 80, 100]);

    tracker.mark_lesson_incomplete(&course, &LessonId::from("l3"));
    assert_eq!(tracker.course(&course).unwrap().completion_percentage, 80);
}

#[test]
fn server_snapshot_replaces_local_marks() {
    let course = CourseId::from("c1");
    let mut tracker = five_lesson_course(&course);
    let now = DateTime::from_timestamp(1_714_558_530, 0).unwrap();
    tracker.mark_lesson_complete(&course, &LessonId::from("l1"), now);
    tracker.mark_lesson_complete(&course, &LessonId::from("l2"), now);

    let done = |id: &str| LessonProgressRecord {
        lesson_id: LessonId::from(id),
        is_completed: true,
        completed_at: Some(now),
        time_spent: 60,
        last_accessed_at: None,
    };
    tracker.apply_course_progress(course.clone(), CourseProgressResponse {
        course_id: Some(course.clone()),
        lessons: vec![done("l4")],
        progress: ProgressSummary { total_lessons: 5, completed_lessons: 1, completion_percentage: 20 },
    });

    let progress = tracker.course(&course).unwrap();
    assert!(!progress.is_completed(&LessonId::from("l1")));
    assert!(!progress.is_completed(&LessonId::from("l2")));
    assert!(progress.is_completed(&LessonId::from("l4")));
    assert_eq!(progress.lessons.len(), 1);
    assert_eq!(progress.completion_percentage, 20);
}
