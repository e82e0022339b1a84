//! Course progress aggregation.
//!
//! Local marks update a lesson immediately and recompute the course
//! aggregate. A full server snapshot overwrites the local view; a single
//! lesson echo from the server only applies to courses already loaded.
//!
//! # Invariants
//!
//! - `completed_lessons` equals the number of lessons marked completed
//! - `completion_percentage` is `round(100 * completed / total)`, clamped
//!   to 100, and 0 when `total_lessons` is 0

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use studybuddy_proto::{CourseId, CourseProgressResponse, LessonId, LessonProgressRecord};

/// Progress of one lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonProgress {
    /// Whether the lesson is completed.
    pub is_completed: bool,
    /// When the lesson was completed. Cleared when marked incomplete.
    pub completed_at: Option<DateTime<Utc>>,
    /// Seconds spent on the lesson.
    pub time_spent: u64,
    /// When the lesson was last opened.
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl From<LessonProgressRecord> for LessonProgress {
    fn from(record: LessonProgressRecord) -> Self {
        Self {
            is_completed: record.is_completed,
            completed_at: record.completed_at,
            time_spent: record.time_spent,
            last_accessed_at: record.last_accessed_at,
        }
    }
}

/// Progress of one course.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseProgress {
    /// Lessons in the course, as reported by the server.
    pub total_lessons: u32,
    /// Lessons marked completed.
    pub completed_lessons: u32,
    /// Rounded completion percentage (0-100).
    pub completion_percentage: u8,
    /// Per-lesson state.
    pub lessons: HashMap<LessonId, LessonProgress>,
}

impl CourseProgress {
    /// Build from a server snapshot.
    ///
    /// The lesson count comes from the server; the completed count and
    /// percentage are derived from the lesson records so the aggregate
    /// always agrees with the map.
    pub fn from_response(response: CourseProgressResponse) -> Self {
        let reported = response.progress;
        let mut course = Self {
            total_lessons: reported.total_lessons,
            lessons: response
                .lessons
                .into_iter()
                .map(|record| (record.lesson_id.clone(), LessonProgress::from(record)))
                .collect(),
            ..Self::default()
        };
        course.recompute();

        if course.completed_lessons != reported.completed_lessons
            || course.completion_percentage != reported.completion_percentage
        {
            tracing::debug!(
                reported_completed = reported.completed_lessons,
                derived_completed = course.completed_lessons,
                "server aggregate disagrees with lesson records"
            );
        }

        course
    }

    /// Recompute the aggregate from the lesson map.
    pub fn recompute(&mut self) {
        let completed = self.lessons.values().filter(|l| l.is_completed).count();
        self.completed_lessons = u32::try_from(completed).unwrap_or(u32::MAX);
        self.completion_percentage = completion_percentage(self.completed_lessons, self.total_lessons);
    }

    /// Whether `lesson_id` is completed.
    pub fn is_completed(&self, lesson_id: &LessonId) -> bool {
        self.lessons.get(lesson_id).is_some_and(|l| l.is_completed)
    }
}

/// `round(100 * completed / total)` with halves rounded up, clamped to 100.
/// Zero when `total` is zero.
pub fn completion_percentage(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed.min(total));
    let total = u64::from(total);
    let rounded = (200 * completed + total) / (2 * total);
    u8::try_from(rounded.min(100)).unwrap_or(100)
}

/// Progress for every course the user has opened.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    courses: HashMap<CourseId, CourseProgress>,
}

impl ProgressTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress for `course_id`, if known.
    pub fn course(&self, course_id: &CourseId) -> Option<&CourseProgress> {
        self.courses.get(course_id)
    }

    /// Known courses.
    pub fn courses(&self) -> impl Iterator<Item = (&CourseId, &CourseProgress)> {
        self.courses.iter()
    }

    /// Mark a lesson completed at `now`.
    ///
    /// Creates the course and lesson entries on first use.
    pub fn mark_lesson_complete(
        &mut self,
        course_id: &CourseId,
        lesson_id: &LessonId,
        now: DateTime<Utc>,
    ) {
        let course = self.courses.entry(course_id.clone()).or_default();
        let lesson = course.lessons.entry(lesson_id.clone()).or_default();
        lesson.is_completed = true;
        lesson.completed_at = Some(now);
        lesson.last_accessed_at = Some(now);
        course.recompute();

        tracing::debug!(
            course = %course_id,
            lesson = %lesson_id,
            percentage = course.completion_percentage,
            "lesson completed"
        );
    }

    /// Mark a lesson not completed.
    ///
    /// Creates the course and lesson entries on first use.
    pub fn mark_lesson_incomplete(&mut self, course_id: &CourseId, lesson_id: &LessonId) {
        let course = self.courses.entry(course_id.clone()).or_default();
        let lesson = course.lessons.entry(lesson_id.clone()).or_default();
        lesson.is_completed = false;
        lesson.completed_at = None;
        course.recompute();

        tracing::debug!(
            course = %course_id,
            lesson = %lesson_id,
            percentage = course.completion_percentage,
            "lesson reopened"
        );
    }

    /// Replace the local view of `course_id` with a server snapshot.
    pub fn apply_course_progress(&mut self, course_id: CourseId, response: CourseProgressResponse) {
        let course = CourseProgress::from_response(response);
        tracing::debug!(
            course = %course_id,
            total = course.total_lessons,
            completed = course.completed_lessons,
            "course progress loaded"
        );
        self.courses.insert(course_id, course);
    }

    /// Apply a server echo for one lesson.
    ///
    /// Dropped if the course was never loaded or marked locally. Returns
    /// whether the record was applied.
    pub fn apply_lesson_update(&mut self, course_id: &CourseId, record: LessonProgressRecord) -> bool {
        let Some(course) = self.courses.get_mut(course_id) else {
            tracing::warn!(
                course = %course_id,
                lesson = %record.lesson_id,
                "dropping lesson update for unknown course"
            );
            return false;
        };

        course.lessons.insert(record.lesson_id.clone(), LessonProgress::from(record));
        course.recompute();
        true
    }

    /// Mean completion percentage across known courses, rounded. Zero when
    /// no course is known.
    pub fn overall_percentage(&self) -> u8 {
        if self.courses.is_empty() {
            return 0;
        }
        let sum: u32 = self.courses.values().map(|c| u32::from(c.completion_percentage)).sum();
        let count = u32::try_from(self.courses.len()).unwrap_or(u32::MAX);
        completion_percentage(sum, count.saturating_mul(100))
    }
}

#[cfg(test)]
mod tests {
    use studybuddy_proto::ProgressSummary;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_714_558_530, 0).unwrap()
    }

    fn response(total: u32, completed: &[&str], open: &[&str]) -> CourseProgressResponse {
        let record = |id: &&str, done: bool| LessonProgressRecord {
            lesson_id: LessonId::from(*id),
            is_completed: done,
            completed_at: done.then(now),
            time_spent: 0,
            last_accessed_at: None,
        };
        let lessons = completed
            .iter()
            .map(|id| record(id, true))
            .chain(open.iter().map(|id| record(id, false)))
            .collect();
        CourseProgressResponse {
            course_id: None,
            lessons,
            progress: ProgressSummary {
                total_lessons: total,
                completed_lessons: u32::try_from(completed.len()).unwrap(),
                completion_percentage: completion_percentage(
                    u32::try_from(completed.len()).unwrap(),
                    total,
                ),
            },
        }
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(completion_percentage(0, 0), 0);
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 67);
        assert_eq!(completion_percentage(1, 8), 13);
        assert_eq!(completion_percentage(4, 4), 100);
        assert_eq!(completion_percentage(9, 4), 100);
    }

    #[test]
    fn marking_unknown_course_creates_it() {
        let mut tracker = ProgressTracker::new();
        let course = CourseId::from("c1");
        tracker.mark_lesson_complete(&course, &LessonId::from("l1"), now());

        let progress = tracker.course(&course).unwrap();
        assert_eq!(progress.completed_lessons, 1);
        assert_eq!(progress.total_lessons, 0);
        assert_eq!(progress.completion_percentage, 0);
        assert_eq!(progress.lessons[&LessonId::from("l1")].completed_at, Some(now()));
    }

    #[test]
    fn complete_then_incomplete_round_trips_count() {
        let mut tracker = ProgressTracker::new();
        let course = CourseId::from("c1");
        tracker.apply_course_progress(course.clone(), response(4, &["l1"], &["l2"]));

        tracker.mark_lesson_complete(&course, &LessonId::from("l2"), now());
        assert_eq!(tracker.course(&course).unwrap().completed_lessons, 2);
        assert_eq!(tracker.course(&course).unwrap().completion_percentage, 50);

        tracker.mark_lesson_incomplete(&course, &LessonId::from("l2"));
        let progress = tracker.course(&course).unwrap();
        assert_eq!(progress.completed_lessons, 1);
        assert_eq!(progress.completion_percentage, 25);
        assert_eq!(progress.lessons[&LessonId::from("l2")].completed_at, None);
    }

    #[test]
    fn repeated_complete_is_idempotent() {
        let mut tracker = ProgressTracker::new();
        let course = CourseId::from("c1");
        tracker.apply_course_progress(course.clone(), response(2, &[], &["l1"]));

        tracker.mark_lesson_complete(&course, &LessonId::from("l1"), now());
        tracker.mark_lesson_complete(&course, &LessonId::from("l1"), now());

        assert_eq!(tracker.course(&course).unwrap().completed_lessons, 1);
    }

    #[test]
    fn server_snapshot_overwrites_local_marks() {
        let mut tracker = ProgressTracker::new();
        let course = CourseId::from("c1");
        tracker.mark_lesson_complete(&course, &LessonId::from("local"), now());

        tracker.apply_course_progress(course.clone(), response(3, &["l1", "l2"], &[]));

        let progress = tracker.course(&course).unwrap();
        assert!(!progress.lessons.contains_key(&LessonId::from("local")));
        assert_eq!(progress.completed_lessons, 2);
        assert_eq!(progress.completion_percentage, 67);
    }

    #[test]
    fn lesson_update_for_unknown_course_is_dropped() {
        let mut tracker = ProgressTracker::new();
        let record = LessonProgressRecord {
            lesson_id: LessonId::from("l1"),
            is_completed: true,
            completed_at: Some(now()),
            time_spent: 30,
            last_accessed_at: None,
        };

        assert!(!tracker.apply_lesson_update(&CourseId::from("c1"), record));
        assert!(tracker.course(&CourseId::from("c1")).is_none());
    }

    #[test]
    fn lesson_update_for_known_course_applies() {
        let mut tracker = ProgressTracker::new();
        let course = CourseId::from("c1");
        tracker.apply_course_progress(course.clone(), response(2, &[], &["l1"]));

        let record = LessonProgressRecord {
            lesson_id: LessonId::from("l1"),
            is_completed: true,
            completed_at: Some(now()),
            time_spent: 30,
            last_accessed_at: None,
        };
        assert!(tracker.apply_lesson_update(&course, record));

        let progress = tracker.course(&course).unwrap();
        assert_eq!(progress.completed_lessons, 1);
        assert_eq!(progress.lessons[&LessonId::from("l1")].time_spent, 30);
    }

    #[test]
    fn overall_is_mean_of_courses() {
        let mut tracker = ProgressTracker::new();
        assert_eq!(tracker.overall_percentage(), 0);

        tracker.apply_course_progress(CourseId::from("a"), response(2, &["l1"], &[]));
        tracker.apply_course_progress(CourseId::from("b"), response(1, &["l1"], &[]));

        assert_eq!(tracker.overall_percentage(), 75);
    }
}
