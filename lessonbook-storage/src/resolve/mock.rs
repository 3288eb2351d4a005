//! Deterministic mock datasets.
//!
//! Served in augmented mode when neither the live source nor the cache has a
//! value. Every call builds the same records: sequence ids, fixed instants,
//! the development identity as owner.

use chrono::{DateTime, Duration, Utc};
use lessonbook_core::{
    IdCategory, Lesson, LessonSchedule, LessonStatus, NamespacedId, Student, StudentRoster,
    TeacherProfile, DEV_IDENTITY,
};

/// 2024-09-02T00:00:00Z, a Monday.
const SCHEDULE_ANCHOR_SECS: i64 = 1_725_235_200;

fn instant(secs_from_anchor: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(SCHEDULE_ANCHOR_SECS + secs_from_anchor)
}

fn teacher_id() -> NamespacedId {
    NamespacedId::sequence(IdCategory::Teacher, 1)
}

pub fn teacher_profile() -> TeacherProfile {
    TeacherProfile {
        teacher_id: teacher_id(),
        owner: DEV_IDENTITY,
        display_name: "Demo Teacher".to_string(),
        email: "demo.teacher@example.com".to_string(),
        instruments: vec!["piano".to_string(), "violin".to_string()],
        hourly_rate_cents: 5_500,
        created_at: instant(-30 * 86_400),
    }
}

const STUDENTS: [(&str, &str, bool); 3] = [
    ("Amara Okafor", "piano", true),
    ("Jonas Lindqvist", "violin", true),
    ("Mei Tanaka", "piano", false),
];

pub fn student_roster() -> StudentRoster {
    StudentRoster(
        STUDENTS
            .iter()
            .zip(1u64..)
            .map(|((name, instrument, active), n)| Student {
                student_id: NamespacedId::sequence(IdCategory::Student, n),
                teacher_id: teacher_id(),
                full_name: name.to_string(),
                email: None,
                instrument: instrument.to_string(),
                active: *active,
            })
            .collect(),
    )
}

/// (student sequence, offset from anchor in hours, minutes, status)
const LESSONS: [(u64, i64, u16, LessonStatus); 4] = [
    (1, 15, 45, LessonStatus::Completed),
    (2, 17, 60, LessonStatus::Scheduled),
    (1, 24 + 15, 45, LessonStatus::Scheduled),
    (3, 2 * 24 + 16, 30, LessonStatus::Cancelled),
];

pub fn lesson_schedule() -> LessonSchedule {
    LessonSchedule(
        LESSONS
            .iter()
            .zip(1u64..)
            .map(|(&(student, hours, minutes, status), n)| Lesson {
                lesson_id: NamespacedId::sequence(IdCategory::Lesson, n),
                teacher_id: teacher_id(),
                student_id: NamespacedId::sequence(IdCategory::Student, student),
                starts_at: instant(hours * 3_600),
                duration_minutes: minutes,
                status,
                notes: None,
            })
            .collect(),
    )
}
