//! Lesson-management records served through the resolution pipeline.

use serde::{Deserialize, Serialize};

use crate::identity::{InternalIdentity, NamespacedId};
use crate::Timestamp;

/// Profile of the signed-in teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub teacher_id: NamespacedId,
    /// Backend owner of this profile.
    pub owner: InternalIdentity,
    pub display_name: String,
    pub email: String,
    pub instruments: Vec<String>,
    /// Default lesson rate in minor currency units.
    pub hourly_rate_cents: u32,
    pub created_at: Timestamp,
}

/// A student taught by the current teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: NamespacedId,
    pub teacher_id: NamespacedId,
    pub full_name: String,
    pub email: Option<String>,
    pub instrument: String,
    pub active: bool,
}

/// Lifecycle of a scheduled lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    Scheduled,
    Completed,
    Cancelled,
}

/// A single lesson slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_id: NamespacedId,
    pub teacher_id: NamespacedId,
    pub student_id: NamespacedId,
    pub starts_at: Timestamp,
    pub duration_minutes: u16,
    pub status: LessonStatus,
    pub notes: Option<String>,
}

impl Lesson {
    pub fn ends_at(&self) -> Timestamp {
        self.starts_at + chrono::Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// All students of the current teacher.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentRoster(pub Vec<Student>);

impl StudentRoster {
    pub fn active(&self) -> impl Iterator<Item = &Student> {
        self.0.iter().filter(|s| s.active)
    }
}

/// All lessons of the current teacher, in start order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonSchedule(pub Vec<Lesson>);

impl LessonSchedule {
    /// Scheduled lessons starting at or after `now`.
    pub fn upcoming(&self, now: Timestamp) -> impl Iterator<Item = &Lesson> {
        self.0
            .iter()
            .filter(move |l| l.status == LessonStatus::Scheduled && l.starts_at >= now)
    }
}
