use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Dropped,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Dropped => "dropped",
        }
    }
}

/// Membership of one student in one course offering. Rows are reactivated, never duplicated.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Enrollment {
    pub id: String,
    pub course_offering_id: String,
    pub student_id: String,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub dropped_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn new_active(course_offering_id: &str, student_id: &str, now: DateTime<Utc>) -> Self {
        Enrollment {
            id: Uuid::new_v4().to_string(),
            course_offering_id: course_offering_id.to_string(),
            student_id: student_id.to_string(),
            status: EnrollmentStatus::Active,
            enrolled_at: now,
            dropped_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == EnrollmentStatus::Active
    }

    pub fn reactivate(&mut self, now: DateTime<Utc>) {
        self.status = EnrollmentStatus::Active;
        self.enrolled_at = now;
        self.dropped_at = None;
    }

    pub fn drop_out(&mut self, now: DateTime<Utc>) {
        self.status = EnrollmentStatus::Dropped;
        self.dropped_at = Some(now);
    }
}
