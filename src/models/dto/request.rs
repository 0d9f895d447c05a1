use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use validator::Validate;

use crate::models::domain::{OfferingStatus, SubmissionKind, UserRole};

/// Upper bound for a timed quiz: one year.
pub const MAX_QUIZ_DURATION_MINUTES: i64 = 525_600;

/// Keeps an explicit `null` apart from a missing field: missing is `None`, null is `Some(None)`.
fn explicit<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 3, max = 50))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub role: UserRole,

    #[validate(length(min = 1, max = 50))]
    pub student_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCourseOfferingRequest {
    #[validate(length(min = 1))]
    pub template_id: String,

    #[validate(length(min = 1, max = 50))]
    pub class_name: String,

    #[validate(length(min = 1, max = 50))]
    pub term: String,

    #[validate(length(min = 1))]
    pub instructor_id: String,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Partial admin edit. Status is changed through its own endpoint.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCourseOfferingRequest {
    #[validate(length(min = 1))]
    pub template_id: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub class_name: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub term: Option<String>,

    #[validate(length(min = 1))]
    pub instructor_id: Option<String>,

    #[serde(default, deserialize_with = "explicit")]
    pub start_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "explicit")]
    pub end_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "explicit")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferingFilter {
    pub term: Option<String>,
    pub status: Option<OfferingStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOfferingStatusRequest {
    pub status: OfferingStatus,
}

/// Either `student_id` or `identifier` (username or student number) must be present.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddStudentRequest {
    pub student_id: Option<String>,

    #[validate(length(min = 1))]
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GradeSubmissionRequest {
    pub score: i32,

    #[validate(length(max = 5000))]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitQuizAttemptRequest {
    #[serde(default)]
    pub answers: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSectionRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(range(min = 0))]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAssignmentRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[serde(rename = "type")]
    pub kind: SubmissionKind,

    pub description: Option<String>,
    pub instructions: Option<String>,
    pub deadline: Option<DateTime<Utc>>,

    #[validate(range(min = 1))]
    pub max_score: Option<i32>,

    pub allow_late: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,

    #[validate(range(min = 1, max = MAX_QUIZ_DURATION_MINUTES))]
    pub duration_minutes: Option<i64>,

    #[validate(range(min = 1))]
    pub max_score: Option<i32>,

    #[serde(default)]
    pub questions: Vec<Value>,
}

/// Partial section edit. An explicit `"order": null` moves the section after the last one.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSectionRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "explicit")]
    pub order: Option<Option<i32>>,
}

/// Partial assignment edit. Explicit nulls clear optional fields; a null `max_score` or
/// `allow_late` falls back to the default.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAssignmentRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[serde(rename = "type")]
    pub kind: Option<SubmissionKind>,

    #[serde(default, deserialize_with = "explicit")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "explicit")]
    pub instructions: Option<Option<String>>,

    #[serde(default, deserialize_with = "explicit")]
    pub deadline: Option<Option<DateTime<Utc>>>,

    #[serde(default, deserialize_with = "explicit")]
    pub max_score: Option<Option<i32>>,

    #[serde(default, deserialize_with = "explicit")]
    pub allow_late: Option<Option<bool>>,
}

/// Partial quiz edit. `questions`, when present, replaces the whole list.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "explicit")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "explicit")]
    pub start_time: Option<Option<DateTime<Utc>>>,

    #[serde(default, deserialize_with = "explicit")]
    pub end_time: Option<Option<DateTime<Utc>>>,

    #[serde(default, deserialize_with = "explicit")]
    pub duration_minutes: Option<Option<i64>>,

    #[serde(default, deserialize_with = "explicit")]
    pub max_score: Option<Option<i32>>,

    pub questions: Option<Vec<Value>>,
}
