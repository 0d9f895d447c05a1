use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// A week/topic inside a course offering. `order` is unique per offering, gaps allowed.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Section {
    pub id: String,
    pub course_offering_id: String,
    pub title: String,
    pub order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Section {
    pub fn new(course_offering_id: &str, title: &str, order: i32) -> Self {
        Section {
            id: Uuid::new_v4().to_string(),
            course_offering_id: course_offering_id.to_string(),
            title: title.to_string(),
            order,
            created_at: Some(Utc::now()),
        }
    }
}
