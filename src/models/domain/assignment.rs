use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_MAX_SCORE: i32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    File,
    Link,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Assignment {
    pub id: String,
    pub section_id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: SubmissionKind,
    pub instructions: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub max_score: i32,
    pub allow_late: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn new(section_id: &str, title: &str, kind: SubmissionKind) -> Self {
        Assignment {
            id: Uuid::new_v4().to_string(),
            section_id: section_id.to_string(),
            title: title.to_string(),
            description: None,
            kind,
            instructions: None,
            deadline: None,
            max_score: DEFAULT_MAX_SCORE,
            allow_late: false,
            created_at: Some(Utc::now()),
        }
    }
}
