use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::quiz_question::QuizQuestion;

pub const DEFAULT_QUIZ_MAX_SCORE: i32 = 100;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: String,
    pub section_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub max_score: Option<i32>,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Quiz {
    pub fn new(section_id: &str, title: &str, questions: Vec<QuizQuestion>) -> Self {
        Quiz {
            id: Uuid::new_v4().to_string(),
            section_id: section_id.to_string(),
            title: title.to_string(),
            description: None,
            start_time: None,
            end_time: None,
            duration_minutes: None,
            max_score: Some(DEFAULT_QUIZ_MAX_SCORE),
            questions,
            created_at: Some(Utc::now()),
        }
    }
}
