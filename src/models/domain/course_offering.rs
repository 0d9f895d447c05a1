use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferingStatus {
    Draft,
    Active,
    Finished,
}

impl OfferingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferingStatus::Draft => "draft",
            OfferingStatus::Active => "active",
            OfferingStatus::Finished => "finished",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CourseOffering {
    pub id: String,
    pub template_id: String,
    pub class_name: String,
    pub term: String,
    pub instructor_id: Option<String>,
    pub status: OfferingStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl CourseOffering {
    pub fn new_draft(template_id: &str, class_name: &str, term: &str, instructor_id: &str) -> Self {
        CourseOffering {
            id: Uuid::new_v4().to_string(),
            template_id: template_id.to_string(),
            class_name: class_name.to_string(),
            term: term.to_string(),
            instructor_id: Some(instructor_id.to_string()),
            status: OfferingStatus::Draft,
            start_date: None,
            end_date: None,
            notes: None,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn is_taught_by(&self, user_id: &str) -> bool {
        self.instructor_id.as_deref() == Some(user_id)
    }
}
