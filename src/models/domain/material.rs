use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    File,
    Link,
}

impl MaterialKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "file" => Some(MaterialKind::File),
            "link" => Some(MaterialKind::Link),
            _ => None,
        }
    }
}

/// Reading material attached to a section. A file material keeps `file_path`, a link keeps `url`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Material {
    pub id: String,
    pub section_id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: MaterialKind,
    pub file_path: Option<String>,
    pub url: Option<String>,
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Material {
    pub fn new(section_id: &str, title: &str, kind: MaterialKind) -> Self {
        let now = Utc::now();
        Material {
            id: Uuid::new_v4().to_string(),
            section_id: section_id.to_string(),
            title: title.to_string(),
            description: None,
            kind,
            file_path: None,
            url: None,
            subject: None,
            created_at: Some(now),
            modified_at: Some(now),
        }
    }
}
