use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Free,
    Paid,
    Preview,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub order: u32,
    /// Ordered; the section owns its subsections.
    pub subsection_ids: Vec<Uuid>,
    pub materials: Vec<JsonValue>,
    pub quiz_id: Option<Uuid>,
    pub access_level: AccessLevel,
    pub is_preview: bool,
    /// Seconds, overrides the course-level preview window when set.
    pub preview_duration: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl Section {
    pub fn new(title: String, description: String, course_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id,
            title,
            description,
            order: 0,
            subsection_ids: Vec::new(),
            materials: Vec::new(),
            quiz_id: None,
            access_level: AccessLevel::Paid,
            is_preview: false,
            preview_duration: None,
            created_at: Utc::now(),
        }
    }
}
