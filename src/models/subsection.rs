use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::models::section::AccessLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Text,
    Pdf,
    Quiz,
    Assignment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subsection {
    pub id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub content_type: ContentType,
    pub order: u32,
    /// Opaque content payload, shape depends on content_type.
    pub content: JsonValue,
    /// Minutes.
    pub duration: u32,
    pub access_level: AccessLevel,
    pub is_preview: bool,
    /// Seconds of preview playback; overrides the course default.
    pub preview_duration: Option<u32>,
    pub video_url: String,
    pub preview_video_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Subsection {
    pub fn new(title: String, content_type: ContentType, section_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            section_id,
            title,
            content_type,
            order: 0,
            content: json!({}),
            duration: 0,
            access_level: AccessLevel::Paid,
            is_preview: false,
            preview_duration: None,
            video_url: String::new(),
            preview_video_url: None,
            created_at: Utc::now(),
        }
    }
}
