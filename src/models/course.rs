use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseAccessType {
    Free,
    Paid,
    Subscription,
}

/// Which parts of a paid course are open without enrollment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewConfig {
    pub free_sections: Vec<Uuid>,
    pub free_subsections: Vec<Uuid>,
    /// Seconds of video available in preview mode. Already stored in
    /// seconds, never minutes.
    pub preview_duration: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub instructor_id: Uuid,
    pub category: String,
    pub level: CourseLevel,
    pub price: f64,
    pub thumbnail_url: String,
    pub preview_video_url: String,
    pub tags: Vec<String>,
    /// Ordered; the course owns its sections.
    pub section_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published: bool,
    pub enrolled_students: Vec<Uuid>,
    pub rating: f64,
    /// Total course length in minutes.
    pub total_duration: u32,
    pub language: String,
    pub prerequisites: Vec<String>,
    pub is_free: bool,
    pub access_type: CourseAccessType,
    pub preview_config: PreviewConfig,
}

impl Course {
    pub fn new(title: String, description: String, instructor_id: Uuid, category: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            instructor_id,
            category,
            level: CourseLevel::Beginner,
            price: 0.0,
            thumbnail_url: String::new(),
            preview_video_url: String::new(),
            tags: Vec::new(),
            section_ids: Vec::new(),
            created_at: now,
            updated_at: now,
            published: false,
            enrolled_students: Vec::new(),
            rating: 0.0,
            total_duration: 0,
            language: "English".to_string(),
            prerequisites: Vec::new(),
            is_free: false,
            access_type: CourseAccessType::Paid,
            preview_config: PreviewConfig::default(),
        }
    }
}
