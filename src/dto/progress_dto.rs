use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::dto::user_dto::CourseSummary;
use crate::models::progress::{Progress, QuizAttempt};

#[derive(Debug, Clone, Serialize)]
pub struct ProgressResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub completed_sections: Vec<Uuid>,
    pub completed_subsections: Vec<Uuid>,
    pub quiz_attempts: HashMap<Uuid, Vec<QuizAttempt>>,
    pub current_section_id: Option<Uuid>,
    pub current_subsection_id: Option<Uuid>,
    pub progress_percentage: f64,
    pub total_time_spent: u64,
    pub started_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    /// Serialized as null until the course is completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Live denominator at the time of the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_subsections: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<CourseSummary>,
}

impl From<Progress> for ProgressResponse {
    fn from(value: Progress) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            course_id: value.course_id,
            completed_sections: value.completed_sections,
            completed_subsections: value.completed_subsections,
            quiz_attempts: value.quiz_attempts,
            current_section_id: value.current_section_id,
            current_subsection_id: value.current_subsection_id,
            progress_percentage: value.progress_percentage,
            total_time_spent: value.total_time_spent,
            started_at: value.started_at,
            last_accessed: value.last_accessed,
            completed_at: value.completed_at,
            total_subsections: None,
            course: None,
        }
    }
}

/// Full replacement of the tracked fields. Unknown fields are rejected.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateProgressPayload {
    pub completed_sections: Option<Vec<Uuid>>,
    pub completed_subsections: Option<Vec<Uuid>>,
    pub current_section_id: Option<Uuid>,
    pub current_subsection_id: Option<Uuid>,
    /// Minutes.
    pub total_time_spent: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizAttemptPayload {
    #[validate(range(max = 100))]
    pub score: u32,
    pub answers: JsonValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizAttemptResponse {
    pub attempt: QuizAttempt,
    pub progress: ProgressResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressListResponse {
    pub progress: Vec<ProgressResponse>,
}
