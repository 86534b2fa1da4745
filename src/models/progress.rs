use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub score: u32,
    pub answers: JsonValue,
    pub timestamp: DateTime<Utc>,
    pub passed: bool,
}

/// One record per (user, course) pair, created at enrollment and never
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    /// Duplicate-free, insertion-ordered.
    pub completed_sections: Vec<Uuid>,
    pub completed_subsections: Vec<Uuid>,
    pub quiz_attempts: HashMap<Uuid, Vec<QuizAttempt>>,
    pub current_section_id: Option<Uuid>,
    pub current_subsection_id: Option<Uuid>,
    /// Derived from completed_subsections against the live course structure.
    pub progress_percentage: f64,
    /// Minutes.
    pub total_time_spent: u64,
    pub started_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    /// Set exactly once, when the percentage first reaches 100. Never
    /// cleared afterwards.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Progress {
    pub fn new(user_id: Uuid, course_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            completed_sections: Vec::new(),
            completed_subsections: Vec::new(),
            quiz_attempts: HashMap::new(),
            current_section_id: None,
            current_subsection_id: None,
            progress_percentage: 0.0,
            total_time_spent: 0,
            started_at: now,
            last_accessed: now,
            completed_at: None,
        }
    }
}
