use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    /// Opaque question payloads; the backend never grades them itself.
    pub questions: Vec<JsonValue>,
    /// 0-100.
    pub passing_score: u32,
    /// Minutes.
    pub time_limit: u32,
    /// Declarative only; attempts are never rejected for exceeding it.
    pub attempts_allowed: u32,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    pub fn new(title: String, section_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            section_id,
            title,
            questions: Vec::new(),
            passing_score: 70,
            time_limit: 30,
            attempts_allowed: 3,
            created_at: Utc::now(),
        }
    }
}
