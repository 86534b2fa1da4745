use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user may review the same course more than once; no uniqueness
/// constraint exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    /// 1-5 stars.
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(user_id: Uuid, course_id: Uuid, rating: u8, comment: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            rating,
            comment,
            created_at: Utc::now(),
        }
    }
}
