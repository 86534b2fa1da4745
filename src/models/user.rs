use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Instructor,
    Admin,
}

impl UserRole {
    /// Admins and instructors bypass enrollment checks everywhere.
    pub fn is_staff(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Instructor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    /// Free-form profile fields (first_name, bio, avatar_url, ...).
    pub profile: Map<String, JsonValue>,
    pub enrolled_courses: Vec<Uuid>,
    pub wishlist: Vec<Uuid>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String, role: UserRole) -> Self {
        let mut profile = Map::new();
        profile.insert("first_name".to_string(), json!(""));
        profile.insert("last_name".to_string(), json!(""));
        profile.insert("bio".to_string(), json!(""));
        profile.insert("avatar_url".to_string(), json!(""));
        profile.insert("preferences".to_string(), json!({}));

        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            role,
            created_at: Utc::now(),
            profile,
            enrolled_courses: Vec::new(),
            wishlist: Vec::new(),
        }
    }
}
