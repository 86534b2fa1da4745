use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;
use validator::Validate;

use crate::dto::course_dto::CourseResponse;
use crate::dto::progress_dto::ProgressResponse;
use crate::dto::Pagination;
use crate::models::course::Course;
use crate::models::user::{User, UserRole};

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub profile: Map<String, JsonValue>,
    pub enrolled_courses: Vec<Uuid>,
    pub wishlist: Vec<Uuid>,
    /// Only present on the owner's (or an admin's) view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Vec<ProgressResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrolled_courses_details: Option<Vec<CourseSummary>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            profile: user.profile,
            enrolled_courses: user.enrolled_courses,
            wishlist: user.wishlist,
            progress: None,
            enrolled_courses_details: None,
        }
    }
}

/// Compact course block embedded in user and progress views.
#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub thumbnail_url: String,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id,
            title: course.title.clone(),
            category: course.category.clone(),
            thumbnail_url: course.thumbnail_url.clone(),
        }
    }
}

/// Unknown fields are rejected, not silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserPayload {
    #[validate(length(min = 3))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub profile: Option<Map<String, JsonValue>>,
    /// Admin-only; rejected with 403 for everyone else.
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UserListQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserCoursesResponse {
    pub enrolled_courses: Vec<CourseResponse>,
    pub wishlist_courses: Vec<CourseResponse>,
}
