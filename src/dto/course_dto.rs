use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;
use validator::Validate;

use crate::dto::progress_dto::ProgressResponse;
use crate::dto::Pagination;
use crate::models::course::{Course, CourseAccessType, CourseLevel, PreviewConfig};
use crate::models::quiz::Quiz;
use crate::models::review::Review;
use crate::models::section::{AccessLevel, Section};
use crate::models::subsection::{ContentType, Subsection};
use crate::services::stats_service::CourseStatistics;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCoursePayload {
    #[validate(length(min = 3))]
    pub title: String,
    #[validate(length(min = 10))]
    pub description: String,
    #[validate(length(min = 1))]
    pub category: String,
    pub level: Option<CourseLevel>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub preview_video_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub language: Option<String>,
    pub prerequisites: Option<Vec<String>>,
    pub is_free: Option<bool>,
    pub access_type: Option<CourseAccessType>,
    pub preview_config: Option<PreviewConfig>,
}

/// Unknown fields are rejected, not silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateCoursePayload {
    #[validate(length(min = 3))]
    pub title: Option<String>,
    #[validate(length(min = 10))]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub preview_video_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub language: Option<String>,
    pub prerequisites: Option<Vec<String>>,
    pub published: Option<bool>,
    pub is_free: Option<bool>,
    pub access_type: Option<CourseAccessType>,
    pub preview_config: Option<PreviewConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CourseListQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub search: Option<String>,
    /// Defaults to true: unpublished courses are hidden unless asked for.
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubsectionResponse {
    pub id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub content_type: ContentType,
    pub order: u32,
    pub content: JsonValue,
    pub duration: u32,
    pub access_level: AccessLevel,
    pub is_preview: bool,
    pub preview_duration: Option<u32>,
    pub video_url: String,
    pub preview_video_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Subsection> for SubsectionResponse {
    fn from(value: Subsection) -> Self {
        Self {
            id: value.id,
            section_id: value.section_id,
            title: value.title,
            content_type: value.content_type,
            order: value.order,
            content: value.content,
            duration: value.duration,
            access_level: value.access_level,
            is_preview: value.is_preview,
            preview_duration: value.preview_duration,
            video_url: value.video_url,
            preview_video_url: value.preview_video_url,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionResponse {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub order: u32,
    pub subsections: Vec<SubsectionResponse>,
    pub materials: Vec<JsonValue>,
    pub quiz_id: Option<Uuid>,
    pub access_level: AccessLevel,
    pub is_preview: bool,
    pub preview_duration: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl SectionResponse {
    pub fn from_parts(section: Section, subsections: Vec<Subsection>) -> Self {
        Self {
            id: section.id,
            course_id: section.course_id,
            title: section.title,
            description: section.description,
            order: section.order,
            subsections: subsections.into_iter().map(Into::into).collect(),
            materials: section.materials,
            quiz_id: section.quiz_id,
            access_level: section.access_level,
            is_preview: section.is_preview,
            preview_duration: section.preview_duration,
            created_at: section.created_at,
        }
    }
}

/// Canonical external form of a course. The enrolled-student list is
/// projected to a count, never exposed as IDs.
#[derive(Debug, Clone, Serialize)]
pub struct CourseResponse {
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
    pub sections: Vec<SectionResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published: bool,
    pub enrolled_students: usize,
    pub rating: f64,
    pub total_duration: u32,
    pub language: String,
    pub prerequisites: Vec<String>,
    pub is_free: bool,
    pub access_type: CourseAccessType,
    pub preview_config: PreviewConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<CourseStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<ReviewResponse>>,
    /// The requesting user's own progress, when relevant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressResponse>,
}

impl CourseResponse {
    pub fn from_parts(course: Course, sections: Vec<SectionResponse>) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            instructor_id: course.instructor_id,
            category: course.category,
            level: course.level,
            price: course.price,
            thumbnail_url: course.thumbnail_url,
            preview_video_url: course.preview_video_url,
            tags: course.tags,
            sections,
            created_at: course.created_at,
            updated_at: course.updated_at,
            published: course.published,
            enrolled_students: course.enrolled_students.len(),
            rating: course.rating,
            total_duration: course.total_duration,
            language: course.language,
            prerequisites: course.prerequisites,
            is_free: course.is_free,
            access_type: course.access_type,
            preview_config: course.preview_config,
            statistics: None,
            reviews: None,
            progress: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseListResponse {
    pub courses: Vec<CourseResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSectionPayload {
    #[validate(length(min = 3))]
    pub title: String,
    pub description: Option<String>,
    pub order: Option<u32>,
    pub access_level: Option<AccessLevel>,
    pub is_preview: Option<bool>,
    pub preview_duration: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSubsectionPayload {
    #[validate(length(min = 1))]
    pub title: String,
    pub content_type: ContentType,
    pub order: Option<u32>,
    pub content: Option<JsonValue>,
    /// Minutes.
    pub duration: Option<u32>,
    pub access_level: Option<AccessLevel>,
    pub is_preview: Option<bool>,
    /// Seconds.
    pub preview_duration: Option<u32>,
    pub video_url: Option<String>,
    pub preview_video_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuizPayload {
    #[validate(length(min = 1))]
    pub title: String,
    pub questions: Option<Vec<JsonValue>>,
    #[validate(range(max = 100))]
    pub passing_score: Option<u32>,
    #[validate(range(min = 1))]
    pub time_limit: Option<u32>,
    pub attempts_allowed: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizResponse {
    pub id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub questions: Vec<JsonValue>,
    pub passing_score: u32,
    pub time_limit: u32,
    pub attempts_allowed: u32,
    pub created_at: DateTime<Utc>,
}

impl From<Quiz> for QuizResponse {
    fn from(value: Quiz) -> Self {
        Self {
            id: value.id,
            section_id: value.section_id,
            title: value.title,
            questions: value.questions,
            passing_score: value.passing_score,
            time_limit: value.time_limit,
            attempts_allowed: value.attempts_allowed,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReviewPayload {
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[validate(length(min = 1))]
    pub comment: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewerInfo {
    pub username: String,
    pub profile: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<ReviewerInfo>,
}

impl From<Review> for ReviewResponse {
    fn from(value: Review) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            course_id: value.course_id,
            rating: value.rating,
            comment: value.comment,
            created_at: value.created_at,
            reviewer: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionListResponse {
    pub sections: Vec<SectionResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<ReviewResponse>,
}
