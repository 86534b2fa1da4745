use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::course_dto::{
        CourseListQuery, CourseListResponse, CourseResponse, CreateCoursePayload,
        CreateQuizPayload, CreateReviewPayload, CreateSectionPayload, CreateSubsectionPayload,
        QuizResponse, ReviewListResponse, ReviewResponse, ReviewerInfo, SectionListResponse,
        SectionResponse, UpdateCoursePayload,
    },
    dto::progress_dto::ProgressResponse,
    dto::Pagination,
    error::{Error, JsonBody, Result},
    middleware::auth::MaybeUser,
    models::course::Course,
    models::user::{User, UserRole},
    store::CourseFilter,
    AppState,
};

fn require_owner_or_admin(actor: &User, course: &Course) -> Result<()> {
    if course.instructor_id != actor.id && actor.role != UserRole::Admin {
        return Err(Error::Forbidden(
            "Only the course instructor or an admin can modify this course".to_string(),
        ));
    }
    Ok(())
}

fn course_response(state: &AppState, course: Course) -> CourseResponse {
    let tree = state.courses.section_tree(&course);
    CourseResponse::from_parts(
        course,
        tree.into_iter()
            .map(|(section, subsections)| SectionResponse::from_parts(section, subsections))
            .collect(),
    )
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Supported course categories")
    )
)]
#[axum::debug_handler]
pub async fn list_categories() -> impl IntoResponse {
    Json(json!({"categories": crate::config::COURSE_CATEGORIES}))
}

#[utoipa::path(
    get,
    path = "/api/courses",
    params(
        ("page" = Option<usize>, Query, description = "Page number"),
        ("per_page" = Option<usize>, Query, description = "Items per page"),
        ("category" = Option<String>, Query, description = "Filter by category"),
        ("level" = Option<String>, Query, description = "Filter by level"),
        ("search" = Option<String>, Query, description = "Search in title, description and tags"),
        ("published" = Option<bool>, Query, description = "Include unpublished courses")
    ),
    responses(
        (status = 200, description = "Course catalog page", body = Json<CourseListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_courses(
    State(state): State<AppState>,
    Query(query): Query<CourseListQuery>,
) -> Result<impl IntoResponse> {
    let filter = CourseFilter {
        category: query.category,
        level: query.level,
        instructor_id: None,
        published: Some(query.published.unwrap_or(true)),
        search: query
            .search
            .map(|s| crate::utils::validation::sanitize_search_query(&s)),
    };
    let page = state.courses.list(
        &filter,
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(10),
    );
    let pagination = Pagination::from(&page);
    Ok(Json(CourseListResponse {
        courses: page
            .items
            .into_iter()
            .map(|course| course_response(&state, course))
            .collect(),
        pagination,
    }))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCoursePayload,
    responses(
        (status = 201, description = "Course created", body = Json<CourseResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Instructor or admin role required")
    )
)]
#[axum::debug_handler]
pub async fn create_course(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    JsonBody(payload): JsonBody<CreateCoursePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let course = state.courses.create(payload, actor.id)?;
    Ok((StatusCode::CREATED, Json(course_response(&state, course))))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course found", body = Json<CourseResponse>),
        (status = 404, description = "Course not found")
    )
)]
#[axum::debug_handler]
pub async fn get_course(
    State(state): State<AppState>,
    Extension(MaybeUser(viewer)): Extension<MaybeUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let course = state.courses.get(id)?;
    let statistics = state.stats.course_statistics(&course);
    let reviews = state
        .courses
        .reviews(id)?
        .into_iter()
        .map(|(review, reviewer)| {
            let mut review = ReviewResponse::from(review);
            review.reviewer = reviewer.map(|user| ReviewerInfo {
                username: user.username,
                profile: user.profile,
            });
            review
        })
        .collect();
    let progress = viewer
        .as_ref()
        .and_then(|user| state.store.get_progress(user.id, course.id));

    let mut response = course_response(&state, course);
    response.statistics = Some(statistics);
    response.reviews = Some(reviews);
    response.progress = progress.map(ProgressResponse::from);
    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateCoursePayload,
    responses(
        (status = 200, description = "Course updated", body = Json<CourseResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Course not found")
    )
)]
#[axum::debug_handler]
pub async fn update_course(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateCoursePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let course = state.courses.get(id)?;
    require_owner_or_admin(&actor, &course)?;
    let course = state.courses.update(id, payload)?;
    Ok(Json(course_response(&state, course)))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Course not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_course(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let course = state.courses.get(id)?;
    require_owner_or_admin(&actor, &course)?;
    state.courses.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/enroll",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 201, description = "Enrolled", body = Json<ProgressResponse>),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Already enrolled")
    )
)]
#[axum::debug_handler]
pub async fn enroll(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let progress = state.courses.enroll(id, actor.id)?;
    Ok((StatusCode::CREATED, Json(ProgressResponse::from(progress))))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}/enroll",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Unenrolled"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Not enrolled")
    )
)]
#[axum::debug_handler]
pub async fn unenroll(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.courses.unenroll(id, actor.id)?;
    Ok(Json(json!({"message": "Unenrolled successfully"})))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/sections",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Ordered sections with subsections", body = Json<SectionListResponse>),
        (status = 404, description = "Course not found")
    )
)]
#[axum::debug_handler]
pub async fn list_sections(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let course = state.courses.get(id)?;
    let sections = state
        .courses
        .section_tree(&course)
        .into_iter()
        .map(|(section, subsections)| SectionResponse::from_parts(section, subsections))
        .collect();
    Ok(Json(SectionListResponse { sections }))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/sections",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = CreateSectionPayload,
    responses(
        (status = 201, description = "Section created", body = Json<SectionResponse>),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Course not found")
    )
)]
#[axum::debug_handler]
pub async fn create_section(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<CreateSectionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let course = state.courses.get(id)?;
    require_owner_or_admin(&actor, &course)?;
    let section = state.courses.create_section(id, payload)?;
    Ok((
        StatusCode::CREATED,
        Json(SectionResponse::from_parts(section, Vec::new())),
    ))
}

#[utoipa::path(
    post,
    path = "/api/sections/{id}/subsections",
    params(("id" = Uuid, Path, description = "Section ID")),
    request_body = CreateSubsectionPayload,
    responses(
        (status = 201, description = "Subsection created"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Section not found")
    )
)]
#[axum::debug_handler]
pub async fn create_subsection(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<CreateSubsectionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let section = state
        .store
        .get_section(id)
        .ok_or_else(|| Error::NotFound("Section not found".to_string()))?;
    let course = state.courses.get(section.course_id)?;
    require_owner_or_admin(&actor, &course)?;
    let subsection = state.courses.create_subsection(id, payload)?;
    Ok((
        StatusCode::CREATED,
        Json(crate::dto::course_dto::SubsectionResponse::from(subsection)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/sections/{id}/quiz",
    params(("id" = Uuid, Path, description = "Section ID")),
    request_body = CreateQuizPayload,
    responses(
        (status = 201, description = "Quiz created", body = Json<QuizResponse>),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Section not found")
    )
)]
#[axum::debug_handler]
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<CreateQuizPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let section = state
        .store
        .get_section(id)
        .ok_or_else(|| Error::NotFound("Section not found".to_string()))?;
    let course = state.courses.get(section.course_id)?;
    require_owner_or_admin(&actor, &course)?;
    let quiz = state.courses.create_quiz(id, payload)?;
    Ok((StatusCode::CREATED, Json(QuizResponse::from(quiz))))
}

#[utoipa::path(
    get,
    path = "/api/quizzes/{id}",
    params(("id" = Uuid, Path, description = "Quiz ID")),
    responses(
        (status = 200, description = "Quiz found", body = Json<QuizResponse>),
        (status = 404, description = "Quiz not found")
    )
)]
#[axum::debug_handler]
pub async fn get_quiz(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let quiz = state.courses.get_quiz(id)?;
    Ok(Json(QuizResponse::from(quiz)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/reviews",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Reviews, newest first", body = Json<ReviewListResponse>),
        (status = 404, description = "Course not found")
    )
)]
#[axum::debug_handler]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let reviews = state
        .courses
        .reviews(id)?
        .into_iter()
        .map(|(review, reviewer)| {
            let mut response = ReviewResponse::from(review);
            response.reviewer = reviewer.map(|user| ReviewerInfo {
                username: user.username,
                profile: user.profile,
            });
            response
        })
        .collect();
    Ok(Json(ReviewListResponse { reviews }))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/reviews",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = CreateReviewPayload,
    responses(
        (status = 201, description = "Review created", body = Json<ReviewResponse>),
        (status = 403, description = "Not enrolled in this course"),
        (status = 404, description = "Course not found")
    )
)]
#[axum::debug_handler]
pub async fn create_review(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<CreateReviewPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let review = state.courses.create_review(id, actor.id, payload)?;
    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/statistics",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Derived course statistics"),
        (status = 404, description = "Course not found")
    )
)]
#[axum::debug_handler]
pub async fn course_statistics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let course = state.courses.get(id)?;
    Ok(Json(state.stats.course_statistics(&course)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/progress",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Every student's progress in the course"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Course not found")
    )
)]
#[axum::debug_handler]
pub async fn course_progress(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let course = state.courses.get(id)?;
    require_owner_or_admin(&actor, &course)?;
    let progress: Vec<ProgressResponse> = state
        .store
        .get_course_progress(id)
        .into_iter()
        .map(ProgressResponse::from)
        .collect();
    Ok(Json(
        crate::dto::progress_dto::ProgressListResponse { progress },
    ))
}
