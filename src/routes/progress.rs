use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::progress_dto::{
        ProgressListResponse, ProgressResponse, QuizAttemptPayload, QuizAttemptResponse,
        UpdateProgressPayload,
    },
    dto::user_dto::CourseSummary,
    error::{JsonBody, Result},
    models::user::User,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/progress",
    responses(
        (status = 200, description = "All of the caller's progress records", body = Json<ProgressListResponse>),
        (status = 401, description = "Not authenticated")
    )
)]
#[axum::debug_handler]
pub async fn my_progress(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
) -> Result<impl IntoResponse> {
    let progress = state
        .progress
        .list_for_user(actor.id)
        .into_iter()
        .map(|(record, course)| {
            let mut response = ProgressResponse::from(record);
            response.course = course.as_ref().map(CourseSummary::from);
            response
        })
        .collect();
    Ok(Json(ProgressListResponse { progress }))
}

#[utoipa::path(
    get,
    path = "/api/progress/{course_id}",
    params(("course_id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Progress with a freshly recomputed percentage", body = Json<ProgressResponse>),
        (status = 404, description = "Progress not found")
    )
)]
#[axum::debug_handler]
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let (record, total) = state.progress.get(actor.id, course_id)?;
    let mut response = ProgressResponse::from(record);
    response.total_subsections = Some(total);
    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/api/progress/{course_id}",
    params(("course_id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateProgressPayload,
    responses(
        (status = 200, description = "Progress updated", body = Json<ProgressResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Progress not found")
    )
)]
#[axum::debug_handler]
pub async fn update_progress(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(course_id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateProgressPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let record = state.progress.update(actor.id, course_id, payload)?;
    Ok(Json(ProgressResponse::from(record)))
}

#[utoipa::path(
    post,
    path = "/api/progress/{course_id}/sections/{section_id}/complete",
    params(
        ("course_id" = Uuid, Path, description = "Course ID"),
        ("section_id" = Uuid, Path, description = "Section ID")
    ),
    responses(
        (status = 200, description = "Section and its subsections marked complete", body = Json<ProgressResponse>),
        (status = 404, description = "Progress or section not found")
    )
)]
#[axum::debug_handler]
pub async fn complete_section(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path((course_id, section_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let record = state
        .progress
        .mark_section_complete(actor.id, course_id, section_id)?;
    Ok(Json(ProgressResponse::from(record)))
}

#[utoipa::path(
    post,
    path = "/api/progress/{course_id}/subsections/{subsection_id}/complete",
    params(
        ("course_id" = Uuid, Path, description = "Course ID"),
        ("subsection_id" = Uuid, Path, description = "Subsection ID")
    ),
    responses(
        (status = 200, description = "Subsection marked complete", body = Json<ProgressResponse>),
        (status = 404, description = "Progress or subsection not found")
    )
)]
#[axum::debug_handler]
pub async fn complete_subsection(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path((course_id, subsection_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let record = state
        .progress
        .mark_subsection_complete(actor.id, course_id, subsection_id)?;
    Ok(Json(ProgressResponse::from(record)))
}

#[utoipa::path(
    post,
    path = "/api/progress/{course_id}/quizzes/{quiz_id}/attempt",
    params(
        ("course_id" = Uuid, Path, description = "Course ID"),
        ("quiz_id" = Uuid, Path, description = "Quiz ID")
    ),
    request_body = QuizAttemptPayload,
    responses(
        (status = 201, description = "Attempt recorded", body = Json<QuizAttemptResponse>),
        (status = 400, description = "Score out of range"),
        (status = 404, description = "Progress or quiz not found")
    )
)]
#[axum::debug_handler]
pub async fn submit_quiz_attempt(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path((course_id, quiz_id)): Path<(Uuid, Uuid)>,
    JsonBody(payload): JsonBody<QuizAttemptPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let (attempt, record) = state.progress.record_quiz_attempt(
        actor.id,
        course_id,
        quiz_id,
        payload.score,
        payload.answers,
    )?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(QuizAttemptResponse {
            attempt,
            progress: ProgressResponse::from(record),
        }),
    ))
}
