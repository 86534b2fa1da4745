use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{error::Result, middleware::auth::MaybeUser, AppState};

#[utoipa::path(
    get,
    path = "/api/courses/{id}/access",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Resolved access for the caller"),
        (status = 404, description = "Course not found")
    )
)]
#[axum::debug_handler]
pub async fn course_access(
    State(state): State<AppState>,
    Extension(MaybeUser(viewer)): Extension<MaybeUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let access = state.access.course_access(viewer.as_ref(), id)?;
    Ok(Json(access))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/subsections/{subsection_id}/access",
    params(
        ("course_id" = Uuid, Path, description = "Course ID"),
        ("subsection_id" = Uuid, Path, description = "Subsection ID")
    ),
    responses(
        (status = 200, description = "Subsection content, possibly stripped for locked viewers"),
        (status = 404, description = "Course or subsection not found")
    )
)]
#[axum::debug_handler]
pub async fn subsection_access(
    State(state): State<AppState>,
    Extension(MaybeUser(viewer)): Extension<MaybeUser>,
    Path((course_id, subsection_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let access = state
        .access
        .subsection_access(viewer.as_ref(), course_id, subsection_id)?;
    Ok(Json(access))
}

#[utoipa::path(
    get,
    path = "/api/subsections/{id}/video",
    params(("id" = Uuid, Path, description = "Subsection ID")),
    responses(
        (status = 200, description = "Stream grant with the playable URL and duration"),
        (status = 403, description = "Locked content"),
        (status = 404, description = "Subsection not found")
    )
)]
#[axum::debug_handler]
pub async fn video_stream(
    State(state): State<AppState>,
    Extension(MaybeUser(viewer)): Extension<MaybeUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let stream = state.access.video_stream(viewer.as_ref(), id)?;
    Ok(Json(stream))
}
