use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::course_dto::CourseResponse,
    dto::progress_dto::ProgressResponse,
    dto::user_dto::{
        CourseSummary, UpdateUserPayload, UserCoursesResponse, UserListQuery, UserListResponse,
        UserResponse,
    },
    dto::Pagination,
    error::{Error, JsonBody, Result},
    models::user::{User, UserRole},
    AppState,
};

fn require_self_or_admin(actor: &User, target_id: Uuid) -> Result<()> {
    if actor.id != target_id && actor.role != UserRole::Admin {
        return Err(Error::Forbidden(
            "You can only access your own account".to_string(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("page" = Option<usize>, Query, description = "Page number"),
        ("per_page" = Option<usize>, Query, description = "Items per page"),
        ("role" = Option<String>, Query, description = "Filter by role")
    ),
    responses(
        (status = 200, description = "List of users", body = Json<UserListResponse>),
        (status = 403, description = "Admin role required")
    )
)]
#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse> {
    if actor.role != UserRole::Admin {
        return Err(Error::Forbidden("Admin role required".to_string()));
    }
    let page = state.users.list(&query);
    let pagination = Pagination::from(&page);
    Ok(Json(UserListResponse {
        users: page.items.into_iter().map(UserResponse::from).collect(),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = Json<UserResponse>),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state.users.get(id)?;

    let mut response = UserResponse::from(user.clone());
    // owners and admins also see progress and enrollment details
    if actor.id == user.id || actor.role == UserRole::Admin {
        response.progress = Some(
            state
                .users
                .progress_for(user.id)
                .into_iter()
                .map(ProgressResponse::from)
                .collect(),
        );
        let (enrolled, _) = state.users.courses_for(&user);
        response.enrolled_courses_details = Some(
            enrolled
                .iter()
                .map(|(course, _)| CourseSummary::from(course))
                .collect(),
        );
    }
    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "User updated", body = Json<UserResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Not the account owner"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateUserPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    require_self_or_admin(&actor, id)?;
    if payload.role.is_some() && actor.role != UserRole::Admin {
        return Err(Error::Forbidden(
            "Only admins can change user roles".to_string(),
        ));
    }
    let user = state.users.update(id, payload)?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Not the account owner"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require_self_or_admin(&actor, id)?;
    state.users.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/courses",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Enrolled and wishlisted courses", body = Json<UserCoursesResponse>),
        (status = 403, description = "Not the account owner"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn user_courses(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require_self_or_admin(&actor, id)?;
    let user = state.users.get(id)?;
    let (enrolled, wishlist) = state.users.courses_for(&user);

    let enrolled_courses = enrolled
        .into_iter()
        .map(|(course, progress)| {
            let tree = state.courses.section_tree(&course);
            let mut response = CourseResponse::from_parts(
                course,
                tree.into_iter()
                    .map(|(section, subsections)| {
                        crate::dto::course_dto::SectionResponse::from_parts(section, subsections)
                    })
                    .collect(),
            );
            response.progress = progress.map(ProgressResponse::from);
            response
        })
        .collect();
    let wishlist_courses = wishlist
        .into_iter()
        .map(|course| CourseResponse::from_parts(course, Vec::new()))
        .collect();

    Ok(Json(UserCoursesResponse {
        enrolled_courses,
        wishlist_courses,
    }))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/wishlist/{course_id}",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("course_id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course added to wishlist", body = Json<UserResponse>),
        (status = 404, description = "User or course not found"),
        (status = 409, description = "Course already in wishlist")
    )
)]
#[axum::debug_handler]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path((id, course_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    require_self_or_admin(&actor, id)?;
    let user = state.users.add_to_wishlist(id, course_id)?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/wishlist/{course_id}",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("course_id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course removed from wishlist", body = Json<UserResponse>),
        (status = 404, description = "User not found"),
        (status = 409, description = "Course not in wishlist")
    )
)]
#[axum::debug_handler]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path((id, course_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    require_self_or_admin(&actor, id)?;
    let user = state.users.remove_from_wishlist(id, course_id)?;
    Ok(Json(UserResponse::from(user)))
}
