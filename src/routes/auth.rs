use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use validator::Validate;

use crate::{
    dto::auth_dto::{AuthUser, LoginPayload, LoginResponse, RegisterPayload, RegisterResponse},
    dto::user_dto::UserResponse,
    error::{JsonBody, Result},
    models::user::User,
    AppState,
};

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "User registered", body = Json<RegisterResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email or username already taken")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.auth.register(payload)?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: AuthUser::from(user),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Session created", body = Json<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let (token, user) = state.auth.login(payload)?;
    Ok(Json(LoginResponse {
        token,
        user: AuthUser::from(user),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session destroyed"),
        (status = 401, description = "Not authenticated")
    )
)]
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    // the auth layer already validated the token, so it is present here
    if let Some(token) = bearer_token(&headers) {
        state.auth.logout(token);
    }
    Ok(Json(json!({"message": "Logged out successfully"})))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = Json<UserResponse>),
        (status = 401, description = "Not authenticated")
    )
)]
#[axum::debug_handler]
pub async fn me(Extension(user): Extension<User>) -> Result<impl IntoResponse> {
    Ok(Json(UserResponse::from(user)))
}
