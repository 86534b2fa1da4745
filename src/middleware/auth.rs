use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::models::user::User;
use crate::AppState;

/// Resolved viewer for routes that serve both visitors and signed-in users.
/// `None` covers missing, malformed and expired tokens alike.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

fn bearer_token(req: &Request) -> Option<String> {
    let header = req.headers().get(axum::http::header::AUTHORIZATION)?;
    let value = header.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::to_string)
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&req) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Authentication required"})),
        )
            .into_response();
    };
    match state.auth.resolve_token(&token) {
        Some(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid or expired session"})),
        )
            .into_response(),
    }
}

pub async fn require_staff(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&req) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Authentication required"})),
        )
            .into_response();
    };
    match state.auth.resolve_token(&token) {
        Some(user) if user.role.is_staff() => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Some(_) => (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Instructor or admin role required"})),
        )
            .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid or expired session"})),
        )
            .into_response(),
    }
}

/// Never rejects; a bad token just means an anonymous viewer.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let user = bearer_token(&req).and_then(|token| state.auth.resolve_token(&token));
    req.extensions_mut().insert(MaybeUser(user));
    next.run(req).await
}
