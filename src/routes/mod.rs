pub mod access;
pub mod auth;
pub mod courses;
pub mod health;
pub mod progress;
pub mod users;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use crate::config::get_config;
use crate::middleware::auth::{optional_auth, require_auth, require_staff};
use crate::middleware::rate_limit::{rps_middleware, RateLimiter};
use crate::AppState;

/// The full API surface. Routes are grouped by the auth layer they sit
/// behind; merged method routers let the same path carry a public GET and a
/// protected POST. Anonymous-reachable groups sit behind the RPS limiter;
/// token-holding callers are not throttled.
pub fn api_router(state: AppState) -> Router {
    let limiter = RateLimiter::new(get_config().public_rps);

    let public = Router::new()
        .route("/api/health", get(health::health))
        .route("/api/categories", get(courses::list_categories))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .layer(from_fn_with_state(limiter.clone(), rps_middleware));

    // readable by anyone; a valid token upgrades what the viewer sees
    let catalog = Router::new()
        .route("/api/courses", get(courses::list_courses))
        .route("/api/courses/:id", get(courses::get_course))
        .route("/api/courses/:id/sections", get(courses::list_sections))
        .route("/api/courses/:id/reviews", get(courses::list_reviews))
        .route(
            "/api/courses/:id/statistics",
            get(courses::course_statistics),
        )
        .route("/api/courses/:id/access", get(access::course_access))
        .route(
            "/api/courses/:id/subsections/:subsection_id/access",
            get(access::subsection_access),
        )
        .route("/api/subsections/:id/video", get(access::video_stream))
        .route("/api/quizzes/:id", get(courses::get_quiz))
        .layer(from_fn_with_state(state.clone(), optional_auth))
        .layer(from_fn_with_state(limiter, rps_middleware));

    let authed = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/users", get(users::list_users))
        .route(
            "/api/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/api/users/:id/courses", get(users::user_courses))
        .route(
            "/api/users/:id/wishlist/:course_id",
            post(users::add_to_wishlist).delete(users::remove_from_wishlist),
        )
        .route(
            "/api/courses/:id/enroll",
            post(courses::enroll).delete(courses::unenroll),
        )
        .route("/api/courses/:id/reviews", post(courses::create_review))
        .route("/api/courses/:id/progress", get(courses::course_progress))
        .route("/api/progress", get(progress::my_progress))
        .route(
            "/api/progress/:course_id",
            get(progress::get_progress).put(progress::update_progress),
        )
        .route(
            "/api/progress/:course_id/sections/:section_id/complete",
            post(progress::complete_section),
        )
        .route(
            "/api/progress/:course_id/subsections/:subsection_id/complete",
            post(progress::complete_subsection),
        )
        .route(
            "/api/progress/:course_id/quizzes/:quiz_id/attempt",
            post(progress::submit_quiz_attempt),
        )
        .layer(from_fn_with_state(state.clone(), require_auth));

    let staff = Router::new()
        .route("/api/courses", post(courses::create_course))
        .route(
            "/api/courses/:id",
            put(courses::update_course).delete(courses::delete_course),
        )
        .route("/api/courses/:id/sections", post(courses::create_section))
        .route(
            "/api/sections/:id/subsections",
            post(courses::create_subsection),
        )
        .route("/api/sections/:id/quiz", post(courses::create_quiz))
        .layer(from_fn_with_state(state.clone(), require_staff));

    public
        .merge(catalog)
        .merge(authed)
        .merge(staff)
        .with_state(state)
}
