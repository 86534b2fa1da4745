use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// Browser clients send the bearer token themselves, so any origin is fine;
/// the verb and header lists mirror what the API actually serves.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(Any)
}
