pub mod access_service;
pub mod auth_service;
pub mod course_service;
pub mod progress_service;
pub mod stats_service;
pub mod user_service;
