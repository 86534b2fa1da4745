pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use crate::services::{
    access_service::AccessService, auth_service::AuthService, course_service::CourseService,
    progress_service::ProgressService, stats_service::StatsService, user_service::UserService,
};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub auth: AuthService,
    pub users: UserService,
    pub courses: CourseService,
    pub progress: ProgressService,
    pub access: AccessService,
    pub stats: StatsService,
}

impl AppState {
    pub fn new() -> Self {
        let config = crate::config::get_config();
        let store = Arc::new(Store::new());

        let auth = AuthService::new(store.clone(), config.session_ttl_hours);
        let users = UserService::new(store.clone());
        let courses = CourseService::new(store.clone());
        let progress = ProgressService::new(store.clone());
        let access = AccessService::new(store.clone(), config.default_preview_duration);
        let stats = StatsService::new(store.clone());

        Self {
            store,
            auth,
            users,
            courses,
            progress,
            access,
            stats,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
