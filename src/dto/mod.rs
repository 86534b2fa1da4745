pub mod auth_dto;
pub mod course_dto;
pub mod progress_dto;
pub mod user_dto;

use serde::Serialize;

use crate::utils::pagination::Page;

/// Pagination block attached to list responses.
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl<T> From<&Page<T>> for Pagination {
    fn from(page: &Page<T>) -> Self {
        Self {
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            pages: page.pages,
            has_prev: page.has_prev,
            has_next: page.has_next,
        }
    }
}
