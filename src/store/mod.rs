//! In-memory entity store. All mutations go through the single write lock;
//! reads share the read lock. There is no snapshot isolation: a reader that
//! acquires the lock after a writer sees the new state, and compound
//! operations that must not interleave (enrollment, progress recomputation)
//! run inside one `write()` guard scope.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::models::{
    course::{Course, CourseAccessType, CourseLevel, PreviewConfig},
    progress::Progress,
    quiz::Quiz,
    review::Review,
    section::Section,
    session::Session,
    subsection::Subsection,
    user::{User, UserRole},
};

/// Field-level user update; absent fields keep their current value.
/// Unknown fields never reach this type: the payload layer rejects them.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub profile: Option<Map<String, JsonValue>>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Default)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub price: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub preview_video_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub language: Option<String>,
    pub prerequisites: Option<Vec<String>>,
    pub published: Option<bool>,
    pub is_free: Option<bool>,
    pub access_type: Option<CourseAccessType>,
    pub preview_config: Option<PreviewConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub instructor_id: Option<Uuid>,
    pub published: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Default)]
pub struct StoreInner {
    pub users: HashMap<Uuid, User>,
    pub courses: HashMap<Uuid, Course>,
    pub sections: HashMap<Uuid, Section>,
    pub subsections: HashMap<Uuid, Subsection>,
    pub quizzes: HashMap<Uuid, Quiz>,
    pub progress: HashMap<Uuid, Progress>,
    pub reviews: HashMap<Uuid, Review>,
    /// token -> session
    pub sessions: HashMap<String, Session>,
}

impl StoreInner {
    pub fn find_progress(&self, user_id: Uuid, course_id: Uuid) -> Option<&Progress> {
        self.progress
            .values()
            .find(|p| p.user_id == user_id && p.course_id == course_id)
    }

    pub fn find_progress_mut(&mut self, user_id: Uuid, course_id: Uuid) -> Option<&mut Progress> {
        self.progress
            .values_mut()
            .find(|p| p.user_id == user_id && p.course_id == course_id)
    }

    /// Denominator for progress percentages: the course's *current*
    /// structure, not a snapshot taken at enrollment.
    pub fn total_subsections(&self, course: &Course) -> usize {
        course
            .section_ids
            .iter()
            .filter_map(|id| self.sections.get(id))
            .map(|s| s.subsection_ids.len())
            .sum()
    }
}

#[derive(Debug, Default)]
pub struct Store {
    inner: RwLock<StoreInner>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared read access. Poisoned locks are recovered: a panicking writer
    /// must not wedge every subsequent request.
    pub fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Exclusive write access; one writer process-wide at a time.
    pub fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    // ----- users -----

    pub fn create_user(&self, user: User) -> User {
        let mut inner = self.write();
        inner.users.insert(user.id, user.clone());
        user
    }

    pub fn get_user(&self, user_id: Uuid) -> Option<User> {
        self.read().users.get(&user_id).cloned()
    }

    pub fn get_user_by_email(&self, email: &str) -> Option<User> {
        self.read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    pub fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
    }

    pub fn get_users(&self) -> Vec<User> {
        self.read().users.values().cloned().collect()
    }

    pub fn update_user(&self, user_id: Uuid, updates: UserUpdate) -> Option<User> {
        let mut inner = self.write();
        let user = inner.users.get_mut(&user_id)?;
        if let Some(username) = updates.username {
            user.username = username;
        }
        if let Some(email) = updates.email {
            user.email = email;
        }
        if let Some(profile) = updates.profile {
            user.profile = profile;
        }
        if let Some(role) = updates.role {
            user.role = role;
        }
        Some(user.clone())
    }

    pub fn delete_user(&self, user_id: Uuid) -> bool {
        self.write().users.remove(&user_id).is_some()
    }

    // ----- courses -----

    pub fn create_course(&self, course: Course) -> Course {
        let mut inner = self.write();
        inner.courses.insert(course.id, course.clone());
        course
    }

    pub fn get_course(&self, course_id: Uuid) -> Option<Course> {
        self.read().courses.get(&course_id).cloned()
    }

    pub fn get_courses(&self, filter: &CourseFilter) -> Vec<Course> {
        let inner = self.read();
        inner
            .courses
            .values()
            .filter(|c| {
                filter
                    .category
                    .as_ref()
                    .is_none_or(|category| &c.category == category)
            })
            .filter(|c| filter.level.is_none_or(|level| c.level == level))
            .filter(|c| filter.instructor_id.is_none_or(|id| c.instructor_id == id))
            .filter(|c| filter.published.is_none_or(|p| c.published == p))
            .filter(|c| {
                filter.search.as_ref().is_none_or(|term| {
                    let term = term.to_lowercase();
                    c.title.to_lowercase().contains(&term)
                        || c.description.to_lowercase().contains(&term)
                        || c.tags.iter().any(|t| t.to_lowercase().contains(&term))
                })
            })
            .cloned()
            .collect()
    }

    pub fn update_course(&self, course_id: Uuid, updates: CourseUpdate) -> Option<Course> {
        let mut inner = self.write();
        let course = inner.courses.get_mut(&course_id)?;
        if let Some(title) = updates.title {
            course.title = title;
        }
        if let Some(description) = updates.description {
            course.description = description;
        }
        if let Some(category) = updates.category {
            course.category = category;
        }
        if let Some(level) = updates.level {
            course.level = level;
        }
        if let Some(price) = updates.price {
            course.price = price;
        }
        if let Some(thumbnail_url) = updates.thumbnail_url {
            course.thumbnail_url = thumbnail_url;
        }
        if let Some(preview_video_url) = updates.preview_video_url {
            course.preview_video_url = preview_video_url;
        }
        if let Some(tags) = updates.tags {
            course.tags = tags;
        }
        if let Some(language) = updates.language {
            course.language = language;
        }
        if let Some(prerequisites) = updates.prerequisites {
            course.prerequisites = prerequisites;
        }
        if let Some(published) = updates.published {
            course.published = published;
        }
        if let Some(is_free) = updates.is_free {
            course.is_free = is_free;
        }
        if let Some(access_type) = updates.access_type {
            course.access_type = access_type;
        }
        if let Some(preview_config) = updates.preview_config {
            course.preview_config = preview_config;
        }
        course.updated_at = Utc::now();
        Some(course.clone())
    }

    pub fn delete_course(&self, course_id: Uuid) -> bool {
        self.write().courses.remove(&course_id).is_some()
    }

    // ----- sections / subsections / quizzes -----

    /// Inserts the section and attaches it to its course in the same lock
    /// scope, so no reader can observe one without the other.
    pub fn create_section(&self, section: Section) -> Section {
        let mut inner = self.write();
        if let Some(course) = inner.courses.get_mut(&section.course_id) {
            course.section_ids.push(section.id);
        }
        inner.sections.insert(section.id, section.clone());
        section
    }

    pub fn get_section(&self, section_id: Uuid) -> Option<Section> {
        self.read().sections.get(&section_id).cloned()
    }

    pub fn get_sections_by_course(&self, course_id: Uuid) -> Vec<Section> {
        let inner = self.read();
        let Some(course) = inner.courses.get(&course_id) else {
            return Vec::new();
        };
        course
            .section_ids
            .iter()
            .filter_map(|id| inner.sections.get(id))
            .cloned()
            .collect()
    }

    pub fn create_subsection(&self, subsection: Subsection) -> Subsection {
        let mut inner = self.write();
        if let Some(section) = inner.sections.get_mut(&subsection.section_id) {
            section.subsection_ids.push(subsection.id);
        }
        inner.subsections.insert(subsection.id, subsection.clone());
        subsection
    }

    pub fn get_subsection(&self, subsection_id: Uuid) -> Option<Subsection> {
        self.read().subsections.get(&subsection_id).cloned()
    }

    pub fn get_subsections_by_section(&self, section_id: Uuid) -> Vec<Subsection> {
        let inner = self.read();
        let Some(section) = inner.sections.get(&section_id) else {
            return Vec::new();
        };
        section
            .subsection_ids
            .iter()
            .filter_map(|id| inner.subsections.get(id))
            .cloned()
            .collect()
    }

    pub fn create_quiz(&self, quiz: Quiz) -> Quiz {
        let mut inner = self.write();
        if let Some(section) = inner.sections.get_mut(&quiz.section_id) {
            section.quiz_id = Some(quiz.id);
        }
        inner.quizzes.insert(quiz.id, quiz.clone());
        quiz
    }

    pub fn get_quiz(&self, quiz_id: Uuid) -> Option<Quiz> {
        self.read().quizzes.get(&quiz_id).cloned()
    }

    // ----- progress -----

    pub fn create_progress(&self, progress: Progress) -> Progress {
        let mut inner = self.write();
        inner.progress.insert(progress.id, progress.clone());
        progress
    }

    pub fn get_progress(&self, user_id: Uuid, course_id: Uuid) -> Option<Progress> {
        self.read().find_progress(user_id, course_id).cloned()
    }

    pub fn get_user_progress(&self, user_id: Uuid) -> Vec<Progress> {
        self.read()
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn get_course_progress(&self, course_id: Uuid) -> Vec<Progress> {
        self.read()
            .progress
            .values()
            .filter(|p| p.course_id == course_id)
            .cloned()
            .collect()
    }

    // ----- reviews -----

    pub fn create_review(&self, review: Review) -> Review {
        let mut inner = self.write();
        inner.reviews.insert(review.id, review.clone());
        review
    }

    pub fn get_reviews_by_course(&self, course_id: Uuid) -> Vec<Review> {
        self.read()
            .reviews
            .values()
            .filter(|r| r.course_id == course_id)
            .cloned()
            .collect()
    }

    // ----- sessions -----

    pub fn create_session(&self, session: Session) {
        self.write()
            .sessions
            .insert(session.token.clone(), session);
    }

    pub fn get_session(&self, token: &str) -> Option<Session> {
        self.read().sessions.get(token).cloned()
    }

    pub fn delete_session(&self, token: &str) -> bool {
        self.write().sessions.remove(token).is_some()
    }

    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> usize {
        let mut inner = self.write();
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| !s.is_expired(now));
        before - inner.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::subsection::ContentType;
    use crate::models::user::UserRole;

    fn seed_course(store: &Store) -> (Course, Section, Subsection) {
        let instructor = store.create_user(User::new(
            "teacher".into(),
            "teacher@example.com".into(),
            "hash".into(),
            UserRole::Instructor,
        ));
        let course = store.create_course(Course::new(
            "Intro to Fiqh".into(),
            "Foundations of jurisprudence".into(),
            instructor.id,
            "Fiqh & Jurisprudence".into(),
        ));
        let section = store.create_section(Section::new(
            "Week 1".into(),
            "Orientation".into(),
            course.id,
        ));
        let subsection = store.create_subsection(Subsection::new(
            "Welcome".into(),
            ContentType::Video,
            section.id,
        ));
        (store.get_course(course.id).unwrap(), section, subsection)
    }

    #[test]
    fn section_creation_attaches_to_course_atomically() {
        let store = Store::new();
        let (course, section, subsection) = seed_course(&store);
        assert_eq!(course.section_ids, vec![section.id]);
        let section = store.get_section(section.id).unwrap();
        assert_eq!(section.subsection_ids, vec![subsection.id]);
    }

    #[test]
    fn total_subsections_follows_live_structure() {
        let store = Store::new();
        let (course, section, _) = seed_course(&store);
        assert_eq!(store.read().total_subsections(&course), 1);

        store.create_subsection(Subsection::new(
            "Reading".into(),
            ContentType::Text,
            section.id,
        ));
        assert_eq!(store.read().total_subsections(&course), 2);
    }

    #[test]
    fn course_filter_matches_tags_case_insensitively() {
        let store = Store::new();
        let (course, _, _) = seed_course(&store);
        store.update_course(
            course.id,
            CourseUpdate {
                tags: Some(vec!["Usul".into()]),
                published: Some(true),
                ..Default::default()
            },
        );

        let filter = CourseFilter {
            search: Some("usul".into()),
            ..Default::default()
        };
        assert_eq!(store.get_courses(&filter).len(), 1);

        let filter = CourseFilter {
            search: Some("calculus".into()),
            ..Default::default()
        };
        assert!(store.get_courses(&filter).is_empty());
    }

    #[test]
    fn expired_sessions_are_purged() {
        let store = Store::new();
        let user = store.create_user(User::new(
            "s".into(),
            "s@example.com".into(),
            "hash".into(),
            UserRole::Student,
        ));
        store.create_session(Session::new("live".into(), user.id, 24));
        store.create_session(Session::new("dead".into(), user.id, -1));

        let purged = store.purge_expired_sessions(Utc::now());
        assert_eq!(purged, 1);
        assert!(store.get_session("live").is_some());
        assert!(store.get_session("dead").is_none());
    }
}
