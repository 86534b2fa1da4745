use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::dto::course_dto::{
    CreateCoursePayload, CreateQuizPayload, CreateReviewPayload, CreateSectionPayload,
    CreateSubsectionPayload, UpdateCoursePayload,
};
use crate::error::{Error, Result};
use crate::models::course::Course;
use crate::models::progress::Progress;
use crate::models::quiz::Quiz;
use crate::models::review::Review;
use crate::models::section::Section;
use crate::models::subsection::Subsection;
use crate::models::user::User;
use crate::store::{CourseFilter, CourseUpdate, Store};
use crate::utils::pagination::{paginate, Page};

#[derive(Clone)]
pub struct CourseService {
    store: Arc<Store>,
}

fn validate_category(category: &str) -> Result<()> {
    if !crate::config::COURSE_CATEGORIES.contains(&category) {
        return Err(Error::InvalidInput(format!(
            "Unknown category: {}",
            category
        )));
    }
    Ok(())
}

impl CourseService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn list(&self, filter: &CourseFilter, page: usize, per_page: usize) -> Page<Course> {
        let mut courses = self.store.get_courses(filter);
        // newest first; map iteration order is arbitrary
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        paginate(courses, page, per_page)
    }

    pub fn create(&self, payload: CreateCoursePayload, instructor_id: Uuid) -> Result<Course> {
        validate_category(&payload.category)?;
        let mut course = Course::new(
            payload.title,
            payload.description,
            instructor_id,
            payload.category,
        );
        if let Some(level) = payload.level {
            course.level = level;
        }
        if let Some(price) = payload.price {
            course.price = price;
        }
        if let Some(thumbnail_url) = payload.thumbnail_url {
            course.thumbnail_url = thumbnail_url;
        }
        if let Some(preview_video_url) = payload.preview_video_url {
            course.preview_video_url = preview_video_url;
        }
        if let Some(tags) = payload.tags {
            course.tags = tags;
        }
        if let Some(language) = payload.language {
            course.language = language;
        }
        if let Some(prerequisites) = payload.prerequisites {
            course.prerequisites = prerequisites;
        }
        if let Some(is_free) = payload.is_free {
            course.is_free = is_free;
        }
        if let Some(access_type) = payload.access_type {
            course.access_type = access_type;
        }
        if let Some(preview_config) = payload.preview_config {
            course.preview_config = preview_config;
        }

        let course = self.store.create_course(course);
        info!(title = %course.title, course_id = %course.id, "new course created");
        Ok(course)
    }

    pub fn get(&self, course_id: Uuid) -> Result<Course> {
        self.store
            .get_course(course_id)
            .ok_or_else(|| Error::NotFound("Course not found".to_string()))
    }

    pub fn update(&self, course_id: Uuid, payload: UpdateCoursePayload) -> Result<Course> {
        if let Some(category) = payload.category.as_deref() {
            validate_category(category)?;
        }
        self.store
            .update_course(
                course_id,
                CourseUpdate {
                    title: payload.title,
                    description: payload.description,
                    category: payload.category,
                    level: payload.level,
                    price: payload.price,
                    thumbnail_url: payload.thumbnail_url,
                    preview_video_url: payload.preview_video_url,
                    tags: payload.tags,
                    language: payload.language,
                    prerequisites: payload.prerequisites,
                    published: payload.published,
                    is_free: payload.is_free,
                    access_type: payload.access_type,
                    preview_config: payload.preview_config,
                },
            )
            .ok_or_else(|| Error::NotFound("Course not found".to_string()))
    }

    pub fn delete(&self, course_id: Uuid) -> Result<()> {
        if !self.store.delete_course(course_id) {
            return Err(Error::NotFound("Course not found".to_string()));
        }
        info!(%course_id, "course deleted");
        Ok(())
    }

    /// Enrollment touches the course roster, the user's course list and the
    /// progress table as one unit; it runs under a single write guard so a
    /// concurrent reader never sees a partial enrollment.
    pub fn enroll(&self, course_id: Uuid, user_id: Uuid) -> Result<Progress> {
        let mut inner = self.store.write();

        match inner.courses.get(&course_id) {
            None => return Err(Error::NotFound("Course not found".to_string())),
            Some(course) if course.enrolled_students.contains(&user_id) => {
                return Err(Error::Conflict("Already enrolled in this course".to_string()));
            }
            Some(_) => {}
        }
        if !inner.users.contains_key(&user_id) {
            return Err(Error::NotFound("User not found".to_string()));
        }

        let progress = Progress::new(user_id, course_id);
        inner.progress.insert(progress.id, progress.clone());
        if let Some(course) = inner.courses.get_mut(&course_id) {
            course.enrolled_students.push(user_id);
        }
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.enrolled_courses.push(course_id);
        }

        info!(%course_id, %user_id, "student enrolled");
        Ok(progress)
    }

    /// The progress record survives unenrollment; re-enrolling picks it back
    /// up instead of starting over.
    pub fn unenroll(&self, course_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut inner = self.store.write();

        match inner.courses.get(&course_id) {
            None => return Err(Error::NotFound("Course not found".to_string())),
            Some(course) if !course.enrolled_students.contains(&user_id) => {
                return Err(Error::Conflict("Not enrolled in this course".to_string()));
            }
            Some(_) => {}
        }

        if let Some(course) = inner.courses.get_mut(&course_id) {
            course.enrolled_students.retain(|id| id != &user_id);
        }
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.enrolled_courses.retain(|id| id != &course_id);
        }

        info!(%course_id, %user_id, "student unenrolled");
        Ok(())
    }

    /// Ordered sections with their subsections, resolved in one read guard.
    pub fn section_tree(&self, course: &Course) -> Vec<(Section, Vec<Subsection>)> {
        let inner = self.store.read();
        course
            .section_ids
            .iter()
            .filter_map(|id| inner.sections.get(id))
            .map(|section| {
                let subsections = section
                    .subsection_ids
                    .iter()
                    .filter_map(|id| inner.subsections.get(id))
                    .cloned()
                    .collect();
                (section.clone(), subsections)
            })
            .collect()
    }

    pub fn create_section(&self, course_id: Uuid, payload: CreateSectionPayload) -> Result<Section> {
        if self.store.get_course(course_id).is_none() {
            return Err(Error::NotFound("Course not found".to_string()));
        }
        let mut section = Section::new(
            payload.title,
            payload.description.unwrap_or_default(),
            course_id,
        );
        if let Some(order) = payload.order {
            section.order = order;
        }
        if let Some(access_level) = payload.access_level {
            section.access_level = access_level;
        }
        if let Some(is_preview) = payload.is_preview {
            section.is_preview = is_preview;
        }
        section.preview_duration = payload.preview_duration;
        Ok(self.store.create_section(section))
    }

    pub fn create_subsection(
        &self,
        section_id: Uuid,
        payload: CreateSubsectionPayload,
    ) -> Result<Subsection> {
        if self.store.get_section(section_id).is_none() {
            return Err(Error::NotFound("Section not found".to_string()));
        }
        let mut subsection = Subsection::new(payload.title, payload.content_type, section_id);
        if let Some(order) = payload.order {
            subsection.order = order;
        }
        if let Some(content) = payload.content {
            subsection.content = content;
        }
        if let Some(duration) = payload.duration {
            subsection.duration = duration;
        }
        if let Some(access_level) = payload.access_level {
            subsection.access_level = access_level;
        }
        if let Some(is_preview) = payload.is_preview {
            subsection.is_preview = is_preview;
        }
        subsection.preview_duration = payload.preview_duration;
        if let Some(video_url) = payload.video_url {
            subsection.video_url = video_url;
        }
        subsection.preview_video_url = payload.preview_video_url;
        Ok(self.store.create_subsection(subsection))
    }

    pub fn create_quiz(&self, section_id: Uuid, payload: CreateQuizPayload) -> Result<Quiz> {
        if self.store.get_section(section_id).is_none() {
            return Err(Error::NotFound("Section not found".to_string()));
        }
        let mut quiz = Quiz::new(payload.title, section_id);
        if let Some(questions) = payload.questions {
            quiz.questions = questions;
        }
        if let Some(passing_score) = payload.passing_score {
            quiz.passing_score = passing_score;
        }
        if let Some(time_limit) = payload.time_limit {
            quiz.time_limit = time_limit;
        }
        if let Some(attempts_allowed) = payload.attempts_allowed {
            quiz.attempts_allowed = attempts_allowed;
        }
        Ok(self.store.create_quiz(quiz))
    }

    pub fn get_quiz(&self, quiz_id: Uuid) -> Result<Quiz> {
        self.store
            .get_quiz(quiz_id)
            .ok_or_else(|| Error::NotFound("Quiz not found".to_string()))
    }

    pub fn reviews(&self, course_id: Uuid) -> Result<Vec<(Review, Option<User>)>> {
        if self.store.get_course(course_id).is_none() {
            return Err(Error::NotFound("Course not found".to_string()));
        }
        let inner = self.store.read();
        let mut reviews: Vec<_> = inner
            .reviews
            .values()
            .filter(|r| r.course_id == course_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews
            .into_iter()
            .map(|review| {
                let reviewer = inner.users.get(&review.user_id).cloned();
                (review, reviewer)
            })
            .collect())
    }

    pub fn create_review(
        &self,
        course_id: Uuid,
        user_id: Uuid,
        payload: CreateReviewPayload,
    ) -> Result<Review> {
        let course = self.get(course_id)?;
        if !course.enrolled_students.contains(&user_id) {
            return Err(Error::Forbidden(
                "You must be enrolled to leave a review".to_string(),
            ));
        }
        Ok(self
            .store
            .create_review(Review::new(user_id, course_id, payload.rating, payload.comment)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    fn seed(store: &Store) -> (User, Course) {
        let student = store.create_user(User::new(
            "talib".into(),
            "talib@example.com".into(),
            "hash".into(),
            UserRole::Student,
        ));
        let course = store.create_course(Course::new(
            "Seerah".into(),
            "Life of the Prophet".into(),
            Uuid::new_v4(),
            "Islamic History".into(),
        ));
        (student, course)
    }

    #[test]
    fn unknown_category_is_rejected() {
        let store = Arc::new(Store::new());
        let courses = CourseService::new(store);
        let err = courses
            .create(
                CreateCoursePayload {
                    title: "Basket Weaving".into(),
                    description: "Not part of this catalog".into(),
                    category: "Crafts".into(),
                    level: None,
                    price: None,
                    thumbnail_url: None,
                    preview_video_url: None,
                    tags: None,
                    language: None,
                    prerequisites: None,
                    is_free: None,
                    access_type: None,
                    preview_config: None,
                },
                Uuid::new_v4(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn enroll_updates_roster_user_and_progress_together() {
        let store = Arc::new(Store::new());
        let (student, course) = seed(&store);
        let courses = CourseService::new(store.clone());

        courses.enroll(course.id, student.id).unwrap();

        let course = store.get_course(course.id).unwrap();
        let student = store.get_user(student.id).unwrap();
        assert!(course.enrolled_students.contains(&student.id));
        assert!(student.enrolled_courses.contains(&course.id));
        assert!(store.get_progress(student.id, course.id).is_some());
    }

    #[test]
    fn double_enroll_conflicts_without_side_effects() {
        let store = Arc::new(Store::new());
        let (student, course) = seed(&store);
        let courses = CourseService::new(store.clone());

        courses.enroll(course.id, student.id).unwrap();
        let err = courses.enroll(course.id, student.id).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let course = store.get_course(course.id).unwrap();
        assert_eq!(course.enrolled_students.len(), 1);
    }

    #[test]
    fn unenroll_keeps_the_progress_record() {
        let store = Arc::new(Store::new());
        let (student, course) = seed(&store);
        let courses = CourseService::new(store.clone());

        courses.enroll(course.id, student.id).unwrap();
        courses.unenroll(course.id, student.id).unwrap();

        let roster = store.get_course(course.id).unwrap().enrolled_students;
        assert!(roster.is_empty());
        assert!(store.get_progress(student.id, course.id).is_some());

        let err = courses.unenroll(course.id, student.id).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn review_requires_enrollment() {
        let store = Arc::new(Store::new());
        let (student, course) = seed(&store);
        let courses = CourseService::new(store.clone());

        let payload = CreateReviewPayload {
            rating: 5,
            comment: "Clear and well paced".into(),
        };
        let err = courses
            .create_review(course.id, student.id, payload.clone())
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        courses.enroll(course.id, student.id).unwrap();
        let review = courses
            .create_review(course.id, student.id, payload)
            .unwrap();
        assert_eq!(review.rating, 5);
    }

    #[test]
    fn section_tree_respects_attachment_order() {
        let store = Arc::new(Store::new());
        let (_, course) = seed(&store);
        let courses = CourseService::new(store.clone());

        for title in ["Week 1", "Week 2"] {
            courses
                .create_section(
                    course.id,
                    CreateSectionPayload {
                        title: title.into(),
                        description: None,
                        order: None,
                        access_level: None,
                        is_preview: None,
                        preview_duration: None,
                    },
                )
                .unwrap();
        }

        let course = store.get_course(course.id).unwrap();
        let tree = courses.section_tree(&course);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].0.title, "Week 1");
        assert_eq!(tree[1].0.title, "Week 2");
    }
}
