use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::course::{Course, CourseAccessType};
use crate::models::section::AccessLevel;
use crate::models::subsection::{ContentType, Subsection};
use crate::models::user::{User, UserRole};
use crate::store::Store;

/// Access is re-derived on every request from current enrollment, role and
/// course settings; it is never cached on the user or the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    Full,
    Preview,
    Guest,
    Locked,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseAccess {
    pub has_full_access: bool,
    pub access_type: AccessTier,
    pub can_access_previews: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enrolled: Option<bool>,
    /// Only listed for limited tiers; full access needs no whitelist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessible_sections: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessible_subsections: Option<Vec<Uuid>>,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_duration: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubsectionAccess {
    pub subsection_id: Uuid,
    pub title: String,
    pub content_type: ContentType,
    pub order: u32,
    /// Minutes.
    pub duration: u32,
    pub access_type: AccessTier,
    pub content: JsonValue,
    pub video_url: String,
    /// Seconds; absent for full access and for locked content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoStream {
    pub subsection_id: Uuid,
    pub title: String,
    /// Minutes, the full length of the recording.
    pub duration: u32,
    pub video_url: String,
    pub access_type: AccessTier,
    /// Seconds of playback the viewer is entitled to.
    pub available_duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Anonymous viewers never get full access, free course or not; they are
/// always on the guest tier.
fn has_full_access(viewer: Option<&User>, course: &Course) -> bool {
    let Some(user) = viewer else {
        return false;
    };
    course.enrolled_students.contains(&user.id)
        || user.role.is_staff()
        || course.is_free
        || course.access_type == CourseAccessType::Free
}

/// A subsection is previewable on its own when the course whitelists it,
/// when its own access level is free, or when it is flagged as a preview.
fn is_independently_free(course: &Course, subsection: &Subsection) -> bool {
    course.preview_config.free_subsections.contains(&subsection.id)
        || subsection.access_level == AccessLevel::Free
        || subsection.is_preview
}

#[derive(Clone)]
pub struct AccessService {
    store: Arc<Store>,
    default_preview_duration: u32,
}

impl AccessService {
    pub fn new(store: Arc<Store>, default_preview_duration: u32) -> Self {
        Self {
            store,
            default_preview_duration,
        }
    }

    fn course_preview_duration(&self, course: &Course) -> u32 {
        course
            .preview_config
            .preview_duration
            .unwrap_or(self.default_preview_duration)
    }

    pub fn course_access(&self, viewer: Option<&User>, course_id: Uuid) -> Result<CourseAccess> {
        let course = self
            .store
            .get_course(course_id)
            .ok_or_else(|| Error::NotFound("Course not found".to_string()))?;

        let Some(user) = viewer else {
            return Ok(CourseAccess {
                has_full_access: false,
                access_type: AccessTier::Guest,
                can_access_previews: true,
                user_role: None,
                is_enrolled: None,
                accessible_sections: Some(course.preview_config.free_sections.clone()),
                accessible_subsections: Some(course.preview_config.free_subsections.clone()),
                preview_duration: Some(self.course_preview_duration(&course)),
            });
        };

        let full = has_full_access(Some(user), &course);
        Ok(CourseAccess {
            has_full_access: full,
            access_type: if full {
                AccessTier::Full
            } else {
                AccessTier::Preview
            },
            can_access_previews: true,
            user_role: Some(user.role),
            is_enrolled: Some(course.enrolled_students.contains(&user.id)),
            accessible_sections: (!full).then(|| course.preview_config.free_sections.clone()),
            accessible_subsections: (!full)
                .then(|| course.preview_config.free_subsections.clone()),
            preview_duration: (!full).then(|| self.course_preview_duration(&course)),
        })
    }

    /// Metadata lookup. Locked content degrades to a stripped payload (empty
    /// content, no video URL) rather than an error, so listings can still
    /// render the title and duration.
    pub fn subsection_access(
        &self,
        viewer: Option<&User>,
        course_id: Uuid,
        subsection_id: Uuid,
    ) -> Result<SubsectionAccess> {
        let course = self
            .store
            .get_course(course_id)
            .ok_or_else(|| Error::NotFound("Course not found".to_string()))?;
        let subsection = self
            .store
            .get_subsection(subsection_id)
            .ok_or_else(|| Error::NotFound("Subsection not found".to_string()))?;

        if has_full_access(viewer, &course) {
            return Ok(SubsectionAccess {
                subsection_id: subsection.id,
                title: subsection.title,
                content_type: subsection.content_type,
                order: subsection.order,
                duration: subsection.duration,
                access_type: AccessTier::Full,
                content: subsection.content,
                video_url: subsection.video_url,
                available_duration: None,
                message: None,
            });
        }

        if is_independently_free(&course, &subsection) {
            // subsection override wins over the course-level default;
            // no implicit fallback here, the metadata view reports what is
            // actually configured
            let available = subsection
                .preview_duration
                .or(course.preview_config.preview_duration);
            let video_url = subsection
                .preview_video_url
                .clone()
                .unwrap_or_else(|| subsection.video_url.clone());
            return Ok(SubsectionAccess {
                subsection_id: subsection.id,
                title: subsection.title,
                content_type: subsection.content_type,
                order: subsection.order,
                duration: subsection.duration,
                access_type: AccessTier::Preview,
                content: subsection.content,
                video_url,
                available_duration: available,
                message: None,
            });
        }

        Ok(SubsectionAccess {
            subsection_id: subsection.id,
            title: subsection.title,
            content_type: subsection.content_type,
            order: subsection.order,
            duration: subsection.duration,
            access_type: AccessTier::Locked,
            content: json!({}),
            video_url: String::new(),
            available_duration: None,
            message: Some("Enroll in the course to access this content".to_string()),
        })
    }

    /// Streaming grant. Unlike the metadata lookup, locked content here is a
    /// hard denial.
    pub fn video_stream(&self, viewer: Option<&User>, subsection_id: Uuid) -> Result<VideoStream> {
        let subsection = self
            .store
            .get_subsection(subsection_id)
            .ok_or_else(|| Error::NotFound("Subsection not found".to_string()))?;
        let section = self
            .store
            .get_section(subsection.section_id)
            .ok_or_else(|| Error::NotFound("Section not found".to_string()))?;
        let course = self
            .store
            .get_course(section.course_id)
            .ok_or_else(|| Error::NotFound("Course not found".to_string()))?;

        if has_full_access(viewer, &course) {
            return Ok(VideoStream {
                subsection_id: subsection.id,
                title: subsection.title,
                duration: subsection.duration,
                video_url: subsection.video_url,
                access_type: AccessTier::Full,
                // stored in minutes, granted in seconds
                available_duration: subsection.duration * 60,
                message: None,
            });
        }

        if is_independently_free(&course, &subsection) {
            let available = subsection
                .preview_duration
                .or(course.preview_config.preview_duration)
                .unwrap_or(self.default_preview_duration);
            let video_url = subsection
                .preview_video_url
                .clone()
                .unwrap_or_else(|| subsection.video_url.clone());
            return Ok(VideoStream {
                subsection_id: subsection.id,
                title: subsection.title,
                duration: subsection.duration,
                video_url,
                access_type: AccessTier::Preview,
                available_duration: available,
                message: Some(format!(
                    "Preview available for {} seconds. Enroll for full access.",
                    available
                )),
            });
        }

        Err(Error::Forbidden(
            "Access denied. Please enroll in the course.".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::section::Section;
    use crate::models::subsection::ContentType;
    use crate::services::course_service::CourseService;

    struct Fixture {
        store: Arc<Store>,
        access: AccessService,
        course_id: Uuid,
        subsection_id: Uuid,
    }

    fn user(store: &Store, role: UserRole) -> User {
        let name = Uuid::new_v4().simple().to_string();
        store.create_user(User::new(
            name.clone(),
            format!("{}@example.com", name),
            "hash".into(),
            role,
        ))
    }

    fn fixture() -> Fixture {
        let store = Arc::new(Store::new());
        let course = store.create_course(Course::new(
            "Usul al-Fiqh".into(),
            "Principles of jurisprudence".into(),
            Uuid::new_v4(),
            "Fiqh & Jurisprudence".into(),
        ));
        let section = store.create_section(Section::new(
            "Week 1".into(),
            String::new(),
            course.id,
        ));
        let mut subsection = Subsection::new("Lecture 1".into(), ContentType::Video, section.id);
        subsection.duration = 45;
        subsection.video_url = "https://cdn.example.com/full/lecture1.mp4".into();
        let subsection = store.create_subsection(subsection);

        Fixture {
            access: AccessService::new(store.clone(), 300),
            store,
            course_id: course.id,
            subsection_id: subsection.id,
        }
    }

    #[test]
    fn enrolled_student_gets_full_stream_in_seconds() {
        let fx = fixture();
        let student = user(&fx.store, UserRole::Student);
        CourseService::new(fx.store.clone())
            .enroll(fx.course_id, student.id)
            .unwrap();
        let student = fx.store.get_user(student.id).unwrap();

        let stream = fx
            .access
            .video_stream(Some(&student), fx.subsection_id)
            .unwrap();
        assert_eq!(stream.access_type, AccessTier::Full);
        assert_eq!(stream.available_duration, 45 * 60);
        assert_eq!(stream.video_url, "https://cdn.example.com/full/lecture1.mp4");
    }

    #[test]
    fn staff_bypass_enrollment() {
        let fx = fixture();
        for role in [UserRole::Instructor, UserRole::Admin] {
            let staff = user(&fx.store, role);
            let access = fx
                .access
                .course_access(Some(&staff), fx.course_id)
                .unwrap();
            assert!(access.has_full_access);
            assert_eq!(access.access_type, AccessTier::Full);
            assert_eq!(access.is_enrolled, Some(false));
        }
    }

    #[test]
    fn anonymous_is_guest_even_on_free_courses() {
        let fx = fixture();
        fx.store.write().courses.get_mut(&fx.course_id).unwrap().is_free = true;

        let access = fx.access.course_access(None, fx.course_id).unwrap();
        assert!(!access.has_full_access);
        assert_eq!(access.access_type, AccessTier::Guest);
        assert!(access.can_access_previews);
        assert_eq!(access.preview_duration, Some(300));
    }

    #[test]
    fn free_course_is_full_for_any_signed_in_user() {
        let fx = fixture();
        fx.store.write().courses.get_mut(&fx.course_id).unwrap().is_free = true;
        let student = user(&fx.store, UserRole::Student);

        let access = fx
            .access
            .course_access(Some(&student), fx.course_id)
            .unwrap();
        assert!(access.has_full_access);
        assert!(access.accessible_sections.is_none());
    }

    #[test]
    fn locked_metadata_is_stripped_not_rejected() {
        let fx = fixture();
        let student = user(&fx.store, UserRole::Student);

        let meta = fx
            .access
            .subsection_access(Some(&student), fx.course_id, fx.subsection_id)
            .unwrap();
        assert_eq!(meta.access_type, AccessTier::Locked);
        assert_eq!(meta.content, json!({}));
        assert!(meta.video_url.is_empty());
        assert_eq!(meta.duration, 45);
        assert!(meta.message.is_some());
    }

    #[test]
    fn locked_stream_is_forbidden() {
        let fx = fixture();
        let student = user(&fx.store, UserRole::Student);

        let err = fx
            .access
            .video_stream(Some(&student), fx.subsection_id)
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[test]
    fn preview_swaps_url_and_caps_duration() {
        let fx = fixture();
        {
            let mut inner = fx.store.write();
            let sub = inner.subsections.get_mut(&fx.subsection_id).unwrap();
            sub.is_preview = true;
            sub.preview_video_url = Some("https://cdn.example.com/previews/lecture1.mp4".into());
            sub.preview_duration = Some(120);
            inner
                .courses
                .get_mut(&fx.course_id)
                .unwrap()
                .preview_config
                .preview_duration = Some(600);
        }
        let student = user(&fx.store, UserRole::Student);

        let stream = fx
            .access
            .video_stream(Some(&student), fx.subsection_id)
            .unwrap();
        assert_eq!(stream.access_type, AccessTier::Preview);
        // subsection override beats the course default
        assert_eq!(stream.available_duration, 120);
        assert_eq!(
            stream.video_url,
            "https://cdn.example.com/previews/lecture1.mp4"
        );
        assert!(stream.message.unwrap().contains("120 seconds"));
    }

    #[test]
    fn preview_without_dedicated_asset_falls_back_to_the_full_url() {
        let fx = fixture();
        {
            let mut inner = fx.store.write();
            inner
                .subsections
                .get_mut(&fx.subsection_id)
                .unwrap()
                .is_preview = true;
        }
        let student = user(&fx.store, UserRole::Student);

        let stream = fx
            .access
            .video_stream(Some(&student), fx.subsection_id)
            .unwrap();
        assert_eq!(stream.access_type, AccessTier::Preview);
        assert_eq!(stream.available_duration, 300);
        assert_eq!(stream.video_url, "https://cdn.example.com/full/lecture1.mp4");
    }

    #[test]
    fn whitelisted_subsection_is_previewable() {
        let fx = fixture();
        {
            let mut inner = fx.store.write();
            let sub_id = fx.subsection_id;
            inner
                .courses
                .get_mut(&fx.course_id)
                .unwrap()
                .preview_config
                .free_subsections
                .push(sub_id);
        }

        let meta = fx
            .access
            .subsection_access(None, fx.course_id, fx.subsection_id)
            .unwrap();
        assert_eq!(meta.access_type, AccessTier::Preview);
        assert!(!meta.video_url.is_empty());
    }
}
