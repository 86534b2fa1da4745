use chrono::Utc;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::dto::progress_dto::UpdateProgressPayload;
use crate::error::{Error, Result};
use crate::models::course::Course;
use crate::models::progress::{Progress, QuizAttempt};
use crate::store::Store;

#[derive(Clone)]
pub struct ProgressService {
    store: Arc<Store>,
}

fn percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

fn dedup_preserving_order(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Recompute against the live course structure. `completed_at` is set the
/// first time the percentage reaches 100 and is never cleared afterwards,
/// even if the course later grows and the percentage drops.
fn recompute(progress: &mut Progress, total: usize) {
    progress.progress_percentage = percentage(progress.completed_subsections.len(), total);
    if progress.progress_percentage >= 100.0 && progress.completed_at.is_none() {
        progress.completed_at = Some(Utc::now());
    }
}

impl ProgressService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Returns the record with a freshly recomputed percentage, plus the
    /// denominator it was computed against.
    pub fn get(&self, user_id: Uuid, course_id: Uuid) -> Result<(Progress, usize)> {
        let mut inner = self.store.write();
        if inner.find_progress(user_id, course_id).is_none() {
            return Err(Error::NotFound("Progress not found".to_string()));
        }
        let course = inner
            .courses
            .get(&course_id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Course not found".to_string()))?;
        let total = inner.total_subsections(&course);

        let progress = match inner.find_progress_mut(user_id, course_id) {
            Some(p) => p,
            None => return Err(Error::NotFound("Progress not found".to_string())),
        };
        recompute(progress, total);
        Ok((progress.clone(), total))
    }

    pub fn list_for_user(&self, user_id: Uuid) -> Vec<(Progress, Option<Course>)> {
        let inner = self.store.read();
        inner
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .map(|p| (p.clone(), inner.courses.get(&p.course_id).cloned()))
            .collect()
    }

    /// Bulk replacement of the tracked fields. Completion lists are
    /// deduplicated; the percentage is only recomputed when the subsection
    /// list actually changed.
    pub fn update(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        payload: UpdateProgressPayload,
    ) -> Result<Progress> {
        let now = Utc::now();
        let mut inner = self.store.write();
        if inner.find_progress(user_id, course_id).is_none() {
            return Err(Error::NotFound("Progress not found".to_string()));
        }
        let total = inner
            .courses
            .get(&course_id)
            .cloned()
            .map(|course| inner.total_subsections(&course));

        let progress = match inner.find_progress_mut(user_id, course_id) {
            Some(p) => p,
            None => return Err(Error::NotFound("Progress not found".to_string())),
        };

        if let Some(sections) = payload.completed_sections {
            progress.completed_sections = dedup_preserving_order(sections);
        }
        let subsections_changed = payload.completed_subsections.is_some();
        if let Some(subsections) = payload.completed_subsections {
            progress.completed_subsections = dedup_preserving_order(subsections);
        }
        if let Some(id) = payload.current_section_id {
            progress.current_section_id = Some(id);
        }
        if let Some(id) = payload.current_subsection_id {
            progress.current_subsection_id = Some(id);
        }
        if let Some(time_spent) = payload.total_time_spent {
            progress.total_time_spent = time_spent;
        }

        if subsections_changed {
            if let Some(total) = total {
                recompute(progress, total);
            }
        }
        progress.last_accessed = now;
        Ok(progress.clone())
    }

    /// Marks the section and every one of its subsections complete.
    pub fn mark_section_complete(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        section_id: Uuid,
    ) -> Result<Progress> {
        let now = Utc::now();
        let mut inner = self.store.write();
        if inner.find_progress(user_id, course_id).is_none() {
            return Err(Error::NotFound("Progress not found".to_string()));
        }
        let section = inner
            .sections
            .get(&section_id)
            .filter(|s| s.course_id == course_id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Section not found".to_string()))?;
        let total = inner
            .courses
            .get(&course_id)
            .cloned()
            .map(|course| inner.total_subsections(&course));

        let progress = match inner.find_progress_mut(user_id, course_id) {
            Some(p) => p,
            None => return Err(Error::NotFound("Progress not found".to_string())),
        };

        if !progress.completed_sections.contains(&section_id) {
            progress.completed_sections.push(section_id);
        }
        for subsection_id in &section.subsection_ids {
            if !progress.completed_subsections.contains(subsection_id) {
                progress.completed_subsections.push(*subsection_id);
            }
        }
        if let Some(total) = total {
            recompute(progress, total);
        }
        progress.current_section_id = Some(section_id);
        progress.last_accessed = now;

        info!(%user_id, %section_id, "section marked complete");
        Ok(progress.clone())
    }

    /// Idempotent for the completion list; position and `last_accessed`
    /// refresh on every call, including repeats. When the parent section's
    /// subsections are all complete, the section is marked complete too.
    pub fn mark_subsection_complete(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        subsection_id: Uuid,
    ) -> Result<Progress> {
        let now = Utc::now();
        let mut inner = self.store.write();
        if inner.find_progress(user_id, course_id).is_none() {
            return Err(Error::NotFound("Progress not found".to_string()));
        }
        let subsection = inner
            .subsections
            .get(&subsection_id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Subsection not found".to_string()))?;
        let section = inner
            .sections
            .get(&subsection.section_id)
            .filter(|s| s.course_id == course_id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Subsection not found in this course".to_string()))?;
        let total = inner
            .courses
            .get(&course_id)
            .cloned()
            .map(|course| inner.total_subsections(&course));

        let progress = match inner.find_progress_mut(user_id, course_id) {
            Some(p) => p,
            None => return Err(Error::NotFound("Progress not found".to_string())),
        };

        if !progress.completed_subsections.contains(&subsection_id) {
            progress.completed_subsections.push(subsection_id);
        }
        let section_done = section
            .subsection_ids
            .iter()
            .all(|id| progress.completed_subsections.contains(id));
        if section_done && !progress.completed_sections.contains(&section.id) {
            progress.completed_sections.push(section.id);
        }
        if let Some(total) = total {
            recompute(progress, total);
        }
        progress.current_section_id = Some(section.id);
        progress.current_subsection_id = Some(subsection_id);
        progress.last_accessed = now;

        Ok(progress.clone())
    }

    /// Appends an attempt. `attempts_allowed` on the quiz is declarative
    /// metadata; attempts are never capped here.
    pub fn record_quiz_attempt(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        quiz_id: Uuid,
        score: u32,
        answers: JsonValue,
    ) -> Result<(QuizAttempt, Progress)> {
        if score > 100 {
            return Err(Error::InvalidInput(
                "Score must be between 0 and 100".to_string(),
            ));
        }
        let now = Utc::now();
        let mut inner = self.store.write();
        if inner.find_progress(user_id, course_id).is_none() {
            return Err(Error::NotFound("Progress not found".to_string()));
        }
        let quiz = inner
            .quizzes
            .get(&quiz_id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Quiz not found".to_string()))?;

        let progress = match inner.find_progress_mut(user_id, course_id) {
            Some(p) => p,
            None => return Err(Error::NotFound("Progress not found".to_string())),
        };

        let attempt = QuizAttempt {
            score,
            answers,
            timestamp: now,
            passed: score >= quiz.passing_score,
        };
        progress
            .quiz_attempts
            .entry(quiz_id)
            .or_default()
            .push(attempt.clone());
        progress.last_accessed = now;

        info!(%user_id, %quiz_id, score, passed = attempt.passed, "quiz attempt recorded");
        Ok((attempt, progress.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::course_dto::CreateQuizPayload;
    use crate::models::section::Section;
    use crate::models::subsection::{ContentType, Subsection};
    use crate::models::user::{User, UserRole};
    use crate::services::course_service::CourseService;

    struct Fixture {
        store: Arc<Store>,
        progress: ProgressService,
        user_id: Uuid,
        course_id: Uuid,
        section_ids: Vec<Uuid>,
        subsection_ids: Vec<Uuid>,
    }

    /// One course, two sections, two subsections each; the student is
    /// already enrolled.
    fn fixture() -> Fixture {
        let store = Arc::new(Store::new());
        let student = store.create_user(User::new(
            "talib".into(),
            "talib@example.com".into(),
            "hash".into(),
            UserRole::Student,
        ));
        let course = store.create_course(Course::new(
            "Aqeedah".into(),
            "Foundations of belief".into(),
            Uuid::new_v4(),
            "Theology & Philosophy".into(),
        ));

        let mut section_ids = Vec::new();
        let mut subsection_ids = Vec::new();
        for week in 1..=2 {
            let section = store.create_section(Section::new(
                format!("Week {}", week),
                String::new(),
                course.id,
            ));
            section_ids.push(section.id);
            for part in 1..=2 {
                let subsection = store.create_subsection(Subsection::new(
                    format!("Lesson {}.{}", week, part),
                    ContentType::Video,
                    section.id,
                ));
                subsection_ids.push(subsection.id);
            }
        }

        CourseService::new(store.clone())
            .enroll(course.id, student.id)
            .unwrap();

        Fixture {
            progress: ProgressService::new(store.clone()),
            store,
            user_id: student.id,
            course_id: course.id,
            section_ids,
            subsection_ids,
        }
    }

    #[test]
    fn percentage_climbs_from_quarter_to_full() {
        let fx = fixture();
        let mut last = 0.0;
        for (i, subsection_id) in fx.subsection_ids.iter().enumerate() {
            let progress = fx
                .progress
                .mark_subsection_complete(fx.user_id, fx.course_id, *subsection_id)
                .unwrap();
            let expected = (i + 1) as f64 * 25.0;
            assert_eq!(progress.progress_percentage, expected);
            assert!(progress.progress_percentage > last);
            last = progress.progress_percentage;
        }

        let (done, total) = fx.progress.get(fx.user_id, fx.course_id).unwrap();
        assert_eq!(total, 4);
        assert!(done.completed_at.is_some());
        assert_eq!(done.completed_sections.len(), 2);
    }

    #[test]
    fn duplicate_completion_refreshes_position_not_the_list() {
        let fx = fixture();
        let target = fx.subsection_ids[0];

        let first = fx
            .progress
            .mark_subsection_complete(fx.user_id, fx.course_id, target)
            .unwrap();
        let second = fx
            .progress
            .mark_subsection_complete(fx.user_id, fx.course_id, target)
            .unwrap();

        assert_eq!(second.completed_subsections, vec![target]);
        assert_eq!(second.progress_percentage, first.progress_percentage);
        assert_eq!(second.current_subsection_id, Some(target));
        assert!(second.last_accessed >= first.last_accessed);
    }

    #[test]
    fn completed_at_is_set_once_and_survives_course_growth() {
        let fx = fixture();
        for subsection_id in &fx.subsection_ids {
            fx.progress
                .mark_subsection_complete(fx.user_id, fx.course_id, *subsection_id)
                .unwrap();
        }
        let (progress, _) = fx.progress.get(fx.user_id, fx.course_id).unwrap();
        let completed_at = progress.completed_at.unwrap();

        // instructor adds a lesson after completion
        fx.store.create_subsection(Subsection::new(
            "Bonus lesson".into(),
            ContentType::Video,
            fx.section_ids[1],
        ));

        let (progress, total) = fx.progress.get(fx.user_id, fx.course_id).unwrap();
        assert_eq!(total, 5);
        assert_eq!(progress.progress_percentage, 80.0);
        assert_eq!(progress.completed_at, Some(completed_at));
    }

    #[test]
    fn mark_section_complete_cascades_to_subsections() {
        let fx = fixture();
        let progress = fx
            .progress
            .mark_section_complete(fx.user_id, fx.course_id, fx.section_ids[0])
            .unwrap();

        assert_eq!(progress.completed_sections, vec![fx.section_ids[0]]);
        assert_eq!(progress.completed_subsections.len(), 2);
        assert_eq!(progress.progress_percentage, 50.0);
        assert!(progress.completed_at.is_none());
    }

    #[test]
    fn section_from_another_course_is_not_found() {
        let fx = fixture();
        let other = fx.store.create_course(Course::new(
            "Other".into(),
            "Another course entirely".into(),
            Uuid::new_v4(),
            "Arabic Language".into(),
        ));
        let foreign_section =
            fx.store
                .create_section(Section::new("Elsewhere".into(), String::new(), other.id));

        let err = fx
            .progress
            .mark_section_complete(fx.user_id, fx.course_id, foreign_section.id)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn bulk_update_dedups_and_recomputes() {
        let fx = fixture();
        let a = fx.subsection_ids[0];
        let b = fx.subsection_ids[1];

        let progress = fx
            .progress
            .update(
                fx.user_id,
                fx.course_id,
                UpdateProgressPayload {
                    completed_sections: None,
                    completed_subsections: Some(vec![a, b, a]),
                    current_section_id: None,
                    current_subsection_id: Some(b),
                    total_time_spent: Some(45),
                },
            )
            .unwrap();

        assert_eq!(progress.completed_subsections, vec![a, b]);
        assert_eq!(progress.progress_percentage, 50.0);
        assert_eq!(progress.total_time_spent, 45);
        assert_eq!(progress.current_subsection_id, Some(b));
    }

    #[test]
    fn quiz_attempts_accumulate_without_a_cap() {
        let fx = fixture();
        let quiz = CourseService::new(fx.store.clone())
            .create_quiz(
                fx.section_ids[0],
                CreateQuizPayload {
                    title: "Week 1 check".into(),
                    questions: None,
                    passing_score: Some(70),
                    time_limit: None,
                    attempts_allowed: Some(1),
                },
            )
            .unwrap();

        let (failed, _) = fx
            .progress
            .record_quiz_attempt(fx.user_id, fx.course_id, quiz.id, 60, JsonValue::Null)
            .unwrap();
        assert!(!failed.passed);

        // a second attempt succeeds even though attempts_allowed is 1
        let (passed, progress) = fx
            .progress
            .record_quiz_attempt(fx.user_id, fx.course_id, quiz.id, 70, JsonValue::Null)
            .unwrap();
        assert!(passed.passed);
        assert_eq!(progress.quiz_attempts[&quiz.id].len(), 2);
    }

    #[test]
    fn missing_progress_record_is_not_found() {
        let fx = fixture();
        let stranger = Uuid::new_v4();
        let err = fx.progress.get(stranger, fx.course_id).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
