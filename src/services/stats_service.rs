use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::course::Course;
use crate::store::Store;

/// Derived on every request; nothing is cached or invalidated.
#[derive(Debug, Clone, Serialize)]
pub struct CourseStatistics {
    pub total_students: usize,
    pub completed_students: usize,
    /// 0.0 when the course has no students.
    pub completion_rate: f64,
    pub average_progress: f64,
    /// 0.0 when the course has no reviews.
    pub average_rating: f64,
    pub total_reviews: usize,
    /// All five star buckets are always present, even at zero.
    pub rating_distribution: BTreeMap<u8, usize>,
}

#[derive(Clone)]
pub struct StatsService {
    store: Arc<Store>,
}

impl StatsService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn course_statistics(&self, course: &Course) -> CourseStatistics {
        let inner = self.store.read();

        let records: Vec<_> = inner
            .progress
            .values()
            .filter(|p| p.course_id == course.id)
            .collect();
        let reviews: Vec<_> = inner
            .reviews
            .values()
            .filter(|r| r.course_id == course.id)
            .collect();

        let total_students = course.enrolled_students.len();
        let completed_students = records.iter().filter(|p| p.completed_at.is_some()).count();
        let completion_rate = if total_students == 0 {
            0.0
        } else {
            completed_students as f64 / total_students as f64 * 100.0
        };
        let average_progress = if records.is_empty() {
            0.0
        } else {
            records.iter().map(|p| p.progress_percentage).sum::<f64>() / records.len() as f64
        };
        let average_rating = if reviews.is_empty() {
            0.0
        } else {
            reviews.iter().map(|r| r.rating as f64).sum::<f64>() / reviews.len() as f64
        };

        let mut rating_distribution: BTreeMap<u8, usize> = (1..=5).map(|star| (star, 0)).collect();
        for review in &reviews {
            if let Some(bucket) = rating_distribution.get_mut(&review.rating) {
                *bucket += 1;
            }
        }

        CourseStatistics {
            total_students,
            completed_students,
            completion_rate,
            average_progress,
            average_rating,
            total_reviews: reviews.len(),
            rating_distribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::progress::Progress;
    use crate::models::review::Review;
    use crate::models::user::{User, UserRole};
    use chrono::Utc;
    use uuid::Uuid;

    fn course_with_students(store: &Store, student_ids: &[Uuid]) -> Course {
        let mut course = Course::new(
            "Hadith Sciences".into(),
            "Chains of transmission".into(),
            Uuid::new_v4(),
            "Hadith & Sunnah".into(),
        );
        course.enrolled_students = student_ids.to_vec();
        store.create_course(course.clone());
        course
    }

    #[test]
    fn empty_course_yields_zeroes_not_errors() {
        let store = Arc::new(Store::new());
        let course = course_with_students(&store, &[]);
        let stats = StatsService::new(store).course_statistics(&course);

        assert_eq!(stats.total_students, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert_eq!(stats.average_progress, 0.0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.rating_distribution.len(), 5);
        assert!(stats.rating_distribution.values().all(|&n| n == 0));
    }

    #[test]
    fn completion_rate_counts_only_finished_records() {
        let store = Arc::new(Store::new());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let course = course_with_students(&store, &[a, b]);

        let mut done = Progress::new(a, course.id);
        done.progress_percentage = 100.0;
        done.completed_at = Some(Utc::now());
        store.create_progress(done);

        let mut halfway = Progress::new(b, course.id);
        halfway.progress_percentage = 50.0;
        store.create_progress(halfway);

        let stats = StatsService::new(store).course_statistics(&course);
        assert_eq!(stats.total_students, 2);
        assert_eq!(stats.completed_students, 1);
        assert_eq!(stats.completion_rate, 50.0);
        assert_eq!(stats.average_progress, 75.0);
    }

    #[test]
    fn rating_distribution_keeps_all_buckets() {
        let store = Arc::new(Store::new());
        let course = course_with_students(&store, &[]);
        let reviewer = store.create_user(User::new(
            "r".into(),
            "r@example.com".into(),
            "hash".into(),
            UserRole::Student,
        ));

        store.create_review(Review::new(reviewer.id, course.id, 5, "excellent".into()));
        store.create_review(Review::new(reviewer.id, course.id, 5, "still excellent".into()));
        store.create_review(Review::new(reviewer.id, course.id, 2, "meh".into()));

        let stats = StatsService::new(store).course_statistics(&course);
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.average_rating, 4.0);
        assert_eq!(stats.rating_distribution[&5], 2);
        assert_eq!(stats.rating_distribution[&2], 1);
        assert_eq!(stats.rating_distribution[&1], 0);
        assert_eq!(stats.rating_distribution[&3], 0);
        assert_eq!(stats.rating_distribution[&4], 0);
    }
}
