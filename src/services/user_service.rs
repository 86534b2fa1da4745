use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::dto::user_dto::{UpdateUserPayload, UserListQuery};
use crate::error::{Error, Result};
use crate::models::course::Course;
use crate::models::progress::Progress;
use crate::models::user::User;
use crate::store::{Store, UserUpdate};
use crate::utils::pagination::{paginate, Page};

#[derive(Clone)]
pub struct UserService {
    store: Arc<Store>,
}

impl UserService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn list(&self, query: &UserListQuery) -> Page<User> {
        let mut users = self.store.get_users();
        if let Some(role) = query.role {
            users.retain(|u| u.role == role);
        }
        // map iteration order is arbitrary; pin it down for pagination
        users.sort_by_key(|u| u.created_at);
        paginate(users, query.page.unwrap_or(1), query.per_page.unwrap_or(10))
    }

    pub fn get(&self, user_id: Uuid) -> Result<User> {
        self.store
            .get_user(user_id)
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    pub fn update(&self, user_id: Uuid, payload: UpdateUserPayload) -> Result<User> {
        if let Some(username) = payload.username.as_deref() {
            if self
                .store
                .get_user_by_username(username)
                .is_some_and(|existing| existing.id != user_id)
            {
                return Err(Error::Conflict("Username already taken".to_string()));
            }
        }
        if let Some(email) = payload.email.as_deref() {
            if self
                .store
                .get_user_by_email(email)
                .is_some_and(|existing| existing.id != user_id)
            {
                return Err(Error::Conflict(
                    "User with this email already exists".to_string(),
                ));
            }
        }

        self.store
            .update_user(
                user_id,
                UserUpdate {
                    username: payload.username,
                    email: payload.email,
                    profile: payload.profile,
                    role: payload.role,
                },
            )
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    pub fn delete(&self, user_id: Uuid) -> Result<()> {
        if !self.store.delete_user(user_id) {
            return Err(Error::NotFound("User not found".to_string()));
        }
        info!(%user_id, "user deleted");
        Ok(())
    }

    pub fn progress_for(&self, user_id: Uuid) -> Vec<Progress> {
        self.store.get_user_progress(user_id)
    }

    pub fn add_to_wishlist(&self, user_id: Uuid, course_id: Uuid) -> Result<User> {
        let mut inner = self.store.write();
        if !inner.courses.contains_key(&course_id) {
            return Err(Error::NotFound("Course not found".to_string()));
        }
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
        if user.wishlist.contains(&course_id) {
            return Err(Error::Conflict("Course already in wishlist".to_string()));
        }
        user.wishlist.push(course_id);
        Ok(user.clone())
    }

    pub fn remove_from_wishlist(&self, user_id: Uuid, course_id: Uuid) -> Result<User> {
        let mut inner = self.store.write();
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
        if !user.wishlist.contains(&course_id) {
            return Err(Error::Conflict("Course not in wishlist".to_string()));
        }
        user.wishlist.retain(|id| id != &course_id);
        Ok(user.clone())
    }

    /// Enrolled courses paired with the user's progress record, plus the
    /// wishlist. Dangling ids (deleted courses) are skipped, not errors.
    pub fn courses_for(&self, user: &User) -> (Vec<(Course, Option<Progress>)>, Vec<Course>) {
        let inner = self.store.read();
        let enrolled = user
            .enrolled_courses
            .iter()
            .filter_map(|id| inner.courses.get(id))
            .map(|course| {
                let progress = inner.find_progress(user.id, course.id).cloned();
                (course.clone(), progress)
            })
            .collect();
        let wishlist = user
            .wishlist
            .iter()
            .filter_map(|id| inner.courses.get(id))
            .cloned()
            .collect();
        (enrolled, wishlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    fn seed(store: &Store) -> (User, Course) {
        let user = store.create_user(User::new(
            "amina".into(),
            "amina@example.com".into(),
            "hash".into(),
            UserRole::Student,
        ));
        let course = store.create_course(Course::new(
            "Tajweed Basics".into(),
            "Rules of recitation".into(),
            Uuid::new_v4(),
            "Quran Studies".into(),
        ));
        (user, course)
    }

    #[test]
    fn wishlist_add_is_not_idempotent() {
        let store = Arc::new(Store::new());
        let (user, course) = seed(&store);
        let users = UserService::new(store);

        let updated = users.add_to_wishlist(user.id, course.id).unwrap();
        assert_eq!(updated.wishlist, vec![course.id]);

        let err = users.add_to_wishlist(user.id, course.id).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn wishlist_remove_of_absent_course_conflicts() {
        let store = Arc::new(Store::new());
        let (user, course) = seed(&store);
        let users = UserService::new(store);

        let err = users.remove_from_wishlist(user.id, course.id).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        users.add_to_wishlist(user.id, course.id).unwrap();
        let updated = users.remove_from_wishlist(user.id, course.id).unwrap();
        assert!(updated.wishlist.is_empty());
    }

    #[test]
    fn update_rejects_taken_username() {
        let store = Arc::new(Store::new());
        let (user, _) = seed(&store);
        store.create_user(User::new(
            "zayd".into(),
            "zayd@example.com".into(),
            "hash".into(),
            UserRole::Student,
        ));
        let users = UserService::new(store);

        let err = users
            .update(
                user.id,
                UpdateUserPayload {
                    username: Some("zayd".into()),
                    email: None,
                    profile: None,
                    role: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // keeping your own name is fine
        let same = users
            .update(
                user.id,
                UpdateUserPayload {
                    username: Some("amina".into()),
                    email: None,
                    profile: None,
                    role: None,
                },
            )
            .unwrap();
        assert_eq!(same.username, "amina");
    }

    #[test]
    fn list_filters_by_role() {
        let store = Arc::new(Store::new());
        seed(&store);
        store.create_user(User::new(
            "ustadh".into(),
            "ustadh@example.com".into(),
            "hash".into(),
            UserRole::Instructor,
        ));
        let users = UserService::new(store);

        let page = users.list(&UserListQuery {
            role: Some(UserRole::Instructor),
            ..Default::default()
        });
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].username, "ustadh");
    }
}
