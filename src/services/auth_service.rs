use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::dto::auth_dto::{LoginPayload, RegisterPayload};
use crate::error::{Error, Result};
use crate::models::session::Session;
use crate::models::user::{User, UserRole};
use crate::store::Store;
use crate::utils::{crypto, token, validation};

const SESSION_TOKEN_LENGTH: usize = 32;

#[derive(Clone)]
pub struct AuthService {
    store: Arc<Store>,
    session_ttl_hours: i64,
}

impl AuthService {
    pub fn new(store: Arc<Store>, session_ttl_hours: i64) -> Self {
        Self {
            store,
            session_ttl_hours,
        }
    }

    pub fn register(&self, payload: RegisterPayload) -> Result<User> {
        let strength_errors = validation::password_strength_errors(&payload.password);
        if !strength_errors.is_empty() {
            return Err(Error::InvalidInput(strength_errors.join("; ")));
        }
        if self.store.get_user_by_email(&payload.email).is_some() {
            return Err(Error::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
        if self.store.get_user_by_username(&payload.username).is_some() {
            return Err(Error::Conflict("Username already taken".to_string()));
        }

        let password_hash = crypto::hash_password(&payload.password)
            .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))?;
        let user = self.store.create_user(User::new(
            payload.username,
            payload.email,
            password_hash,
            payload.role.unwrap_or(UserRole::Student),
        ));

        info!(username = %user.username, "new user registered");
        Ok(user)
    }

    pub fn login(&self, payload: LoginPayload) -> Result<(String, User)> {
        let user = self
            .store
            .get_user_by_email(&payload.email)
            .ok_or_else(|| Error::Unauthorized("Invalid credentials".to_string()))?;

        let verified = crypto::verify_password(&payload.password, &user.password_hash)
            .map_err(|e| Error::Internal(format!("Password verification failed: {}", e)))?;
        if !verified {
            return Err(Error::Unauthorized("Invalid credentials".to_string()));
        }

        let token = token::generate_session_token(SESSION_TOKEN_LENGTH);
        self.store.create_session(Session::new(
            token.clone(),
            user.id,
            self.session_ttl_hours,
        ));

        info!(username = %user.username, "user logged in");
        Ok((token, user))
    }

    pub fn logout(&self, token: &str) -> bool {
        self.store.delete_session(token)
    }

    /// Identity resolution for bearer tokens. Expired sessions resolve to
    /// anonymous and are deleted on the spot.
    pub fn resolve_token(&self, token: &str) -> Option<User> {
        let session = self.store.get_session(token)?;
        if session.is_expired(Utc::now()) {
            self.store.delete_session(token);
            return None;
        }
        self.store.get_user(session.user_id)
    }

    pub fn purge_expired_sessions(&self) -> usize {
        self.store.purge_expired_sessions(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(Arc::new(Store::new()), 24)
    }

    fn register_payload(username: &str, email: &str) -> RegisterPayload {
        RegisterPayload {
            username: username.to_string(),
            email: email.to_string(),
            password: "Sturdy1Password".to_string(),
            role: None,
        }
    }

    #[test]
    fn register_login_resolve_round_trip() {
        let auth = service();
        let user = auth
            .register(register_payload("amina", "amina@example.com"))
            .unwrap();
        assert_eq!(user.role, UserRole::Student);

        let (token, logged_in) = auth
            .login(LoginPayload {
                email: "amina@example.com".to_string(),
                password: "Sturdy1Password".to_string(),
            })
            .unwrap();
        assert_eq!(logged_in.id, user.id);

        let resolved = auth.resolve_token(&token).unwrap();
        assert_eq!(resolved.id, user.id);

        assert!(auth.logout(&token));
        assert!(auth.resolve_token(&token).is_none());
    }

    #[test]
    fn duplicate_email_and_username_conflict() {
        let auth = service();
        auth.register(register_payload("amina", "amina@example.com"))
            .unwrap();

        let err = auth
            .register(register_payload("other", "amina@example.com"))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let err = auth
            .register(register_payload("amina", "other@example.com"))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn weak_password_is_rejected_before_any_mutation() {
        let auth = service();
        let err = auth
            .register(RegisterPayload {
                username: "weak".to_string(),
                email: "weak@example.com".to_string(),
                password: "alllowercase".to_string(),
                role: None,
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(auth.store.get_user_by_username("weak").is_none());
    }

    #[test]
    fn wrong_password_is_unauthorized() {
        let auth = service();
        auth.register(register_payload("amina", "amina@example.com"))
            .unwrap();
        let err = auth
            .login(LoginPayload {
                email: "amina@example.com".to_string(),
                password: "Wrong1Password".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[test]
    fn expired_session_resolves_to_anonymous() {
        let auth = AuthService::new(Arc::new(Store::new()), -1);
        auth.register(register_payload("amina", "amina@example.com"))
            .unwrap();
        let (token, _) = auth
            .login(LoginPayload {
                email: "amina@example.com".to_string(),
                password: "Sturdy1Password".to_string(),
            })
            .unwrap();

        assert!(auth.resolve_token(&token).is_none());
        // lazily deleted as well
        assert!(auth.store.get_session(&token).is_none());
    }
}
