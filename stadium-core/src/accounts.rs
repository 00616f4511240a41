use chrono::Utc;
use stadium_shared::Masked;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::credentials::{hash_password, verify_password};
use crate::identity::{NewUser, Registration, Role, Session, User};
use crate::repository::{SessionRepository, UserRepository};
use crate::{CoreError, CoreResult};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERNAME_LEN: usize = 150;

/// Registration, credential checks and session lifecycle.
pub struct AccountManager {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
}

impl AccountManager {
    pub fn new(users: Arc<dyn UserRepository>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { users, sessions }
    }

    /// Self-service sign-up. Only `stadium_owner` and `client` accounts can be
    /// created this way.
    pub async fn register(&self, registration: Registration) -> CoreResult<User> {
        let role: Role = registration.role.trim().parse()?;
        if role == Role::Admin {
            return Err(CoreError::ValidationError(
                "\"admin\" accounts cannot be self-registered.".to_string(),
            ));
        }

        let user = self
            .create_account(&registration.username, &registration.email, role, registration.password.expose())
            .await?;
        info!("Registered user {} as {}", user.username, user.role);
        Ok(user)
    }

    /// Provisions the operator's admin account unless the username is taken.
    /// Returns the existing user untouched in that case.
    pub async fn ensure_admin(&self, username: &str, email: &str, password: &str) -> CoreResult<User> {
        if let Some(existing) = self.users.find_by_username(username.trim()).await? {
            if !existing.is_admin() {
                warn!("Bootstrap admin {} exists without the admin role", existing.username);
            }
            return Ok(existing);
        }

        let user = self.create_account(username, email, Role::Admin, password).await?;
        info!("Provisioned admin {}", user.username);
        Ok(user)
    }

    async fn create_account(&self, username: &str, email: &str, role: Role, password: &str) -> CoreResult<User> {
        let username = username.trim().to_string();
        if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
            return Err(CoreError::ValidationError(format!(
                "username must be 1 to {} characters",
                MAX_USERNAME_LEN
            )));
        }
        let email = email.trim().to_string();
        if !email.is_empty() && !email.contains('@') {
            return Err(CoreError::ValidationError("Enter a valid email address.".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CoreError::ValidationError(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        if self.users.find_by_username(&username).await?.is_some() {
            return Err(CoreError::ValidationError(
                "A user with that username already exists.".to_string(),
            ));
        }

        self.users
            .create_user(NewUser {
                username,
                email,
                role,
                password_hash: Masked(hash_password(password)?),
            })
            .await
    }

    /// `None` for an unknown username or a wrong password alike.
    pub async fn authenticate(&self, username: &str, password: &str) -> CoreResult<Option<User>> {
        let user = match self.users.find_by_username(username.trim()).await? {
            Some(user) => user,
            None => return Ok(None),
        };
        if verify_password(password, user.password_hash.expose()) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn open_session(&self, user: &User, ttl_seconds: u64) -> CoreResult<Session> {
        let swept = self.sessions.delete_expired(Utc::now()).await?;
        if swept > 0 {
            debug!("Swept {} expired session(s)", swept);
        }

        let session = Session::open(user.id, ttl_seconds);
        self.sessions.create_session(&session).await?;
        info!("Opened session for user {}", user.username);
        Ok(session)
    }

    /// Resolves a live session to its user. Expired sessions are removed.
    pub async fn resolve_session(&self, session_id: Uuid) -> CoreResult<User> {
        let session = self
            .sessions
            .get_session(session_id)
            .await?
            .ok_or_else(|| CoreError::Unauthenticated("Invalid token.".to_string()))?;

        if session.is_expired_at(Utc::now()) {
            self.sessions.delete_session(session_id).await?;
            return Err(CoreError::Unauthenticated("Token has expired.".to_string()));
        }

        self.users
            .get_user(session.user_id)
            .await?
            .ok_or_else(|| CoreError::Unauthenticated("User inactive or deleted.".to_string()))
    }

    pub async fn close_session(&self, session_id: Uuid) -> CoreResult<()> {
        if !self.sessions.delete_session(session_id).await? {
            return Err(CoreError::Unauthenticated("Invalid token.".to_string()));
        }
        Ok(())
    }
}
