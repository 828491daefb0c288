//! Identities, credential checks and login sessions.
//!
//! Every handler receives an [`Identity`] extracted from the session cookie.
//! Credential checks and session bookkeeping go through the [`AuthProvider`]
//! capability held in [`crate::state::AppState`]; [`SqliteStore`] is the
//! production implementation.

pub mod cookie;
pub mod extract;
pub mod password;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::entities::{LoginSession, SessionStore, SqliteStore, UserRecord, UserStore};

/// A logged-in user as seen by handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
}

/// The actor behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    User(AuthUser),
}

impl Identity {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Identity::User(u) => Some(u),
            Identity::Anonymous => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user().map(|u| u.id.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }
}

/// Data for a new account, already validated.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("a user with that username already exists")]
    UsernameTaken,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// The session lifetime pushes the expiry past the representable range.
    #[error("session lifetime of {0} is out of range")]
    SessionTtl(Duration),
}

/// Credential verification and session issuance.
#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    /// Create an account. Fails with [`AuthError::UsernameTaken`] on duplicates.
    async fn register(&self, user: NewUser) -> Result<AuthUser, AuthError>;

    /// `Ok(None)` for an unknown user and for a wrong password alike.
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<AuthUser>, AuthError>;

    /// Start a session for `user`; returns the session token.
    async fn open_session(&self, user: &AuthUser, ttl: Duration) -> Result<String, AuthError>;

    /// Resolve a token to its user. Expired sessions resolve to `None`.
    async fn resolve_session(&self, token: &str) -> Result<Option<AuthUser>, AuthError>;

    async fn close_session(&self, token: &str) -> Result<(), AuthError>;
}

#[async_trait]
impl AuthProvider for SqliteStore {
    async fn register(&self, user: NewUser) -> Result<AuthUser, AuthError> {
        let password_hash =
            password::hash_password(&user.password).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash,
            created_at: Utc::now(),
        };
        let auth_user = AuthUser { id: record.id.clone(), username: record.username.clone() };
        match self.insert_user(record).await {
            Ok(()) => {
                info!(user_id = %auth_user.id, username = %auth_user.username, "user registered");
                Ok(auth_user)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AuthError::UsernameTaken),
            Err(e) => Err(e.into()),
        }
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<AuthUser>, AuthError> {
        let Some(user) = self.get_user_by_username(username).await? else {
            debug!(username, "login attempt for unknown user");
            return Ok(None);
        };
        if !password::verify_password(password, &user.password_hash) {
            debug!(username, "login attempt with wrong password");
            return Ok(None);
        }
        Ok(Some(AuthUser { id: user.id, username: user.username }))
    }

    async fn open_session(&self, user: &AuthUser, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or(AuthError::SessionTtl(ttl))?;
        let pruned = self.delete_expired_sessions(now).await?;
        if pruned > 0 {
            debug!(pruned, "removed expired sessions");
        }
        let session = LoginSession {
            token: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            created_at: now,
            expires_at,
        };
        let token = session.token.clone();
        self.insert_session(session).await?;
        Ok(token)
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<AuthUser>, AuthError> {
        let Some(session) = self.get_session(token).await? else {
            return Ok(None);
        };
        if session.is_expired(Utc::now()) {
            self.delete_session(token).await?;
            return Ok(None);
        }
        Ok(self
            .get_user(&session.user_id)
            .await?
            .map(|u| AuthUser { id: u.id, username: u.username }))
    }

    async fn close_session(&self, token: &str) -> Result<(), AuthError> {
        self.delete_session(token).await?;
        Ok(())
    }
}
