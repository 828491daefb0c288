use crate::entities::{SqliteStore, dao::LoginSession, parse_timestamp};
use chrono::{DateTime, Utc};
use std::future::Future;

pub trait SessionStore: Send + Sync + 'static {
    fn insert_session(&self, session: LoginSession) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_session(&self, token: &str) -> impl Future<Output = Result<Option<LoginSession>, sqlx::Error>> + Send;
    fn delete_session(&self, token: &str) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Drop every session that expired before `now`; returns how many went.
    fn delete_expired_sessions(&self, now: DateTime<Utc>) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
}

impl SessionStore for SqliteStore {
    async fn insert_session(&self, session: LoginSession) -> Result<(), sqlx::Error> {
        let created_at = session.created_at.to_rfc3339();
        let expires_at = session.expires_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&session.token)
        .bind(&session.user_id)
        .bind(&created_at)
        .bind(&expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session(&self, token: &str) -> Result<Option<LoginSession>, sqlx::Error> {
        let row: Option<(String, String, String, String)> = sqlx::query_as(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(token, user_id, created_at, expires_at)| LoginSession {
            token,
            user_id,
            created_at: parse_timestamp(&created_at, "sessions.created_at"),
            expires_at: parse_timestamp(&expires_at, "sessions.expires_at"),
        }))
    }

    async fn delete_session(&self, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM sessions WHERE token = ?1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        // RFC 3339 strings in UTC compare correctly as text.
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?1")
            .bind(now.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
