//! Persistence layer.
//!
//! [`SqliteStore`] owns the sqlx pool. Each table gets its own store trait
//! ([`CodeStore`], [`UserStore`], [`SessionStore`]) implemented for it, so
//! handlers only see the operations they need.
//!
//! All trait methods use `impl Future` in their signatures so no extra
//! `async-trait` crate is required at this layer.

pub mod code;
pub mod dao;
pub mod session;
pub mod user;

pub use dao::{CodeRecord, LoginSession, UserRecord};

pub use code::CodeStore;
pub use session::SessionStore;
pub use user::UserStore;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible SQLite URL, e.g. `"sqlite://codemate.db"`
    /// or `"sqlite::memory:"` for tests. An in-memory database only lives as
    /// long as its connection, so use `max_connections = 1` with it.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Fresh in-memory store with the schema applied.
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        Self::connect("sqlite::memory:", 1)
            .await
            .expect("in-memory sqlite store")
    }
}

/// Parse a stored RFC 3339 timestamp, falling back to now on bad data.
fn parse_timestamp(raw: &str, column: &'static str) -> DateTime<Utc> {
    raw.parse().unwrap_or_else(|e: chrono::ParseError| {
        tracing::warn!(raw = %raw, column, error = %e, "failed to parse timestamp; using now");
        Utc::now()
    })
}
