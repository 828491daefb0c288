use crate::entities::{SqliteStore, dao::UserRecord, parse_timestamp};
use std::future::Future;

type UserRow = (String, String, String, String, String, String, String);

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, email, password_hash, created_at";

pub trait UserStore: Send + Sync + 'static {
    fn insert_user(&self, user: UserRecord) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_user(&self, id: &str) -> impl Future<Output = Result<Option<UserRecord>, sqlx::Error>> + Send;
    fn get_user_by_username(&self, username: &str) -> impl Future<Output = Result<Option<UserRecord>, sqlx::Error>> + Send;
}

fn from_row(
    (id, username, first_name, last_name, email, password_hash, created_at): UserRow,
) -> UserRecord {
    UserRecord {
        id,
        username,
        first_name,
        last_name,
        email,
        password_hash,
        created_at: parse_timestamp(&created_at, "users.created_at"),
    }
}

impl UserStore for SqliteStore {
    async fn insert_user(&self, user: UserRecord) -> Result<(), sqlx::Error> {
        let created_at = user.created_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO users (id, username, first_name, last_name, email, password_hash, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(from_row))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(from_row))
    }
}
