use chrono::{DateTime, Utc};

/// A row in the `sessions` table.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl LoginSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
