use chrono::{DateTime, Utc};
use serde::Serialize;

/// A row in the `code_records` table.
///
/// Rows are written once and never updated; `id` doubles as the share token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeRecord {
    pub id: String,
    /// Source code exactly as the user submitted it.
    pub question: String,
    pub code_answer: String,
    pub language: String,
    /// `None` for anonymous submissions.
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
