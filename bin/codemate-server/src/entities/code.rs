use crate::entities::{SqliteStore, dao::CodeRecord, parse_timestamp};
use std::future::Future;

type CodeRow = (String, String, String, String, Option<String>, String);

pub trait CodeStore: Send + Sync + 'static {
    fn insert_code(&self, record: CodeRecord) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_code(&self, id: &str) -> impl Future<Output = Result<Option<CodeRecord>, sqlx::Error>> + Send;
    /// Records owned by `owner_id`, newest first.
    fn list_codes_by_owner(&self, owner_id: &str) -> impl Future<Output = Result<Vec<CodeRecord>, sqlx::Error>> + Send;
    /// Returns the number of rows removed (0 or 1).
    fn delete_code(&self, id: &str) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
    fn delete_codes_by_owner(&self, owner_id: &str) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
}

fn from_row((id, question, code_answer, language, owner_id, created_at): CodeRow) -> CodeRecord {
    CodeRecord {
        id,
        question,
        code_answer,
        language,
        owner_id,
        created_at: parse_timestamp(&created_at, "code_records.created_at"),
    }
}

impl CodeStore for SqliteStore {
    async fn insert_code(&self, record: CodeRecord) -> Result<(), sqlx::Error> {
        let created_at = record.created_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO code_records (id, question, code_answer, language, owner_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&record.id)
        .bind(&record.question)
        .bind(&record.code_answer)
        .bind(&record.language)
        .bind(&record.owner_id)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_code(&self, id: &str) -> Result<Option<CodeRecord>, sqlx::Error> {
        let row: Option<CodeRow> = sqlx::query_as(
            "SELECT id, question, code_answer, language, owner_id, created_at \
             FROM code_records WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(from_row))
    }

    async fn list_codes_by_owner(&self, owner_id: &str) -> Result<Vec<CodeRecord>, sqlx::Error> {
        let rows: Vec<CodeRow> = sqlx::query_as(
            "SELECT id, question, code_answer, language, owner_id, created_at \
             FROM code_records WHERE owner_id = ?1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn delete_code(&self, id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM code_records WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_codes_by_owner(&self, owner_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM code_records WHERE owner_id = ?1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::{UserRecord, UserStore};
    use chrono::{Duration, Utc};

    async fn user(store: &SqliteStore, id: &str) {
        store
            .insert_user(UserRecord {
                id: id.into(),
                username: format!("user-{id}"),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                password_hash: "h".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    fn record(id: &str, owner: Option<&str>, age_secs: i64) -> CodeRecord {
        CodeRecord {
            id: id.into(),
            question: format!("question {id}"),
            code_answer: format!("answer {id}"),
            language: "Python".into(),
            owner_id: owner.map(str::to_owned),
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[tokio::test]
    async fn insert_then_get_returns_same_fields() {
        let store = SqliteStore::in_memory().await;
        store.insert_code(record("a", None, 0)).await.unwrap();
        let got = store.get_code("a").await.unwrap().unwrap();
        assert_eq!(got.question, "question a");
        assert_eq!(got.code_answer, "answer a");
        assert_eq!(got.language, "Python");
        assert_eq!(got.owner_id, None);
        assert!(store.get_code("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listing_is_scoped_to_owner_and_newest_first() {
        let store = SqliteStore::in_memory().await;
        user(&store, "u1").await;
        user(&store, "u2").await;
        store.insert_code(record("old", Some("u1"), 60)).await.unwrap();
        store.insert_code(record("new", Some("u1"), 0)).await.unwrap();
        store.insert_code(record("theirs", Some("u2"), 0)).await.unwrap();
        store.insert_code(record("anon", None, 0)).await.unwrap();

        let ids: Vec<_> = store
            .list_codes_by_owner("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["new".to_owned(), "old".to_owned()]);
    }

    #[tokio::test]
    async fn delete_by_owner_leaves_other_owners_alone() {
        let store = SqliteStore::in_memory().await;
        user(&store, "u1").await;
        user(&store, "u2").await;
        store.insert_code(record("a", Some("u1"), 0)).await.unwrap();
        store.insert_code(record("b", Some("u1"), 0)).await.unwrap();
        store.insert_code(record("c", Some("u2"), 0)).await.unwrap();

        assert_eq!(store.delete_codes_by_owner("u1").await.unwrap(), 2);
        assert!(store.list_codes_by_owner("u1").await.unwrap().is_empty());
        assert_eq!(store.list_codes_by_owner("u2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_one_reports_rows_removed() {
        let store = SqliteStore::in_memory().await;
        store.insert_code(record("a", None, 0)).await.unwrap();
        store.insert_code(record("b", None, 0)).await.unwrap();
        assert_eq!(store.delete_code("a").await.unwrap(), 1);
        assert_eq!(store.delete_code("a").await.unwrap(), 0);
        assert!(store.get_code("b").await.unwrap().is_some());
    }
}
