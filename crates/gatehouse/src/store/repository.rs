//! SQLite-backed personnel repository.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use super::models::{Role, UserRecord};
use super::PersonnelStore;

const RECORD_COLUMNS: &str =
    "id, name, email, password_hash, org_unit_id, document_id, role, created_at";

/// Repository over the registry mirror table.
#[derive(Debug, Clone)]
pub struct PersonnelRepository {
    pool: SqlitePool,
}

impl PersonnelRepository {
    /// Create a new personnel repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn generate_id() -> String {
        format!("emp_{}", nanoid::nanoid!(12))
    }

    /// Insert a record fed in from the payroll process.
    ///
    /// Only the `personnel` CLI conduit and tests call this; the auth core
    /// never creates records.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        org_unit_id: &str,
        document_id: &str,
        role: Role,
    ) -> Result<UserRecord> {
        let id = Self::generate_id();
        debug!("importing personnel record {} ({})", email, id);

        sqlx::query(
            r#"
            INSERT INTO personnel (id, name, email, org_unit_id, document_id, role)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(email)
        .bind(org_unit_id)
        .bind(document_id)
        .bind(role)
        .execute(&self.pool)
        .await
        .context("inserting personnel record")?;

        self.get(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("record not found after insert: {}", id))
    }

    /// Get a record by ID.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM personnel WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("fetching personnel record")?;

        Ok(record)
    }

    /// List records, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, limit: i64) -> Result<Vec<UserRecord>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM personnel ORDER BY created_at DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("listing personnel records")?;

        Ok(records)
    }
}

#[async_trait]
impl PersonnelStore for PersonnelRepository {
    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM personnel WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("fetching personnel record by email")?;

        Ok(record)
    }

    // No transaction spans the caller's read-then-write; concurrent writers
    // resolve last-write-wins at this UPDATE.
    #[instrument(skip(self, hash))]
    async fn set_password_hash(&self, user_id: &str, hash: &str) -> Result<UserRecord> {
        let result = sqlx::query("UPDATE personnel SET password_hash = ? WHERE id = ?")
            .bind(hash)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("updating password hash")?;

        if result.rows_affected() == 0 {
            anyhow::bail!("personnel record not found: {}", user_id);
        }

        self.get(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("record not found after update: {}", user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn test_repo() -> PersonnelRepository {
        let db = Database::in_memory().await.expect("in-memory db");
        PersonnelRepository::new(db.pool().clone())
    }

    #[tokio::test]
    async fn test_create_and_find_by_email() {
        let repo = test_repo().await;
        let created = repo
            .create("Alice", "alice@x.com", "ou_eng", "DOC-1", Role::Employee)
            .await
            .unwrap();
        assert!(created.id.starts_with("emp_"));
        assert!(created.password_hash.is_none());

        let found = repo.find_by_email("alice@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.role, Role::Employee);

        assert!(repo.find_by_email("bob@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let repo = test_repo().await;
        repo.create("Alice", "alice@x.com", "ou_eng", "DOC-1", Role::Employee)
            .await
            .unwrap();

        assert!(repo.find_by_email("Alice@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_password_hash() {
        let repo = test_repo().await;
        let created = repo
            .create("Alice", "alice@x.com", "ou_eng", "DOC-1", Role::Manager)
            .await
            .unwrap();

        let updated = repo
            .set_password_hash(&created.id, "$2b$10$somehash")
            .await
            .unwrap();
        assert_eq!(updated.password_hash.as_deref(), Some("$2b$10$somehash"));

        let missing = repo.set_password_hash("emp_missing", "$2b$10$x").await;
        assert!(missing.is_err());
    }
}
