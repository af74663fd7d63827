//! Personnel registry access.
//!
//! The registry is the external system of record: records are created by the
//! payroll process before this service ever sees them. The auth core only
//! looks users up by email and populates `password_hash` once.

mod models;
mod repository;

use anyhow::Result;
use async_trait::async_trait;

pub use models::{Role, UserInfo, UserRecord};
pub use repository::PersonnelRepository;

/// Lookup/update contract against the personnel registry.
#[async_trait]
pub trait PersonnelStore: Send + Sync {
    /// Find a record by email. Emails are unique and matched as stored
    /// (case-sensitive).
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Persist the password hash on an existing record and return the
    /// updated record.
    async fn set_password_hash(&self, user_id: &str, hash: &str) -> Result<UserRecord>;
}
