//! Storage traits: the admin-managed filter rule set and the chat sync position.

use async_trait::async_trait;

use crate::error::DatabaseError;

/// Persistent set of filter patterns.
///
/// Each operation is atomic on its own; callers never need a transaction
/// spanning several calls.
#[async_trait]
pub trait KeywordStore: Send + Sync {
    /// All patterns, oldest first.
    async fn list(&self) -> Result<Vec<String>, DatabaseError>;

    /// Insert `pattern` if not already present.
    async fn upsert(&self, pattern: &str) -> Result<(), DatabaseError>;

    /// Remove `pattern`. Returns `false` when it was not stored.
    async fn delete(&self, pattern: &str) -> Result<bool, DatabaseError>;
}

/// Where the chat session resumes after a restart.
#[async_trait]
pub trait SyncStateStore: Send + Sync {
    /// Last stored sync token for `user_id`, if any.
    async fn load_sync_token(&self, user_id: &str) -> Result<Option<String>, DatabaseError>;

    /// Replace the stored sync token for `user_id`.
    async fn save_sync_token(&self, user_id: &str, token: &str) -> Result<(), DatabaseError>;
}
