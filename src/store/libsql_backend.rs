//! libSQL store for filter keywords and the sync position. Supports local
//! file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{KeywordStore, SyncStateStore};

/// Keyword and sync-state store over the `filter_keywords` and `sync_state` tables.
///
/// `libsql::Connection` is `Send + Sync`, so one connection is shared by
/// every pipeline run.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db).await?;
        info!(path = %path.display(), "Database opened");
        Ok(store)
    }

    /// Create an in-memory database.
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;

        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[async_trait]
impl KeywordStore for LibSqlStore {
    async fn list(&self) -> Result<Vec<String>, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT keyword FROM filter_keywords ORDER BY rowid", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("list_keywords: {e}")))?;

        let mut keywords = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_keywords row: {e}")))?
        {
            let keyword: String = row
                .get(0)
                .map_err(|e| DatabaseError::Query(format!("list_keywords column: {e}")))?;
            keywords.push(keyword);
        }
        Ok(keywords)
    }

    async fn upsert(&self, pattern: &str) -> Result<(), DatabaseError> {
        let inserted = self
            .conn()
            .execute(
                "INSERT INTO filter_keywords (keyword) VALUES (?1) ON CONFLICT(keyword) DO NOTHING",
                params![pattern],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_keyword: {e}")))?;

        debug!(keyword = pattern, inserted = inserted > 0, "Keyword upserted");
        Ok(())
    }

    async fn delete(&self, pattern: &str) -> Result<bool, DatabaseError> {
        let removed = self
            .conn()
            .execute(
                "DELETE FROM filter_keywords WHERE keyword = ?1",
                params![pattern],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_keyword: {e}")))?;

        debug!(keyword = pattern, removed, "Keyword deleted");
        Ok(removed > 0)
    }
}

#[async_trait]
impl SyncStateStore for LibSqlStore {
    async fn load_sync_token(&self, user_id: &str) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT next_batch FROM sync_state WHERE user_id = ?1",
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("load_sync_token: {e}")))?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("load_sync_token row: {e}")))?;

        row.map(|row| row.get::<String>(0))
            .transpose()
            .map_err(|e| DatabaseError::Query(format!("load_sync_token column: {e}")))
    }

    async fn save_sync_token(&self, user_id: &str, token: &str) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO sync_state (user_id, next_batch) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET
                    next_batch = excluded.next_batch,
                    updated_at = datetime('now')",
                params![user_id, token],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_sync_token: {e}")))?;
        Ok(())
    }
}
