//! In-memory keyword store. Nothing survives a restart.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::DatabaseError;
use crate::store::traits::KeywordStore;

#[derive(Debug, Default)]
pub struct MemoryKeywordStore {
    keywords: RwLock<Vec<String>>,
}

impl MemoryKeywordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `keywords`, duplicates dropped.
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seeded: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.into();
            if !seeded.contains(&keyword) {
                seeded.push(keyword);
            }
        }
        Self {
            keywords: RwLock::new(seeded),
        }
    }
}

#[async_trait]
impl KeywordStore for MemoryKeywordStore {
    async fn list(&self) -> Result<Vec<String>, DatabaseError> {
        Ok(self.keywords.read().await.clone())
    }

    async fn upsert(&self, pattern: &str) -> Result<(), DatabaseError> {
        let mut keywords = self.keywords.write().await;
        if !keywords.iter().any(|k| k == pattern) {
            keywords.push(pattern.to_string());
        }
        Ok(())
    }

    async fn delete(&self, pattern: &str) -> Result<bool, DatabaseError> {
        let mut keywords = self.keywords.write().await;
        let before = keywords.len();
        keywords.retain(|k| k != pattern);
        Ok(keywords.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_contract_as_database_store() {
        let store = MemoryKeywordStore::new();
        store.upsert("b").await.unwrap();
        store.upsert("a").await.unwrap();
        store.upsert("b").await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["b", "a"]);

        assert!(store.delete("b").await.unwrap());
        assert!(!store.delete("b").await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn seeding_drops_duplicates() {
        let store = MemoryKeywordStore::with_keywords(["x", "y", "x"]);
        assert_eq!(store.list().await.unwrap(), vec!["x", "y"]);
    }
}
