//! Persistence layer for the filter keyword set and the sync position.

pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use memory::MemoryKeywordStore;
pub use traits::{KeywordStore, SyncStateStore};
