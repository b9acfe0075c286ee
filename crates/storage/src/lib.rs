//! Storage layer for KeenDreams
//!
//! A namespaced key-value contract ([`KvStore`]) with `SQLite` and in-memory
//! backends, plus the typed [`DreamRepository`] used by the service layer.

mod backend;
pub mod error;
pub mod keys;
mod memory;
#[cfg(feature = "sqlite")]
mod migrations;
mod repository;
#[cfg(feature = "sqlite")]
mod sqlite;
#[cfg(all(test, feature = "sqlite"))]
mod tests;
mod traits;

pub use backend::StorageBackend;
pub use error::StorageError;
pub use keys::Namespace;
pub use memory::MemoryStore;
pub use repository::{DreamPage, DreamRepository, StoredDream};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
pub use traits::{KeyPage, KvStore};
