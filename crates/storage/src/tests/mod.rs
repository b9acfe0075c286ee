//! Test utilities and module declarations for storage tests.

use keendreams_core::DreamRecord;
use tempfile::TempDir;

use crate::{DreamRepository, SqliteStore, StorageBackend};

#[expect(clippy::unwrap_used, reason = "test code")]
pub fn create_test_storage() -> (SqliteStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let storage = SqliteStore::new(&db_path).unwrap();
    (storage, temp_dir)
}

/// Both backends, so every behavioural test runs against each.
pub fn create_test_backends() -> (Vec<StorageBackend>, TempDir) {
    let (sqlite, temp_dir) = create_test_storage();
    (vec![StorageBackend::Sqlite(sqlite), StorageBackend::new_memory()], temp_dir)
}

pub fn create_test_repository(page_size: usize) -> DreamRepository {
    DreamRepository::new(StorageBackend::new_memory(), page_size)
}

pub fn create_test_dream(project_path: &str, id: &str, commit_hash: Option<&str>) -> DreamRecord {
    let mut dream = DreamRecord {
        id: id.to_owned(),
        project_path: project_path.to_owned(),
        project_name: project_path.rsplit('/').next().unwrap_or(project_path).to_owned(),
        timestamp: "2025-09-14T12:57:22Z".to_owned(),
        ..DreamRecord::default()
    };
    dream.context.summary = format!("Working on {id} in {project_path}");
    dream.metadata.commit_hash = commit_hash.map(ToOwned::to_owned);
    dream
}

mod kv_tests;
