use super::create_test_backends;
use crate::{KvStore as _, Namespace};

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn put_get_delete_round_trip() {
    let (backends, _temp_dir) = create_test_backends();
    for store in backends {
        assert!(store.get(Namespace::Dreams, "dream:/p:a").await.unwrap().is_none());

        store.put(Namespace::Dreams, "dream:/p:a", "{}").await.unwrap();
        store.put(Namespace::Dreams, "dream:/p:a", "{\"id\":\"a\"}").await.unwrap();
        assert_eq!(
            store.get(Namespace::Dreams, "dream:/p:a").await.unwrap().as_deref(),
            Some("{\"id\":\"a\"}"),
            "{} backend must overwrite",
            store.kind()
        );

        assert!(store.delete(Namespace::Dreams, "dream:/p:a").await.unwrap());
        assert!(!store.delete(Namespace::Dreams, "dream:/p:a").await.unwrap());
    }
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn namespaces_are_isolated() {
    let (backends, _temp_dir) = create_test_backends();
    for store in backends {
        store.put(Namespace::Cache, "stats_v2_cache", "1").await.unwrap();
        assert!(store.get(Namespace::Dreams, "stats_v2_cache").await.unwrap().is_none());
        let page = store.list(Namespace::Projects, "", None, 10).await.unwrap();
        assert!(page.keys.is_empty());
        assert!(page.list_complete);
    }
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn list_paginates_in_key_order() {
    let (backends, _temp_dir) = create_test_backends();
    for store in backends {
        for i in 0..5 {
            store.put(Namespace::Dreams, &format!("dream:/p:{i}"), "{}").await.unwrap();
        }
        store.put(Namespace::Dreams, "other:/p:9", "{}").await.unwrap();

        let first = store.list(Namespace::Dreams, "dream:", None, 2).await.unwrap();
        assert_eq!(first.keys, vec!["dream:/p:0", "dream:/p:1"]);
        assert!(!first.list_complete);

        let second =
            store.list(Namespace::Dreams, "dream:", first.cursor.as_deref(), 2).await.unwrap();
        assert_eq!(second.keys, vec!["dream:/p:2", "dream:/p:3"]);

        let third =
            store.list(Namespace::Dreams, "dream:", second.cursor.as_deref(), 2).await.unwrap();
        assert_eq!(third.keys, vec!["dream:/p:4"]);
        assert!(third.list_complete);
        assert!(third.cursor.is_none());
    }
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn exact_page_boundary_is_complete() {
    let (backends, _temp_dir) = create_test_backends();
    for store in backends {
        store.put(Namespace::Projects, "project:/a", "{}").await.unwrap();
        store.put(Namespace::Projects, "project:/b", "{}").await.unwrap();
        let page = store.list(Namespace::Projects, "project:", None, 2).await.unwrap();
        assert_eq!(page.keys.len(), 2);
        assert!(page.list_complete);
    }
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn prefix_match_is_case_sensitive_and_literal() {
    let (backends, _temp_dir) = create_test_backends();
    for store in backends {
        store.put(Namespace::Dreams, "dream:/P:x", "{}").await.unwrap();
        store.put(Namespace::Dreams, "dream:/p%:y", "{}").await.unwrap();
        store.put(Namespace::Dreams, "dream:/pq:z", "{}").await.unwrap();

        let lower = store.list(Namespace::Dreams, "dream:/p", None, 10).await.unwrap();
        assert_eq!(lower.keys, vec!["dream:/p%:y", "dream:/pq:z"], "{}", store.kind());

        let literal = store.list(Namespace::Dreams, "dream:/p%", None, 10).await.unwrap();
        assert_eq!(literal.keys, vec!["dream:/p%:y"], "{}", store.kind());
    }
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn sqlite_data_survives_reopen() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let db_path = temp_dir.path().join("reopen.db");
    {
        let store = crate::SqliteStore::new(&db_path).unwrap();
        store.put(Namespace::Projects, "project:/p", "{}").await.unwrap();
    }
    let store = crate::SqliteStore::new(&db_path).unwrap();
    assert!(store.get(Namespace::Projects, "project:/p").await.unwrap().is_some());
}
