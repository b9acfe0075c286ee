use keendreams_core::{DreamsConfig, ISSUE_SUMMARY_TOO_BRIEF, ProjectSummary};
use keendreams_storage::{KvStore as _, Namespace};
use serde_json::json;

use super::{create_test_services, default_services, dream_payload};
use crate::{IngestOutcome, LatestDream, ServiceError};

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn ingest_scores_and_stores_the_dream() {
    let svc = default_services();
    let outcome =
        svc.dreams.ingest(dream_payload("/home/dev/app", "dream_1", Some("abc123"))).await.unwrap();

    let IngestOutcome::Stored { dream_id, quality_score, storage_used } = outcome else {
        panic!("expected a stored dream, got {outcome:?}");
    };
    assert_eq!(dream_id, "dream_1");
    assert_eq!(quality_score, 60);
    assert!(storage_used.ends_with(" GB"));

    let stored = svc.repo.get_dream("/home/dev/app", "dream_1").await.unwrap().unwrap();
    assert_eq!(stored.metadata.quality_score, Some(60));
    assert_eq!(stored.metadata.duration_hours, Some(2.0));
    assert!(stored.metadata.size.is_some_and(|s| s > 0));
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn second_write_with_same_commit_is_a_duplicate() {
    let svc = default_services();
    svc.dreams.ingest(dream_payload("/p/app", "dream_1", Some("abc123"))).await.unwrap();

    let outcome = svc.dreams.ingest(dream_payload("/p/app", "dream_2", Some("abc123"))).await.unwrap();
    assert_eq!(outcome, IngestOutcome::Duplicate { existing_dream_id: "dream_1".to_owned() });
    assert_eq!(svc.repo.count_dreams().await.unwrap(), 1);
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn dreams_without_commit_hash_are_never_deduplicated() {
    let svc = default_services();
    svc.dreams.ingest(dream_payload("/p/app", "dream_1", None)).await.unwrap();
    let outcome = svc.dreams.ingest(dream_payload("/p/app", "dream_2", None)).await.unwrap();
    assert!(matches!(outcome, IngestOutcome::Stored { quality_score: 50, .. }));
    assert_eq!(svc.repo.count_dreams().await.unwrap(), 2);
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn same_commit_in_another_project_is_not_a_duplicate() {
    let svc = default_services();
    svc.dreams.ingest(dream_payload("/p/app", "dream_1", Some("abc123"))).await.unwrap();
    let outcome =
        svc.dreams.ingest(dream_payload("/p/app-two", "dream_2", Some("abc123"))).await.unwrap();
    assert!(matches!(outcome, IngestOutcome::Stored { .. }));
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn rewriting_an_existing_id_keeps_the_original() {
    let svc = default_services();
    svc.dreams.ingest(dream_payload("/p/app", "dream_1", None)).await.unwrap();

    let mut payload = dream_payload("/p/app", "dream_1", None);
    payload["context"]["summary"] = json!("A different summary that is long enough to pass.");
    let outcome = svc.dreams.ingest(payload).await.unwrap();
    assert_eq!(outcome, IngestOutcome::Duplicate { existing_dream_id: "dream_1".to_owned() });

    let stored = svc.repo.get_dream("/p/app", "dream_1").await.unwrap().unwrap();
    assert!(stored.context.summary.starts_with("Implemented the deploy pipeline"));
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn brief_summary_is_rejected_without_writing() {
    let svc = default_services();
    let mut payload = dream_payload("/p/app", "dream_1", None);
    payload["context"]["summary"] = json!("too short");

    let err = svc.dreams.ingest(payload).await.unwrap_err();
    let ServiceError::Validation(issues) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(issues, vec![ISSUE_SUMMARY_TOO_BRIEF.to_owned()]);
    assert_eq!(svc.repo.count_dreams().await.unwrap(), 0);
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn wrongly_typed_payload_becomes_a_validation_issue() {
    let svc = default_services();
    let err = svc.dreams.ingest(json!({ "context": { "techStack": "rust" } })).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref issues) if issues.len() == 1));
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn missing_id_is_generated() {
    let svc = default_services();
    let mut payload = dream_payload("/p/app", "unused", None);
    payload.as_object_mut().unwrap().remove("id");

    let IngestOutcome::Stored { dream_id, .. } = svc.dreams.ingest(payload).await.unwrap() else {
        panic!("expected a stored dream");
    };
    assert!(dream_id.starts_with("dream_"));
    assert!(svc.dreams.get_dream(&dream_id).await.unwrap().is_some());
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn quota_exceeded_rejects_the_write() {
    let config = DreamsConfig { storage_limit_bytes: 1000, ..DreamsConfig::default() };
    let svc = create_test_services(&config);
    svc.dreams.ingest(dream_payload("/p/app", "dream_1", None)).await.unwrap();

    let err = svc.dreams.ingest(dream_payload("/p/app", "dream_2", None)).await.unwrap_err();
    let ServiceError::QuotaExceeded(quota) = err else {
        panic!("expected quota error, got {err:?}");
    };
    assert!(!quota.has_space);
    assert_eq!(quota.limit_bytes, 1000);
    assert_eq!(svc.repo.count_dreams().await.unwrap(), 1);
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn project_summary_tracks_latest_dream_and_hours() {
    let svc = default_services();
    svc.dreams.ingest(dream_payload("/p/app", "dream_1", None)).await.unwrap();
    svc.dreams.ingest(dream_payload("/p/app", "dream_2", None)).await.unwrap();

    let summary: ProjectSummary = svc.repo.get_project("/p/app").await.unwrap().unwrap();
    assert_eq!(summary.last_dream, "dream_2");
    assert_eq!(summary.dream_count, 2);
    assert!((summary.total_dev_hours - 4.0).abs() < f64::EPSILON);
    assert_eq!(summary.tech_stack, vec!["rust", "axum"]);

    let projects = svc.dreams.list_projects().await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].path, "/p/app");
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn latest_dream_distinguishes_missing_project_and_dream() {
    let svc = default_services();
    assert_eq!(svc.dreams.latest_dream("/nowhere").await.unwrap(), LatestDream::ProjectNotFound);

    svc.dreams.ingest(dream_payload("/p/app", "dream_1", None)).await.unwrap();
    let LatestDream::Found(dream) = svc.dreams.latest_dream("/p/app").await.unwrap() else {
        panic!("expected the latest dream");
    };
    assert_eq!(dream.id, "dream_1");

    svc.repo.store().delete(Namespace::Dreams, "dream:/p/app:dream_1").await.unwrap();
    assert_eq!(svc.dreams.latest_dream("/p/app").await.unwrap(), LatestDream::DreamMissing);
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn summary_markdown_renders_latest_dream() {
    let svc = default_services();
    svc.dreams.ingest(dream_payload("/p/app", "dream_1", None)).await.unwrap();

    let markdown = svc.dreams.summary_markdown("/p/app").await.unwrap().unwrap();
    assert!(markdown.starts_with("# 🌙 Dream Context Restoration"));
    assert!(markdown.contains("## Project: app"));
    assert!(markdown.contains("- rust"));

    let missing = svc.dreams.summary_markdown("/other").await.unwrap();
    assert_eq!(missing, Err(LatestDream::ProjectNotFound));
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn list_dreams_pages_with_cursor() {
    let svc = default_services();
    for i in 0..5 {
        let mut payload = dream_payload("/p/app", &format!("dream_{i}"), None);
        payload["timestamp"] = json!(format!("2025-09-1{i}T10:00:00Z"));
        svc.dreams.ingest(payload).await.unwrap();
    }

    let first = svc.dreams.list_dreams(3, None).await.unwrap();
    assert_eq!(first.total, 3);
    assert!(first.has_more);
    let ids: Vec<&str> = first.dreams.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["dream_2", "dream_1", "dream_0"]);

    let second = svc.dreams.list_dreams(3, first.cursor.as_deref()).await.unwrap();
    assert_eq!(second.total, 2);
    assert!(!second.has_more);
}
