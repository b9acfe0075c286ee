use keendreams_core::{DreamRecord, ProjectSummary};

use super::{default_services, dream_payload};

fn bare_dream(project_path: &str, id: &str, commit_hash: Option<&str>) -> DreamRecord {
    let mut dream = DreamRecord {
        id: id.to_owned(),
        project_path: project_path.to_owned(),
        project_name: project_path.rsplit('/').next().unwrap_or(project_path).to_owned(),
        timestamp: "2025-09-14T12:57:22Z".to_owned(),
        ..DreamRecord::default()
    };
    dream.context.summary = "Short but valid summary text".to_owned();
    dream.metadata.commit_hash = commit_hash.map(ToOwned::to_owned);
    dream
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn cleanup_removes_low_quality_dreams_and_is_idempotent() {
    let svc = default_services();
    svc.dreams.ingest(dream_payload("/p/app", "dream_good", None)).await.unwrap();

    // No stored score: scored on the fly as 0.
    svc.repo.put_dream(&bare_dream("/p/app", "dream_bare", None)).await.unwrap();
    // Stored score wins over recomputation.
    let mut scored = bare_dream("/p/app", "dream_scored", None);
    scored.metadata.quality_score = Some(10);
    svc.repo.put_dream(&scored).await.unwrap();

    let report = svc.maintenance.cleanup().await.unwrap();
    assert!(report.success);
    assert_eq!(report.cleaned, 2);
    assert_eq!(report.message, "Cleaned 2 low-quality dreams");
    assert_eq!(svc.repo.count_dreams().await.unwrap(), 1);

    let again = svc.maintenance.cleanup().await.unwrap();
    assert_eq!(again.cleaned, 0);
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn deduplicate_keeps_first_and_skips_hashless_dreams() {
    let svc = default_services();
    svc.repo.put_dream(&bare_dream("/p/app", "dream_a", Some("abc123"))).await.unwrap();
    svc.repo.put_dream(&bare_dream("/p/app", "dream_b", Some("abc123"))).await.unwrap();
    svc.repo.put_dream(&bare_dream("/p/app", "dream_c", None)).await.unwrap();
    svc.repo.put_dream(&bare_dream("/p/app", "dream_d", None)).await.unwrap();
    svc.repo.put_dream(&bare_dream("/p/other", "dream_e", Some("abc123"))).await.unwrap();

    let report = svc.maintenance.deduplicate().await.unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(report.message, "Removed 1 duplicate dreams");
    assert!(svc.repo.get_dream("/p/app", "dream_a").await.unwrap().is_some());
    assert!(svc.repo.get_dream("/p/app", "dream_b").await.unwrap().is_none());
    assert!(svc.repo.get_dream("/p/app", "dream_c").await.unwrap().is_some());
    assert!(svc.repo.get_dream("/p/app", "dream_d").await.unwrap().is_some());
    assert!(svc.repo.get_dream("/p/other", "dream_e").await.unwrap().is_some());

    let again = svc.maintenance.deduplicate().await.unwrap();
    assert_eq!(again.removed, 0);
}

#[tokio::test]
#[expect(clippy::unwrap_used, reason = "test code")]
async fn rebuild_rewrites_summaries_and_drops_orphans() {
    let svc = default_services();
    let mut older = bare_dream("/p/app", "dream_old", None);
    older.timestamp = "2025-09-01T08:00:00Z".to_owned();
    older.metadata.duration_hours = Some(1.5);
    let mut newer = bare_dream("/p/app", "dream_new", None);
    newer.timestamp = "2025-09-10T08:00:00Z".to_owned();
    newer.metadata.duration_hours = Some(0.5);
    // Key order puts dream_new before dream_old; recency decides.
    svc.repo.put_dream(&newer).await.unwrap();
    svc.repo.put_dream(&older).await.unwrap();

    let orphan = ProjectSummary { path: "/p/gone".to_owned(), ..ProjectSummary::default() };
    svc.repo.put_project(&orphan).await.unwrap();

    let report = svc.maintenance.rebuild_project_summaries().await.unwrap();
    assert_eq!(report.rebuilt, 1);
    assert_eq!(report.removed, 1);

    let summary = svc.repo.get_project("/p/app").await.unwrap().unwrap();
    assert_eq!(summary.last_dream, "dream_new");
    assert_eq!(summary.dream_count, 2);
    assert!((summary.total_dev_hours - 2.0).abs() < f64::EPSILON);
    assert!(svc.repo.get_project("/p/gone").await.unwrap().is_none());
}
