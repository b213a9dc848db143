//! Registry behaviour across refreshes, progress patches and snapshots.

use chrono::{TimeZone, Utc};
use jobwatch_core::{
    JobCategory, JobId, JobKey, JobRecord, JobStatus, PatchOutcome, Progress, RefreshOutcome,
    Registry, RegistryChange,
};

fn record(id: &str, status: JobStatus) -> JobRecord {
    JobRecord::new(id, status, Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap())
}

fn progress(current: u64, total: u64) -> Progress {
    Progress {
        current: Some(current),
        total: Some(total),
        percentage: Some(current as f64 * 100.0 / total as f64),
        ..Progress::default()
    }
}

fn refresh(registry: &Registry, category: JobCategory, records: Vec<JobRecord>) -> RefreshOutcome {
    let ticket = registry.begin_refresh(category);
    registry.apply_refresh(ticket, records)
}

fn ids(registry: &Registry, category: JobCategory) -> Vec<String> {
    registry
        .records(category)
        .iter()
        .map(|r| r.job_id.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Test: refresh replaces the sequence wholesale
// ---------------------------------------------------------------------------

#[test]
fn refresh_replaces_instead_of_merging() {
    let registry = Registry::new();
    refresh(
        &registry,
        JobCategory::Extraction,
        vec![
            record("a", JobStatus::Completed),
            record("b", JobStatus::Running),
            record("c", JobStatus::Failed),
        ],
    );

    let outcome = refresh(
        &registry,
        JobCategory::Extraction,
        vec![record("c", JobStatus::Failed), record("d", JobStatus::Queued)],
    );

    assert_eq!(ids(&registry, JobCategory::Extraction), vec!["c", "d"]);
    let RefreshOutcome::Applied(changes) = outcome else {
        panic!("expected applied refresh, got {outcome:?}");
    };
    assert_eq!(
        changes,
        vec![
            RegistryChange::Added {
                job_id: JobId::new("d"),
                status: JobStatus::Queued,
            },
            RegistryChange::Removed {
                job_id: JobId::new("a"),
                last_status: JobStatus::Completed,
            },
            RegistryChange::Removed {
                job_id: JobId::new("b"),
                last_status: JobStatus::Running,
            },
        ]
    );
}

#[test]
fn unloaded_category_reads_empty() {
    let registry = Registry::new();
    assert!(!registry.is_loaded(JobCategory::Scrape));
    assert!(registry.records(JobCategory::Scrape).is_empty());

    refresh(&registry, JobCategory::Scrape, vec![]);
    assert!(registry.is_loaded(JobCategory::Scrape));
    assert!(!registry.snapshot().is_loaded(JobCategory::Clean));
}

// ---------------------------------------------------------------------------
// Test: the live set is derived from queued and running jobs
// ---------------------------------------------------------------------------

#[test]
fn live_set_tracks_queued_and_running() {
    let registry = Registry::new();
    refresh(
        &registry,
        JobCategory::Extraction,
        vec![record("j1", JobStatus::Running), record("j0", JobStatus::Completed)],
    );
    refresh(&registry, JobCategory::Update, vec![record("u1", JobStatus::Queued)]);

    let live = registry.live_set();
    assert_eq!(live.len(), 2);
    assert!(live.contains(&JobKey::new(JobCategory::Extraction, "j1")));
    assert!(live.contains(&JobKey::new(JobCategory::Update, "u1")));
    assert!(!live.contains(&JobKey::new(JobCategory::Extraction, "j0")));

    refresh(&registry, JobCategory::Extraction, vec![record("j1", JobStatus::Cancelled)]);
    assert_eq!(registry.live_set().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: progress patches leave count and order unchanged
// ---------------------------------------------------------------------------

#[test]
fn progress_patch_keeps_count_and_order() {
    let registry = Registry::new();
    refresh(
        &registry,
        JobCategory::Extraction,
        vec![
            record("j0", JobStatus::Completed),
            record("j1", JobStatus::Running).with_progress(progress(3, 10)),
            record("j2", JobStatus::Queued),
        ],
    );
    let before = registry.snapshot();

    let outcome = registry.patch_progress(JobCategory::Extraction, &JobId::new("j1"), progress(7, 10));

    assert_eq!(outcome, PatchOutcome::Applied);
    assert_eq!(ids(&registry, JobCategory::Extraction), vec!["j0", "j1", "j2"]);
    let after = registry.snapshot();
    let j1 = after.get(JobCategory::Extraction, "j1").unwrap();
    assert_eq!(j1.progress.as_ref().unwrap().percentage, Some(70.0));
    assert_eq!(j1.status, JobStatus::Running);

    // Snapshots taken earlier never change.
    let old = before.get(JobCategory::Extraction, "j1").unwrap();
    assert_eq!(old.progress.as_ref().unwrap().percentage, Some(30.0));
}

#[test]
fn progress_patch_outcomes() {
    let registry = Registry::new();
    refresh(
        &registry,
        JobCategory::Clean,
        vec![
            record("c1", JobStatus::Running).with_progress(progress(7, 10)),
            record("c2", JobStatus::Completed),
        ],
    );
    let c1 = JobId::new("c1");

    assert_eq!(
        registry.patch_progress(JobCategory::Clean, &c1, progress(7, 10)),
        PatchOutcome::Unchanged
    );
    assert_eq!(
        registry.patch_progress(JobCategory::Clean, &c1, progress(2, 10)),
        PatchOutcome::Regressed
    );
    // A new total is a new phase; counters may restart.
    assert_eq!(
        registry.patch_progress(JobCategory::Clean, &c1, progress(1, 40)),
        PatchOutcome::Applied
    );
    assert_eq!(
        registry.patch_progress(JobCategory::Clean, &JobId::new("c2"), progress(1, 2)),
        PatchOutcome::NotLive
    );
    assert_eq!(
        registry.patch_progress(JobCategory::Clean, &JobId::new("nope"), progress(1, 2)),
        PatchOutcome::UnknownJob
    );
}

// ---------------------------------------------------------------------------
// Test: what a refresh carries over and what it drops
// ---------------------------------------------------------------------------

#[test]
fn refresh_carries_progress_of_live_jobs_only() {
    let registry = Registry::new();
    refresh(
        &registry,
        JobCategory::Infer,
        vec![
            record("t1", JobStatus::Running).with_progress(progress(4, 8)),
            record("t2", JobStatus::Running).with_progress(progress(1, 8)),
        ],
    );

    refresh(
        &registry,
        JobCategory::Infer,
        vec![record("t1", JobStatus::Running), record("t2", JobStatus::Completed)],
    );

    let snapshot = registry.snapshot();
    let t1 = snapshot.get(JobCategory::Infer, "t1").unwrap();
    assert_eq!(t1.progress.as_ref().unwrap().current, Some(4));
    assert!(snapshot.get(JobCategory::Infer, "t2").unwrap().progress.is_none());
}

#[test]
fn refresh_drops_attached_results() {
    let registry = Registry::new();
    refresh(&registry, JobCategory::Scrape, vec![record("j2", JobStatus::Completed)]);
    let payload = serde_json::json!({"valid_urls": 3});

    assert!(registry.attach_results(JobCategory::Scrape, &JobId::new("j2"), payload));
    assert!(registry.snapshot().get(JobCategory::Scrape, "j2").unwrap().results.is_some());

    refresh(&registry, JobCategory::Scrape, vec![record("j2", JobStatus::Completed)]);
    assert!(registry.snapshot().get(JobCategory::Scrape, "j2").unwrap().results.is_none());
    assert!(!registry.attach_results(
        JobCategory::Scrape,
        &JobId::new("gone"),
        serde_json::Value::Null
    ));
}

// ---------------------------------------------------------------------------
// Test: applying the same listing twice changes nothing
// ---------------------------------------------------------------------------

#[test]
fn repeated_refresh_is_idempotent() {
    let registry = Registry::new();
    let listing = || {
        vec![
            record("a", JobStatus::Running),
            record("b", JobStatus::Completed),
        ]
    };
    refresh(&registry, JobCategory::Clean, listing());
    registry.patch_progress(JobCategory::Clean, &JobId::new("a"), progress(2, 5));

    let first = refresh(&registry, JobCategory::Clean, listing());
    let after_first = registry.snapshot();
    let second = refresh(&registry, JobCategory::Clean, listing());

    assert_eq!(first, RefreshOutcome::Applied(vec![]));
    assert_eq!(second, RefreshOutcome::Applied(vec![]));
    assert_eq!(registry.snapshot(), after_first);
    let a = after_first.get(JobCategory::Clean, "a").unwrap();
    assert_eq!(a.progress.as_ref().unwrap().current, Some(2));
}
