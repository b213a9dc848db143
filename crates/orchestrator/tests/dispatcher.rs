//! Integration tests for `CommandDispatcher`.

mod common;

use assert_matches::assert_matches;
use common::{record, scheduler, FakeJobService};
use jobwatch_client::{JobServiceError, StartConfig, StartRequest};
use jobwatch_core::{JobCategory, JobId, JobStatus};
use jobwatch_events::JobEvent;
use jobwatch_orchestrator::CommandDispatcher;

// ---------------------------------------------------------------------------
// Test: cancelling a running job shows up in the next snapshot
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cancel_refreshes_the_category() {
    let service = FakeJobService::new();
    service.set_jobs(JobCategory::Scrape, vec![record("j2", JobStatus::Running)]);
    let scheduler = scheduler(&service);
    scheduler.initial_load().await.unwrap();
    let dispatcher = CommandDispatcher::new(scheduler.clone());

    let ack = dispatcher
        .cancel(JobCategory::Scrape, &JobId::new("j2"))
        .await
        .unwrap();

    assert_eq!(ack.message.as_deref(), Some("Job 'j2' cancelled"));
    let snapshot = scheduler.snapshot();
    assert_eq!(
        snapshot.get(JobCategory::Scrape, "j2").unwrap().status,
        JobStatus::Cancelled
    );
    assert_eq!(service.list_count(JobCategory::Scrape), 2);
    assert_eq!(service.list_count(JobCategory::Extraction), 1);
    assert!(scheduler.live_set().is_empty());
}

// ---------------------------------------------------------------------------
// Test: cancelling a finished job fails and leaves the registry alone
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cancel_of_completed_job_is_rejected() {
    let service = FakeJobService::new();
    service.set_jobs(JobCategory::Scrape, vec![record("j2", JobStatus::Completed)]);
    let scheduler = scheduler(&service);
    scheduler.initial_load().await.unwrap();
    let dispatcher = CommandDispatcher::new(scheduler.clone());
    let before = scheduler.snapshot();

    let result = dispatcher.cancel(JobCategory::Scrape, &JobId::new("j2")).await;

    assert_matches!(result, Err(JobServiceError::InvalidState { ref job_id, .. }) if job_id == "j2");
    assert_eq!(scheduler.snapshot(), before);
    assert_eq!(service.list_count(JobCategory::Scrape), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_of_unknown_job_is_not_found() {
    let service = FakeJobService::new();
    let scheduler = scheduler(&service);
    scheduler.initial_load().await.unwrap();
    let dispatcher = CommandDispatcher::new(scheduler);

    let result = dispatcher.cancel(JobCategory::Clean, &JobId::new("ghost")).await;
    assert_matches!(result, Err(JobServiceError::NotFound(_)));
}

// ---------------------------------------------------------------------------
// Test: a failing follow-up refresh does not fail the command
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn command_succeeds_when_follow_up_refresh_fails() {
    let service = FakeJobService::new();
    service.set_jobs(JobCategory::Infer, vec![record("t1", JobStatus::Queued)]);
    let scheduler = scheduler(&service);
    scheduler.initial_load().await.unwrap();
    let dispatcher = CommandDispatcher::new(scheduler.clone());

    service.fail_lists(JobCategory::Infer, 1);
    let result = dispatcher.cancel(JobCategory::Infer, &JobId::new("t1")).await;

    assert!(result.is_ok());
    // Last known state survives until the next cycle.
    let snapshot = scheduler.snapshot();
    assert_eq!(
        snapshot.get(JobCategory::Infer, "t1").unwrap().status,
        JobStatus::Queued
    );
}

// ---------------------------------------------------------------------------
// Test: delete removes the job from the registry
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn delete_removes_job() {
    let service = FakeJobService::new();
    service.set_jobs(
        JobCategory::Update,
        vec![record("u1", JobStatus::Failed), record("u2", JobStatus::Completed)],
    );
    let scheduler = scheduler(&service);
    scheduler.initial_load().await.unwrap();
    let dispatcher = CommandDispatcher::new(scheduler.clone());
    let mut rx = scheduler.subscribe();

    dispatcher
        .delete(JobCategory::Update, &JobId::new("u1"))
        .await
        .unwrap();

    let snapshot = scheduler.snapshot();
    assert!(snapshot.get(JobCategory::Update, "u1").is_none());
    assert_eq!(snapshot.category(JobCategory::Update).len(), 1);
    assert_eq!(service.command_calls(), vec!["delete update/u1"]);

    let removed = rx.try_recv().unwrap().event;
    assert_matches!(
        removed,
        JobEvent::JobRemoved { job_id, last_status: JobStatus::Failed, .. } if job_id == "u1"
    );
}

// ---------------------------------------------------------------------------
// Test: fetched results are attached to the record
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn results_are_attached_and_published() {
    let service = FakeJobService::new();
    service.set_jobs(JobCategory::Scrape, vec![record("j2", JobStatus::Completed)]);
    let scheduler = scheduler(&service);
    scheduler.initial_load().await.unwrap();
    let dispatcher = CommandDispatcher::new(scheduler.clone());
    let mut rx = scheduler.subscribe();

    let payload = dispatcher
        .get_results(JobCategory::Scrape, &JobId::new("j2"))
        .await
        .unwrap();

    assert_eq!(payload["valid_urls"], 12);
    let snapshot = scheduler.snapshot();
    assert_eq!(
        snapshot.get(JobCategory::Scrape, "j2").unwrap().results.as_ref(),
        Some(&payload)
    );
    assert_matches!(
        rx.try_recv().unwrap().event,
        JobEvent::ResultsAttached { category: JobCategory::Scrape, .. }
    );

    // The next refresh replaces the record and drops the payload.
    scheduler.refresh_category(JobCategory::Scrape).await.unwrap();
    assert!(scheduler
        .snapshot()
        .get(JobCategory::Scrape, "j2")
        .unwrap()
        .results
        .is_none());
}

#[tokio::test(start_paused = true)]
async fn results_of_running_job_are_not_ready() {
    let service = FakeJobService::new();
    service.set_jobs(JobCategory::Clean, vec![record("c1", JobStatus::Running)]);
    let scheduler = scheduler(&service);
    scheduler.initial_load().await.unwrap();
    let dispatcher = CommandDispatcher::new(scheduler.clone());

    let result = dispatcher
        .get_results(JobCategory::Clean, &JobId::new("c1"))
        .await;

    assert_matches!(result, Err(JobServiceError::NotReady { ref detail, .. }) if detail.contains("running"));
    assert!(scheduler
        .snapshot()
        .get(JobCategory::Clean, "c1")
        .unwrap()
        .results
        .is_none());
}

// ---------------------------------------------------------------------------
// Test: a started job is tracked right away
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn started_job_is_tracked() {
    let service = FakeJobService::new();
    let scheduler = scheduler(&service);
    scheduler.initial_load().await.unwrap();
    let dispatcher = CommandDispatcher::new(scheduler.clone());

    let request = StartRequest::new(StartConfig::default_for(JobCategory::Infer))
        .with_job_id("trait_batch_7");
    let started = dispatcher.start(&request).await.unwrap();

    assert_eq!(started.job_id, "trait_batch_7");
    assert_eq!(started.status, JobStatus::Queued);
    let live = scheduler.live_set();
    assert_eq!(live.len(), 1);
    assert!(scheduler
        .snapshot()
        .get(JobCategory::Infer, "trait_batch_7")
        .is_some());

    let duplicate = dispatcher.start(&request).await;
    assert_matches!(duplicate, Err(JobServiceError::RemoteError { status: 409, .. }));
}

// ---------------------------------------------------------------------------
// Test: cancel-all refreshes every category
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cancel_all_refreshes_everything() {
    let service = FakeJobService::new();
    service.set_jobs(JobCategory::Extraction, vec![record("x1", JobStatus::Running)]);
    service.set_jobs(JobCategory::Update, vec![record("u1", JobStatus::Queued)]);
    let scheduler = scheduler(&service);
    scheduler.initial_load().await.unwrap();
    let dispatcher = CommandDispatcher::new(scheduler.clone());
    assert_eq!(scheduler.live_set().len(), 2);

    let ack = dispatcher.cancel_all_running().await.unwrap();

    assert_eq!(ack.message.as_deref(), Some("Cancelled 2 jobs"));
    assert!(scheduler.live_set().is_empty());
    for category in JobCategory::ALL {
        assert_eq!(service.list_count(category), 2);
    }
}
