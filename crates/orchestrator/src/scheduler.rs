//! Poll scheduler for the job registry.
//!
//! [`PollScheduler`] owns the cadences that keep the [`Registry`] in step
//! with the remote job service:
//!
//! - the **initial load**, retried with backoff before escalating once;
//! - the **baseline cycle**, a full refresh every 30s;
//! - the **live cycle**, a full refresh every 5s while any job is live;
//! - one **progress tap** per live job, polling its status every second.
//!
//! Every task hangs off one [`CancellationToken`]; [`PollScheduler::shutdown`]
//! cancels it, closes the registry and waits for the tasks to exit.
//! Registry changes are published on the [`EventBus`].

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use jobwatch_client::{JobService, JobServiceError};
use jobwatch_core::{
    JobCategory, JobKey, LiveSet, PatchOutcome, Progress, RefreshOutcome, Registry,
    RegistrySnapshot,
};
use jobwatch_events::{EventBus, JobEvent, TimedEvent};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::backoff::next_delay;
use crate::config::PollConfig;
use crate::error::InitialLoadError;

/// How long [`PollScheduler::shutdown`] waits for each task.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Bookkeeping for one running progress tap.
struct Tap {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Drives every poll cadence against one job service.
///
/// Created via [`PollScheduler::new`]; the returned `Arc` can be cheaply
/// cloned into the command dispatcher and presentation code.
pub struct PollScheduler {
    service: Arc<dyn JobService>,
    registry: Arc<Registry>,
    bus: Arc<EventBus>,
    config: PollConfig,
    /// Master cancellation token; every task holds a child of it.
    cancel: CancellationToken,
    taps: Mutex<HashMap<JobKey, Tap>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    /// Categories whose tap asked for an out-of-cycle refresh.
    refresh_tx: mpsc::UnboundedSender<JobCategory>,
    refresh_rx: Mutex<Option<mpsc::UnboundedReceiver<JobCategory>>>,
    initial_failure_reported: AtomicBool,
}

impl PollScheduler {
    pub fn new(service: Arc<dyn JobService>, bus: Arc<EventBus>, config: PollConfig) -> Arc<Self> {
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            service,
            registry: Arc::new(Registry::new()),
            bus,
            config,
            cancel: CancellationToken::new(),
            taps: Mutex::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
            refresh_tx,
            refresh_rx: Mutex::new(Some(refresh_rx)),
            initial_failure_reported: AtomicBool::new(false),
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn service(&self) -> &Arc<dyn JobService> {
        &self.service
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.registry.snapshot()
    }

    pub fn live_set(&self) -> LiveSet {
        self.registry.live_set()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimedEvent> {
        self.bus.subscribe()
    }

    /// Jobs that currently have a progress tap.
    pub fn tapped_jobs(&self) -> BTreeSet<JobKey> {
        self.taps
            .lock()
            .iter()
            .filter(|(_, tap)| !tap.handle.is_finished())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Spawn the driver: initial load, then the baseline and live cycles.
    ///
    /// Calling `start` more than once has no further effect.
    pub fn start(self: &Arc<Self>) {
        let Some(refresh_rx) = self.refresh_rx.lock().take() else {
            tracing::debug!("Poll scheduler already started");
            return;
        };

        let scheduler = Arc::clone(self);
        let driver = tokio::spawn(async move {
            tracing::info!("Starting poll scheduler");
            if let Err(e) = scheduler.initial_load().await {
                tracing::warn!(error = %e, "Continuing with partial registry");
            }

            // Checked under the tasks lock: shutdown either drains these
            // handles or they are never spawned.
            let mut tasks = scheduler.tasks.lock();
            if scheduler.cancel.is_cancelled() {
                return;
            }
            let baseline = Arc::clone(&scheduler);
            let live = Arc::clone(&scheduler);
            let requests = Arc::clone(&scheduler);
            tasks.extend([
                tokio::spawn(async move { baseline.run_baseline_loop().await }),
                tokio::spawn(async move { live.run_live_loop().await }),
                tokio::spawn(async move { requests.run_refresh_requests(refresh_rx).await }),
            ]);
        });
        self.tasks.lock().push(driver);
    }

    /// Load every category, retrying failed ones with backoff.
    ///
    /// Categories that fail are retried up to `initial_retries` times, and
    /// only those categories are fetched again. When some still fail, one
    /// [`JobEvent::InitialLoadFailed`] is published and the error returned.
    pub async fn initial_load(self: &Arc<Self>) -> Result<(), InitialLoadError> {
        let backoff = &self.config.initial_backoff;
        let mut pending = JobCategory::ALL.to_vec();
        let mut delay = backoff.initial_delay.min(backoff.max_delay);
        let mut attempt = 0u32;

        loop {
            let mut failed = Vec::new();
            let mut last_error = None;
            for category in pending {
                if let Err(e) = self.refresh_category(category).await {
                    tracing::warn!(
                        category = %category,
                        attempt,
                        error = %e,
                        "Initial load attempt failed"
                    );
                    last_error = Some(e.to_string());
                    failed.push(category);
                }
            }

            if self.cancel.is_cancelled() {
                return Err(InitialLoadError::Cancelled);
            }
            if failed.is_empty() {
                tracing::info!(
                    jobs = self.registry.snapshot().len(),
                    retries = attempt,
                    "Initial load complete"
                );
                return Ok(());
            }
            if attempt >= self.config.initial_retries {
                return Err(self.escalate(failed, last_error.unwrap_or_default()));
            }

            attempt += 1;
            tracing::info!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                pending = failed.len(),
                "Retrying initial load"
            );
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(InitialLoadError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            delay = next_delay(delay, backoff);
            pending = failed;
        }
    }

    fn escalate(&self, categories: Vec<JobCategory>, message: String) -> InitialLoadError {
        tracing::error!(
            categories = ?categories,
            error = %message,
            "Initial load failed after retries"
        );
        if !self.initial_failure_reported.swap(true, Ordering::SeqCst) {
            self.bus.publish(JobEvent::InitialLoadFailed {
                categories: categories.clone(),
                message: message.clone(),
            });
        }
        InitialLoadError::Failed {
            categories,
            message,
        }
    }

    /// Fetch one category and replace its records.
    ///
    /// Returns the registry's verdict; [`RefreshOutcome::Closed`] also
    /// covers a fetch abandoned by shutdown. Fetch errors are returned
    /// untouched and leave the registry as it was.
    pub async fn refresh_category(
        self: &Arc<Self>,
        category: JobCategory,
    ) -> Result<RefreshOutcome, JobServiceError> {
        let ticket = self.registry.begin_refresh(category);
        let records = tokio::select! {
            _ = self.cancel.cancelled() => return Ok(RefreshOutcome::Closed),
            result = self.service.list(category) => result?,
        };

        let outcome = self.registry.apply_refresh(ticket, records);
        match &outcome {
            RefreshOutcome::Applied(changes) => {
                for change in changes {
                    self.bus.publish(JobEvent::from_change(category, change.clone()));
                }
                let records = self.registry.records(category);
                let live_count = records.iter().filter(|r| r.is_live()).count();
                self.bus.publish(JobEvent::CategoryRefreshed {
                    category,
                    job_count: records.len(),
                    live_count,
                });
                tracing::debug!(
                    category = %category,
                    jobs = records.len(),
                    live = live_count,
                    changes = changes.len(),
                    "Category refreshed"
                );
                self.reconcile_taps();
            }
            RefreshOutcome::Stale => {
                tracing::debug!(category = %category, "Discarded stale listing");
            }
            RefreshOutcome::Closed => {}
        }
        Ok(outcome)
    }

    /// Refresh every category in turn. Failures are logged and published,
    /// and the category keeps its last known records.
    ///
    /// Returns the categories that failed.
    pub async fn refresh_all(self: &Arc<Self>) -> Vec<JobCategory> {
        let mut failed = Vec::new();
        for category in JobCategory::ALL {
            if self.cancel.is_cancelled() {
                break;
            }
            if let Err(e) = self.refresh_category(category).await {
                tracing::warn!(
                    category = %category,
                    error = %e,
                    "Refresh failed, keeping last known jobs"
                );
                self.bus.publish(JobEvent::RefreshFailed {
                    category,
                    error: e.to_string(),
                });
                failed.push(category);
            }
        }
        failed
    }

    /// One tick of the live cycle: a full refresh if any job is live.
    ///
    /// Returns whether a refresh ran.
    pub async fn live_tick(self: &Arc<Self>) -> bool {
        if self.registry.live_set().is_empty() {
            return false;
        }
        self.refresh_all().await;
        true
    }

    /// Gracefully stop every cycle and tap.
    ///
    /// Closes the registry first, so nothing is applied once this has
    /// begun, then cancels the master token and waits up to 5 seconds per
    /// task.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down poll scheduler");
        self.registry.close();
        self.cancel.cancel();

        let taps: Vec<Tap> = self.taps.lock().drain().map(|(_, tap)| tap).collect();
        for tap in &taps {
            tap.cancel.cancel();
        }
        futures::future::join_all(
            taps.into_iter()
                .map(|tap| tokio::time::timeout(SHUTDOWN_TIMEOUT, tap.handle)),
        )
        .await;

        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await;
        }

        tracing::info!("Poll scheduler shut down complete");
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // ---- cycles ----

    async fn run_baseline_loop(self: Arc<Self>) {
        let period = self.config.baseline_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    tracing::debug!("Baseline cycle");
                    self.refresh_all().await;
                }
            }
        }
        tracing::debug!("Baseline cycle stopped");
    }

    async fn run_live_loop(self: Arc<Self>) {
        let period = self.config.live_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if self.live_tick().await {
                        tracing::debug!("Live cycle refreshed");
                    }
                }
            }
        }
        tracing::debug!("Live cycle stopped");
    }

    /// Serve refresh requests raised by taps, coalescing bursts.
    async fn run_refresh_requests(
        self: Arc<Self>,
        mut requests: mpsc::UnboundedReceiver<JobCategory>,
    ) {
        loop {
            let first = tokio::select! {
                _ = self.cancel.cancelled() => break,
                next = requests.recv() => match next {
                    Some(category) => category,
                    None => break,
                },
            };

            let mut pending = BTreeSet::from([first]);
            while let Ok(category) = requests.try_recv() {
                pending.insert(category);
            }
            for category in pending {
                if let Err(e) = self.refresh_category(category).await {
                    tracing::warn!(category = %category, error = %e, "Requested refresh failed");
                }
            }
        }
    }

    // ---- progress taps ----

    /// Align the running taps with the current live set: stop taps of
    /// jobs that left it, start taps for jobs that joined it.
    fn reconcile_taps(self: &Arc<Self>) {
        let Some(period) = self.config.tap_interval else {
            return;
        };
        let live = self.registry.live_set();

        let mut taps = self.taps.lock();
        if self.cancel.is_cancelled() {
            return;
        }
        taps.retain(|key, tap| {
            let keep = live.contains(key) && !tap.handle.is_finished();
            if !keep {
                tap.cancel.cancel();
            }
            keep
        });

        for key in &live {
            if taps.contains_key(key) {
                continue;
            }
            let cancel = self.cancel.child_token();
            let handle = tokio::spawn(Arc::clone(self).run_tap(
                key.clone(),
                period,
                cancel.clone(),
            ));
            tracing::debug!(
                category = %key.category,
                job_id = %key.job_id,
                "Progress tap started"
            );
            taps.insert(key.clone(), Tap { cancel, handle });
        }
    }

    /// Poll one job's status until it stops being live or the tap is
    /// cancelled, patching its progress into the registry.
    async fn run_tap(self: Arc<Self>, key: JobKey, period: Duration, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = self.service.get_status(key.category, &key.job_id) => result,
            };

            match result {
                Ok(record) if record.is_live() => {
                    if let Some(progress) = record.progress {
                        self.apply_progress(&key, progress);
                    }
                }
                Ok(record) => {
                    tracing::debug!(
                        category = %key.category,
                        job_id = %key.job_id,
                        status = %record.status,
                        "Tapped job finished, requesting refresh"
                    );
                    self.request_refresh(key.category);
                    return;
                }
                Err(JobServiceError::NotFound(_)) => {
                    tracing::debug!(
                        category = %key.category,
                        job_id = %key.job_id,
                        "Tapped job vanished, requesting refresh"
                    );
                    self.request_refresh(key.category);
                    return;
                }
                Err(e) => {
                    tracing::debug!(
                        category = %key.category,
                        job_id = %key.job_id,
                        error = %e,
                        "Progress tap failed"
                    );
                }
            }
        }
    }

    fn apply_progress(&self, key: &JobKey, progress: Progress) {
        match self
            .registry
            .patch_progress(key.category, &key.job_id, progress.clone())
        {
            PatchOutcome::Applied => self.bus.publish(JobEvent::ProgressUpdated {
                category: key.category,
                job_id: key.job_id.clone(),
                progress,
            }),
            PatchOutcome::Regressed => {
                tracing::debug!(
                    category = %key.category,
                    job_id = %key.job_id,
                    "Ignored regressing progress"
                );
            }
            _ => {}
        }
    }

    fn request_refresh(&self, category: JobCategory) {
        if self.refresh_tx.send(category).is_err() {
            tracing::debug!(category = %category, "Refresh request dropped");
        }
    }
}
