//! In-memory registry of tracked jobs.
//!
//! The [`Registry`] holds one ordered job sequence per [`JobCategory`].
//! Each category sits behind its own lock so writes to one category are
//! linearized while categories stay independent. Readers take a
//! [`RegistrySnapshot`], an immutable copy-on-write view that never
//! observes a half-applied refresh.
//!
//! Refreshes are two-phase: [`Registry::begin_refresh`] reserves a ticket
//! before the remote fetch, [`Registry::apply_refresh`] installs the fetched
//! sequence only if no younger ticket has been applied in the meantime.
//! No lock is held while the fetch is in flight.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::category::JobCategory;
use crate::job::{JobId, JobRecord, JobStatus};
use crate::live::LiveSet;
use crate::progress::Progress;

// ---------------------------------------------------------------------------
// Refresh bookkeeping
// ---------------------------------------------------------------------------

/// Reservation for one refresh of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    category: JobCategory,
    seq: u64,
}

/// Result of [`Registry::apply_refresh`].
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The sequence was replaced; carries what changed.
    Applied(Vec<RegistryChange>),
    /// A younger refresh was already applied; the records were dropped.
    Stale,
    /// The registry is closed; nothing is applied any more.
    Closed,
}

impl RefreshOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// A per-job difference between two consecutive sequences of a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryChange {
    Added { job_id: JobId, status: JobStatus },
    StatusChanged { job_id: JobId, from: JobStatus, to: JobStatus },
    Removed { job_id: JobId, last_status: JobStatus },
}

/// Result of [`Registry::patch_progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    /// Identical to the stored progress.
    Unchanged,
    /// Counters moved backwards under the same total.
    Regressed,
    UnknownJob,
    /// The stored record is already terminal.
    NotLive,
    Closed,
}

#[derive(Debug, Default)]
struct CategoryState {
    records: Arc<Vec<JobRecord>>,
    issued: u64,
    applied: u64,
    loaded: bool,
    closed: bool,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Owned store of the five job sequences.
#[derive(Debug)]
pub struct Registry {
    categories: [RwLock<CategoryState>; 5],
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            categories: std::array::from_fn(|_| RwLock::new(CategoryState::default())),
        }
    }

    fn state(&self, category: JobCategory) -> &RwLock<CategoryState> {
        &self.categories[category.index()]
    }

    /// Reserve a refresh slot for `category`. Call before fetching.
    pub fn begin_refresh(&self, category: JobCategory) -> RefreshTicket {
        let mut state = self.state(category).write();
        state.issued += 1;
        RefreshTicket {
            category,
            seq: state.issued,
        }
    }

    /// Replace the category's sequence with `records`.
    ///
    /// The replacement is wholesale: jobs missing from `records` disappear
    /// and attached result payloads are dropped. The one thing carried
    /// over is the progress of a still-live job whose new record has none,
    /// since listings do not report progress. Duplicate ids keep their
    /// first occurrence.
    pub fn apply_refresh(&self, ticket: RefreshTicket, records: Vec<JobRecord>) -> RefreshOutcome {
        let mut state = self.state(ticket.category).write();
        if state.closed {
            return RefreshOutcome::Closed;
        }
        if ticket.seq <= state.applied {
            return RefreshOutcome::Stale;
        }

        let previous: HashMap<&JobId, &JobRecord> =
            state.records.iter().map(|r| (&r.job_id, r)).collect();

        let mut seen = HashSet::with_capacity(records.len());
        let mut next = Vec::with_capacity(records.len());
        let mut changes = Vec::new();

        for mut record in records {
            if !seen.insert(record.job_id.clone()) {
                continue;
            }
            match previous.get(&record.job_id) {
                Some(old) => {
                    if old.status != record.status {
                        changes.push(RegistryChange::StatusChanged {
                            job_id: record.job_id.clone(),
                            from: old.status,
                            to: record.status,
                        });
                    }
                    if record.progress.is_none() && record.is_live() {
                        record.progress = old.progress.clone();
                    }
                }
                None => changes.push(RegistryChange::Added {
                    job_id: record.job_id.clone(),
                    status: record.status,
                }),
            }
            next.push(record);
        }

        for old in state.records.iter() {
            if !seen.contains(&old.job_id) {
                changes.push(RegistryChange::Removed {
                    job_id: old.job_id.clone(),
                    last_status: old.status,
                });
            }
        }

        drop(previous);
        state.records = Arc::new(next);
        state.applied = ticket.seq;
        state.loaded = true;
        RefreshOutcome::Applied(changes)
    }

    /// Update the progress of one live job in place.
    ///
    /// Job count, order and every other field are left untouched.
    pub fn patch_progress(
        &self,
        category: JobCategory,
        job_id: &JobId,
        progress: Progress,
    ) -> PatchOutcome {
        let mut state = self.state(category).write();
        if state.closed {
            return PatchOutcome::Closed;
        }
        let Some(pos) = state.records.iter().position(|r| &r.job_id == job_id) else {
            return PatchOutcome::UnknownJob;
        };

        let current = &state.records[pos];
        if !current.is_live() {
            return PatchOutcome::NotLive;
        }
        if let Some(stored) = &current.progress {
            if *stored == progress {
                return PatchOutcome::Unchanged;
            }
            if progress.regresses_from(stored) {
                return PatchOutcome::Regressed;
            }
        }

        Arc::make_mut(&mut state.records)[pos].progress = Some(progress);
        PatchOutcome::Applied
    }

    /// Attach a fetched result payload to a job.
    ///
    /// Returns `false` when the job is no longer tracked (e.g. a refresh
    /// removed it while the fetch was in flight) or the registry is closed.
    pub fn attach_results(
        &self,
        category: JobCategory,
        job_id: &JobId,
        payload: serde_json::Value,
    ) -> bool {
        let mut state = self.state(category).write();
        if state.closed {
            return false;
        }
        let Some(pos) = state.records.iter().position(|r| &r.job_id == job_id) else {
            return false;
        };
        Arc::make_mut(&mut state.records)[pos].results = Some(payload);
        true
    }

    /// Current sequence of one category.
    pub fn records(&self, category: JobCategory) -> Arc<Vec<JobRecord>> {
        Arc::clone(&self.state(category).read().records)
    }

    /// Whether at least one refresh of `category` has been applied.
    pub fn is_loaded(&self, category: JobCategory) -> bool {
        self.state(category).read().loaded
    }

    /// Immutable view of every category.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut snapshot = RegistrySnapshot::default();
        for category in JobCategory::ALL {
            let state = self.state(category).read();
            snapshot.categories[category.index()] = Arc::clone(&state.records);
            snapshot.loaded[category.index()] = state.loaded;
        }
        snapshot
    }

    /// Scan the current state for queued or running jobs.
    pub fn live_set(&self) -> LiveSet {
        let mut live = LiveSet::default();
        for category in JobCategory::ALL {
            live.extend_from(category, &self.state(category).read().records);
        }
        live
    }

    /// Stop accepting writes. Idempotent.
    pub fn close(&self) {
        for category in JobCategory::ALL {
            self.state(category).write().closed = true;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.categories.iter().all(|c| c.read().closed)
    }
}

// ---------------------------------------------------------------------------
// RegistrySnapshot
// ---------------------------------------------------------------------------

/// Point-in-time copy of the registry for readers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrySnapshot {
    categories: [Arc<Vec<JobRecord>>; 5],
    loaded: [bool; 5],
}

impl RegistrySnapshot {
    pub fn category(&self, category: JobCategory) -> &[JobRecord] {
        &self.categories[category.index()]
    }

    pub fn get(&self, category: JobCategory, job_id: &str) -> Option<&JobRecord> {
        self.category(category)
            .iter()
            .find(|r| r.job_id.as_str() == job_id)
    }

    pub fn is_loaded(&self, category: JobCategory) -> bool {
        self.loaded[category.index()]
    }

    /// Total number of jobs across categories.
    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every record with its category, categories in [`JobCategory::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (JobCategory, &JobRecord)> {
        JobCategory::ALL
            .into_iter()
            .flat_map(move |c| self.category(c).iter().map(move |r| (c, r)))
    }

    pub fn live_set(&self) -> LiveSet {
        let mut live = LiveSet::default();
        for category in JobCategory::ALL {
            live.extend_from(category, self.category(category));
        }
        live
    }
}
