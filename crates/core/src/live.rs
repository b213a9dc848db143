//! The set of jobs currently queued or running.

use std::collections::BTreeSet;

use crate::category::JobCategory;
use crate::job::{JobKey, JobRecord};

/// Jobs whose latest known status is `queued` or `running`.
///
/// Always derived from registry state, never mutated on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveSet {
    keys: BTreeSet<JobKey>,
}

impl LiveSet {
    /// Collect the live jobs of one category's records.
    pub(crate) fn extend_from(&mut self, category: JobCategory, records: &[JobRecord]) {
        self.keys.extend(
            records
                .iter()
                .filter(|r| r.is_live())
                .map(|r| JobKey::new(category, r.job_id.clone())),
        );
    }

    pub fn contains(&self, key: &JobKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobKey> {
        self.keys.iter()
    }
}

impl FromIterator<JobKey> for LiveSet {
    fn from_iter<I: IntoIterator<Item = JobKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a LiveSet {
    type Item = &'a JobKey;
    type IntoIter = std::collections::btree_set::Iter<'a, JobKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
