//! Advisory progress telemetry reported by remote workers.
//!
//! Any subset of the fields may be missing on any given poll. An empty
//! progress object is treated the same as no progress at all.

use serde::{Deserialize, Deserializer, Serialize};

use crate::timestamp::Timestamp;

/// Progress of a running job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Human-readable description of the current phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Completion percentage, 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    /// When the worker last reported progress.
    #[serde(
        default,
        with = "crate::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<Timestamp>,
}

impl Progress {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.message.is_none()
            && self.current.is_none()
            && self.total.is_none()
            && self.percentage.is_none()
            && self.timestamp.is_none()
    }

    /// Whether `self` moves backwards relative to `previous`.
    ///
    /// Only counters present on both sides are compared, and only while
    /// `total` is unchanged: a new total marks a new phase of work whose
    /// counters legitimately restart.
    pub fn regresses_from(&self, previous: &Progress) -> bool {
        if self.total != previous.total {
            return false;
        }
        let current_back = matches!(
            (self.current, previous.current),
            (Some(now), Some(before)) if now < before
        );
        let percentage_back = matches!(
            (self.percentage, previous.percentage),
            (Some(now), Some(before)) if now < before
        );
        current_back || percentage_back
    }

    /// Percentage clamped to 0-100, falling back to `current / total`.
    pub fn percent(&self) -> Option<f64> {
        self.percentage
            .or_else(|| match (self.current, self.total) {
                (Some(current), Some(total)) if total > 0 => {
                    Some(current as f64 / total as f64 * 100.0)
                }
                _ => None,
            })
            .map(|p| p.clamp(0.0, 100.0))
    }
}

/// Deserialize an optional progress object, mapping `{}` to `None`.
pub(crate) fn deserialize_non_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Progress>, D::Error> {
    let progress = Option::<Progress>::deserialize(deserializer)?;
    Ok(progress.filter(|p| !p.is_empty()))
}
