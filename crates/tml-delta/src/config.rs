//! Tracker configuration.

use serde::{Deserialize, Serialize};

/// Policy switches for a [`DeltaTracker`](crate::DeltaTracker).
///
/// Every other merge rule is fixed; these two are the only choices a
/// transformation stage gets to make.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Let a delete cancel an insert from the same batch instead of failing
    /// with [`DeltaError::ContradictingEvent`](crate::DeltaError::ContradictingEvent).
    pub allow_contradicting_events: bool,

    /// Let the most recent values win when an inserted or updated slot is
    /// updated again. Inserts take the new value (and stay inserts); updates
    /// take both the supplied old and new value instead of keeping the
    /// batch's original old value.
    ///
    /// Observers then no longer see the true pre-batch value, which is only
    /// what a stage wants when it re-derives old values itself.
    pub prefer_most_recent_value: bool,
}

impl TrackerConfig {
    /// Strict defaults: contradictions fail, the first old value is kept.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Configuration that tolerates an insert being deleted again.
    pub fn contradiction_tolerant() -> Self {
        Self {
            allow_contradicting_events: true,
            ..Default::default()
        }
    }

    /// Configuration where repeated updates overwrite both values.
    pub fn most_recent_value() -> Self {
        Self {
            prefer_most_recent_value: true,
            ..Default::default()
        }
    }

    pub fn with_contradicting_events(mut self, allow: bool) -> Self {
        self.allow_contradicting_events = allow;
        self
    }

    pub fn with_most_recent_value(mut self, prefer: bool) -> Self {
        self.prefer_most_recent_value = prefer;
        self
    }
}
