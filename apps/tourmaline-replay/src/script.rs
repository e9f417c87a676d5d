//! Mutation scripts.
//!
//! ```json
//! {
//!   "size": 5,
//!   "config": { "allow_contradicting_events": false },
//!   "ops": [
//!     { "op": "target_delete", "start": 1, "end": 3 },
//!     { "op": "target_insert", "start": 1, "end": 2, "new_value": "N" }
//!   ]
//! }
//! ```
//!
//! Without `size` the tracker is never reset and grows to fit whatever the
//! ops touch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tml_delta::{DeltaError, DeltaTracker, TrackerConfig};
use tracing::debug;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Tracker(#[from] DeltaError),

    #[error("Op {step} ({op}) failed: {source}")]
    Op {
        step: usize,
        op: &'static str,
        #[source]
        source: DeltaError,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptOp {
    TargetInsert {
        start: usize,
        end: usize,
        #[serde(default)]
        new_value: Option<Value>,
    },
    TargetUpdate {
        start: usize,
        end: usize,
        #[serde(default)]
        old_value: Option<Value>,
        #[serde(default)]
        new_value: Option<Value>,
    },
    TargetDelete {
        start: usize,
        end: usize,
        #[serde(default)]
        old_value: Option<Value>,
    },
    SourceInsert {
        index: usize,
    },
    SourceDelete {
        index: usize,
    },
    SourceRevert {
        index: usize,
    },
}

impl ScriptOp {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptOp::TargetInsert { .. } => "target_insert",
            ScriptOp::TargetUpdate { .. } => "target_update",
            ScriptOp::TargetDelete { .. } => "target_delete",
            ScriptOp::SourceInsert { .. } => "source_insert",
            ScriptOp::SourceDelete { .. } => "source_delete",
            ScriptOp::SourceRevert { .. } => "source_revert",
        }
    }

    pub fn apply(&self, tracker: &mut DeltaTracker<Value>) -> tml_delta::Result<()> {
        match self.clone() {
            ScriptOp::TargetInsert { start, end, new_value } => {
                tracker.target_insert(start, end, new_value)
            }
            ScriptOp::TargetUpdate {
                start,
                end,
                old_value,
                new_value,
            } => tracker.target_update(start, end, old_value, new_value),
            ScriptOp::TargetDelete { start, end, old_value } => {
                tracker.target_delete(start, end, old_value)
            }
            ScriptOp::SourceInsert { index } => tracker.source_insert(index),
            ScriptOp::SourceDelete { index } => tracker.source_delete(index),
            ScriptOp::SourceRevert { index } => tracker.source_revert(index),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub config: TrackerConfig,
    #[serde(default)]
    pub ops: Vec<ScriptOp>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// A fresh tracker for this script, reset to `size` when one is given.
    pub fn tracker(&self) -> DeltaTracker<Value> {
        let mut tracker = DeltaTracker::with_config(self.config.clone());
        if let Some(size) = self.size {
            tracker.reset(size);
        }
        tracker
    }

    /// Run every op, stopping at the first failure.
    pub fn run(&self) -> Result<DeltaTracker<Value>, ScriptError> {
        let mut tracker = self.tracker();
        for (step, op) in self.ops.iter().enumerate() {
            debug!(step, op = op.name(), "applying script op");
            op.apply(&mut tracker).map_err(|source| ScriptError::Op {
                step,
                op: op.name(),
                source,
            })?;
        }
        Ok(tracker)
    }
}
