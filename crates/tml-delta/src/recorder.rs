//! Change recording that starts cheap and escalates on demand.

use crate::change::{ChangeBlock, ChangeType};
use crate::config::TrackerConfig;
use crate::error::{DeltaError, Result};
use crate::log::AppendOnlyDeltaLog;
use crate::tracker::DeltaTracker;
use tml_tree::TreeError;
use tracing::debug;

enum Backend<T> {
    Log(AppendOnlyDeltaLog<T>),
    Tracker(DeltaTracker<T>),
}

/// Records one batch of changes.
///
/// Changes go to an [`AppendOnlyDeltaLog`] while they arrive in increasing
/// index order. The first change the log rejects switches the batch over to
/// a [`DeltaTracker`]: the tracker is reset to the batch's base size, the log
/// is replayed into it and the rejected change is applied on top.
pub struct ChangeRecorder<T> {
    config: TrackerConfig,
    base_size: usize,
    /// Target size while the batch is still on the log.
    log_size: usize,
    backend: Backend<T>,
}

impl<T: Clone + PartialEq> ChangeRecorder<T> {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            base_size: 0,
            log_size: 0,
            backend: Backend::Log(AppendOnlyDeltaLog::new()),
        }
    }

    /// Start a new batch over a collection of `size` elements.
    pub fn begin(&mut self, size: usize) {
        self.base_size = size;
        self.log_size = size;
        self.backend = Backend::Log(AppendOnlyDeltaLog::new());
    }

    pub fn insert(&mut self, start: usize, end: usize, new_value: Option<T>) -> Result<()> {
        self.record(ChangeBlock::new(ChangeType::Insert, start, end).with_values(None, new_value))
    }

    pub fn update(
        &mut self,
        start: usize,
        end: usize,
        old_value: Option<T>,
        new_value: Option<T>,
    ) -> Result<()> {
        self.record(ChangeBlock::new(ChangeType::Update, start, end).with_values(old_value, new_value))
    }

    pub fn delete(&mut self, start: usize, end: usize, old_value: Option<T>) -> Result<()> {
        self.record(ChangeBlock::new(ChangeType::Delete, start, end).with_values(old_value, None))
    }

    fn record(&mut self, block: ChangeBlock<T>) -> Result<()> {
        let log = match &mut self.backend {
            Backend::Tracker(tracker) => return tracker.apply_block(block),
            Backend::Log(log) => log,
        };
        check_bounds(&block, self.log_size)?;
        let accepted = log.add_change(
            block.change_type,
            block.start,
            block.end,
            block.old_value.clone(),
            block.new_value.clone(),
        );
        if accepted {
            match block.change_type {
                ChangeType::Insert => self.log_size += block.len(),
                ChangeType::Delete => self.log_size -= block.len(),
                ChangeType::Update => {}
            }
            return Ok(());
        }

        debug!(
            blocks = log.len(),
            start = block.start,
            end = block.end,
            "out-of-order change, escalating to delta tracker"
        );
        let mut tracker = DeltaTracker::with_config(self.config.clone());
        tracker.reset(self.base_size);
        tracker.merge_log(log)?;
        tracker.apply_block(block)?;
        self.backend = Backend::Tracker(tracker);
        Ok(())
    }

    /// Whether this batch has switched over to a tracker.
    pub fn is_escalated(&self) -> bool {
        matches!(self.backend, Backend::Tracker(_))
    }

    pub fn is_empty(&self) -> bool {
        match &self.backend {
            Backend::Log(log) => log.is_empty(),
            Backend::Tracker(tracker) => tracker.is_empty(),
        }
    }

    /// The batch's changes in replay order.
    pub fn blocks(&self) -> Vec<ChangeBlock<T>> {
        match &self.backend {
            Backend::Log(log) => log.blocks().cloned().collect(),
            Backend::Tracker(tracker) => tracker.blocks().collect(),
        }
    }

    /// Size of the collection after the recorded changes.
    pub fn target_size(&self) -> usize {
        match &self.backend {
            Backend::Log(_) => self.log_size,
            Backend::Tracker(tracker) => tracker.target_size(),
        }
    }
}

/// Reject a change a tracker over `size` target elements would reject.
fn check_bounds<T>(block: &ChangeBlock<T>, size: usize) -> Result<()> {
    let (start, end) = (block.start, block.end);
    if end < start {
        return Err(DeltaError::InvalidRange { start, end });
    }
    let out_of_range = match block.change_type {
        ChangeType::Insert if start > size => Some(start),
        ChangeType::Update | ChangeType::Delete if end > size => Some(end - 1),
        _ => None,
    };
    match out_of_range {
        Some(index) => Err(TreeError::OutOfRange { index, size }.into()),
        None => Ok(()),
    }
}

impl<T: Clone + PartialEq> Default for ChangeRecorder<T> {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}
