// Copyright 2025 the Sala Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Progress reporting and cooperative cancellation.
//!
//! Long-running loops hold a [`ProgressPoller`] and call [`ProgressPoller::tick`] once per
//! record. The poller forwards progress to the [`Communicator`] and checks for cancellation
//! at most once per [`POLL_INTERVAL`], so that the check stays cheap inside tight loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{Result, SalaError};

/// Minimum wall time between two cancellation polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Kinds of progress message.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Number of top-level steps in a multi-step operation.
    NumSteps,
    /// Index of the current top-level step.
    CurrentStep,
    /// Number of records (points or shapes) to process in this step.
    NumRecords,
    /// Index of the record currently being processed.
    CurrentRecord,
}

/// Receiver of progress messages and source of cancellation.
pub trait Communicator {
    /// Report progress. The default implementation ignores it.
    fn post_message(&self, kind: Progress, value: usize) {
        let _ = (kind, value);
    }

    /// Whether the user asked to stop.
    fn is_cancelled(&self) -> bool;
}

/// Communicator that never cancels and discards progress.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Communicator backed by an atomic flag, for callers on another thread and for tests.
#[derive(Debug, Default)]
pub struct CancelFlag {
    cancelled: AtomicBool,
    /// Cancel automatically once this many records have been reported.
    cancel_after: Option<usize>,
}

impl CancelFlag {
    /// A flag that is initially clear.
    pub fn new() -> Self {
        Self::default()
    }

    /// A flag that trips itself when the given record index is reported.
    pub fn cancel_after(records: usize) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            cancel_after: Some(records),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl Communicator for CancelFlag {
    fn post_message(&self, kind: Progress, value: usize) {
        if kind == Progress::CurrentRecord
            && let Some(limit) = self.cancel_after
            && value >= limit
        {
            self.cancel();
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Time-debounced progress and cancellation helper.
pub struct ProgressPoller<'a> {
    comm: &'a dyn Communicator,
    last: Option<Instant>,
    interval: Duration,
}

impl core::fmt::Debug for ProgressPoller<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProgressPoller")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl<'a> ProgressPoller<'a> {
    /// Start a step of `records` records.
    pub fn new(comm: &'a dyn Communicator, records: usize) -> Self {
        comm.post_message(Progress::NumRecords, records);
        Self {
            comm,
            last: None,
            interval: POLL_INTERVAL,
        }
    }

    /// Use a different debounce interval (zero polls on every tick).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Report the current record; fails with [`SalaError::Cancelled`] when cancelled.
    pub fn tick(&mut self, record: usize) -> Result<()> {
        let now = Instant::now();
        let due = self
            .last
            .is_none_or(|t| now.duration_since(t) >= self.interval);
        if !due {
            return Ok(());
        }
        self.last = Some(now);
        self.comm.post_message(Progress::CurrentRecord, record);
        if self.comm.is_cancelled() {
            tracing::debug!(record, "cancellation observed");
            return Err(SalaError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_comm_never_cancels() {
        let mut p = ProgressPoller::new(&NoComm, 10).with_interval(Duration::ZERO);
        for i in 0..10 {
            assert!(p.tick(i).is_ok());
        }
    }

    #[test]
    fn cancel_after_trips_on_record() {
        let flag = CancelFlag::cancel_after(3);
        let mut p = ProgressPoller::new(&flag, 10).with_interval(Duration::ZERO);
        assert!(p.tick(0).is_ok());
        assert!(p.tick(2).is_ok());
        assert_eq!(p.tick(3), Err(SalaError::Cancelled));
    }

    #[test]
    fn first_tick_always_polls() {
        let flag = CancelFlag::new();
        flag.cancel();
        let mut p = ProgressPoller::new(&flag, 1);
        assert_eq!(p.tick(0), Err(SalaError::Cancelled));
    }
}
