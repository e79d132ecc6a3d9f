//! Shared state of one running batch.
//!
//! A `BatchRun` is created when a batch starts, shared by all workers through
//! an `Arc`, and consumed into a [`BatchReport`] once every worker is done.
//! Buckets and the completed counter sit behind one mutex so a progress
//! snapshot always matches the buckets it describes.

use crate::types::{BatchProgress, BatchReport, LookupOutcome, LookupResult};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use tracing::warn;

pub(crate) struct BatchRun {
    total: usize,
    started: Instant,
    state: Mutex<RunState>,
}

#[derive(Default)]
struct RunState {
    completed: usize,
    seen: HashSet<String>,
    report: BatchReport,
}

impl BatchRun {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            started: Instant::now(),
            state: Mutex::new(RunState {
                report: BatchReport {
                    total,
                    ..Default::default()
                },
                ..Default::default()
            }),
        }
    }

    /// Record one finished domain and emit the resulting progress.
    ///
    /// `on_progress` runs while the lock is held, so callers observe
    /// snapshots in strictly increasing order. A domain that was already
    /// recorded is ignored and yields `None`.
    pub(crate) fn record<F>(&self, result: LookupResult, on_progress: &F) -> Option<BatchProgress>
    where
        F: Fn(BatchProgress) + ?Sized,
    {
        let mut state = self.lock();

        if !state.seen.insert(result.domain.clone()) || state.completed >= self.total {
            warn!(domain = %result.domain, "ignoring duplicate result");
            return None;
        }

        let bucket = match result.outcome {
            LookupOutcome::Available => &mut state.report.available,
            LookupOutcome::Registered => &mut state.report.registered,
            LookupOutcome::Error => &mut state.report.errors,
        };
        bucket.push(result.domain.clone());
        state.report.results.push(result);
        state.completed += 1;

        let progress = BatchProgress {
            completed: state.completed,
            total: self.total,
        };
        on_progress(progress);
        Some(progress)
    }

    pub(crate) fn progress(&self) -> BatchProgress {
        BatchProgress {
            completed: self.lock().completed,
            total: self.total,
        }
    }

    /// Copy of the report gathered so far, for when the run is still shared.
    pub(crate) fn snapshot(&self) -> BatchReport {
        BatchReport {
            elapsed: self.started.elapsed(),
            ..self.lock().report.clone()
        }
    }

    /// Close the batch and hand out its report.
    pub(crate) fn finish(self) -> BatchReport {
        let elapsed = self.started.elapsed();
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        BatchReport {
            elapsed,
            ..state.report
        }
    }

    // A panicking progress callback must not lose the results gathered so far.
    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LookupError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_record_fills_buckets_and_counts() {
        let run = BatchRun::new(3);
        let calls = AtomicUsize::new(0);
        let on_progress = |_: BatchProgress| {
            calls.fetch_add(1, Ordering::SeqCst);
        };

        run.record(LookupResult::available("a.com"), &on_progress);
        run.record(LookupResult::registered("b.com", "ns1"), &on_progress);
        let last = run.record(
            LookupResult::error("c.com", &LookupError::network("refused")),
            &on_progress,
        );

        assert_eq!(
            last,
            Some(BatchProgress {
                completed: 3,
                total: 3
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let report = run.finish();
        assert_eq!(report.available, vec!["a.com"]);
        assert_eq!(report.registered, vec!["b.com"]);
        assert_eq!(report.errors, vec!["c.com"]);
        assert_eq!(report.classified(), 3);
    }

    #[test]
    fn test_duplicate_domain_is_ignored() {
        let run = BatchRun::new(2);
        let noop = |_: BatchProgress| {};
        assert!(run.record(LookupResult::available("a.com"), &noop).is_some());
        assert!(run.record(LookupResult::available("a.com"), &noop).is_none());
        assert_eq!(run.progress().completed, 1);
        assert_eq!(run.finish().available, vec!["a.com"]);
    }

    #[test]
    fn test_completed_never_exceeds_total() {
        let run = BatchRun::new(1);
        let noop = |_: BatchProgress| {};
        run.record(LookupResult::available("a.com"), &noop);
        assert!(run.record(LookupResult::available("b.com"), &noop).is_none());
        assert_eq!(run.progress().completed, 1);
    }
}
