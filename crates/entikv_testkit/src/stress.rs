//! Thread stress drivers.
//!
//! These hammer one table from many threads to check what the store
//! promises under contention: counter adds never lose an update, and
//! racing creates of one label commit exactly once.

use entikv_core::{AttributeRecord, CoreError, CreateOptions, EntityCollection, EntityItem};
use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};
use std::thread;
use std::time::{Duration, Instant};

/// Outcome tally of a stress run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressReport {
    /// Calls that returned `Ok`.
    pub committed: usize,
    /// Calls that returned an error.
    pub rejected: usize,
    /// Wall time of the whole run.
    pub elapsed: Duration,
}

impl StressReport {
    /// Every call made.
    pub fn attempts(&self) -> usize {
        self.committed + self.rejected
    }

    /// Calls per second, or zero for an instantaneous run.
    pub fn throughput(&self) -> f64 {
        match self.elapsed.as_secs_f64() {
            secs if secs > 0.0 => self.attempts() as f64 / secs,
            _ => 0.0,
        }
    }
}

/// Shape of a stress run.
#[derive(Debug, Clone, Copy)]
pub struct StressConfig {
    /// Threads started.
    pub threads: usize,
    /// Calls each thread makes.
    pub operations_per_thread: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            operations_per_thread: 250,
        }
    }
}

/// Calls `op(thread, iteration)` from `config.threads` scoped threads and
/// tallies the results.
pub fn run_concurrently<F>(config: &StressConfig, op: F) -> StressReport
where
    F: Fn(usize, usize) -> Result<(), CoreError> + Sync,
{
    let committed = AtomicUsize::new(0);
    let rejected = AtomicUsize::new(0);
    let began = Instant::now();

    thread::scope(|scope| {
        for worker in 0..config.threads {
            let op = &op;
            let tally = (&committed, &rejected);
            scope.spawn(move || {
                for i in 0..config.operations_per_thread {
                    let counter = if op(worker, i).is_ok() { tally.0 } else { tally.1 };
                    counter.fetch_add(1, Relaxed);
                }
            });
        }
    });

    StressReport {
        committed: committed.into_inner(),
        rejected: rejected.into_inner(),
        elapsed: began.elapsed(),
    }
}

/// Even-numbered threads increment `counter` on `item`; odd ones decrement.
pub fn stress_counter(
    collection: &EntityCollection,
    item: &EntityItem,
    counter: &str,
    config: &StressConfig,
) -> StressReport {
    run_concurrently(config, |worker, _| match worker % 2 {
        0 => collection.increment(item, counter),
        _ => collection.decrement(item, counter),
    })
}

/// Starts `threads` racing creates of one `label` under `parent`; returns
/// how many committed.
pub fn stress_label_race(
    collection: &EntityCollection,
    parent: Option<&EntityItem>,
    label: &str,
    threads: usize,
) -> usize {
    let once_each = StressConfig {
        threads,
        operations_per_thread: 1,
    };
    let report = run_concurrently(&once_each, |_, _| {
        collection
            .create(parent, AttributeRecord::new(label), CreateOptions::new())
            .map(drop)
    });
    report.committed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput_over_elapsed_time() {
        let report = StressReport {
            committed: 8,
            rejected: 2,
            elapsed: Duration::from_millis(500),
        };
        assert_eq!(report.attempts(), 10);
        assert!((report.throughput() - 20.0).abs() < 1e-9);

        let instant = StressReport {
            elapsed: Duration::ZERO,
            ..report
        };
        assert_eq!(instant.throughput(), 0.0);
    }

    #[test]
    fn outcomes_are_tallied_across_threads() {
        let config = StressConfig {
            threads: 4,
            operations_per_thread: 3,
        };
        let report = run_concurrently(&config, |worker, _| {
            if worker == 0 {
                Err(CoreError::unsupported("rename"))
            } else {
                Ok(())
            }
        });
        assert_eq!(report.committed, 9);
        assert_eq!(report.rejected, 3);
    }
}
