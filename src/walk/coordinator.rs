//! Walk coordinator - orchestrates the parallel walk pipeline
//!
//! The coordinator is responsible for:
//! - Building the bounded entries/results/errors queues
//! - Starting the filter pool and both output sinks
//! - Launching the root scan task
//! - Sequencing shutdown so every stage terminates exactly once
//!
//! Shutdown order is producer-to-consumer. Queue closing is expressed
//! through crossbeam sender-drop semantics: the entries and errors queues
//! disconnect when the last scan task exits (which is when the
//! outstanding-task counter reaches zero), and the results queue disconnects
//! when the last filter worker drains and drops its sender. The coordinator
//! then joins the sinks, so no thread outlives `run`.

use crate::config::WalkConfig;
use crate::error::{Result, ScanError, WalkerError};
use crate::walk::admission::{AdmissionGate, TaskTracker};
use crate::walk::filter::FilterPool;
use crate::walk::scanner::{spawn_root, ScanContext, ScanStats};
use crate::walk::sink::{spawn_error_printer, spawn_printer, SinkStats};
use crossbeam_channel::bounded;
use std::io::Write;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Result of a completed walk
#[derive(Debug)]
pub struct WalkResult {
    /// Directories enumerated (fully or until their first error)
    pub dirs_scanned: u64,

    /// Entries emitted by the scanners
    pub entries_seen: u64,

    /// Entries that passed the filters and were printed
    pub matched: u64,

    /// Non-fatal errors reported on the error stream
    pub errors: u64,

    /// Most scan tasks observed running at once
    pub peak_scan_tasks: usize,

    /// Wall-clock time for the walk
    pub duration: Duration,
}

/// Coordinates one parallel walk
pub struct WalkCoordinator {
    config: WalkConfig,
}

impl WalkCoordinator {
    pub fn new(config: WalkConfig) -> Self {
        Self { config }
    }

    /// Run the walk, streaming matching paths to `out` and error messages
    /// to `err_out`.
    ///
    /// Returns an error only when the root directory cannot be opened (or a
    /// pipeline thread cannot be spawned); every deeper failure is written
    /// to `err_out` and counted in the result.
    pub fn run<W, E>(self, out: W, err_out: E) -> Result<WalkResult>
    where
        W: Write + Send + 'static,
        E: Write + Send + 'static,
    {
        let start = Instant::now();
        let config = self.config;

        info!(
            root = %config.root,
            scan_tasks = config.scan_tasks,
            filter_workers = config.filter_workers,
            "Starting walk"
        );

        let (entries_tx, entries_rx) = bounded(config.queue_capacity);
        let (results_tx, results_rx) = bounded(config.queue_capacity);
        let (errors_tx, errors_rx) = bounded(config.queue_capacity);

        let admission = AdmissionGate::new(config.scan_tasks);
        let tracker = TaskTracker::new();
        let scan_stats = Arc::new(ScanStats::default());
        let sink_stats = Arc::new(SinkStats::default());

        // Consumers first: filter pool and sinks start waiting on their
        // queues before any producer runs.
        let filter_pool = FilterPool::spawn(
            config.filter_workers,
            config.filters,
            entries_rx,
            results_tx,
        )
        .map_err(|source| WalkerError::Spawn {
            name: "filter",
            source,
        })?;

        let printer = spawn_printer(results_rx, out, Arc::clone(&sink_stats))
            .map_err(|source| WalkerError::Spawn {
                name: "printer",
                source,
            })?;
        let error_printer = spawn_error_printer(errors_rx, err_out, Arc::clone(&sink_stats))
            .map_err(|source| WalkerError::Spawn {
                name: "err-printer",
                source,
            })?;

        // Root scan task. The context owns the only entries/errors senders;
        // they drop as scan tasks exit, closing both queues exactly when the
        // outstanding-task count reaches zero.
        let ctx = ScanContext {
            entries: entries_tx,
            errors: errors_tx,
            admission: admission.clone(),
            tracker: tracker.clone(),
            stats: Arc::clone(&scan_stats),
            handles: Arc::new(Mutex::new(Vec::new())),
        };
        let scan_handles = Arc::clone(&ctx.handles);

        let root = spawn_root(config.root.clone(), ctx).map_err(|source| WalkerError::Spawn {
            name: "scan-root",
            source,
        })?;

        // Every scan task has completed; no further spawns can happen.
        tracker.wait();
        debug!("Scan tree complete");

        let root_result = root.join().unwrap_or_else(|_| {
            Err(ScanError::Task {
                path: config.root.clone(),
                message: "root scan task panicked outside its guard".into(),
            })
        });

        // Child tasks have all completed; joining them just reaps threads.
        let handles = std::mem::take(
            &mut *scan_handles
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        for handle in handles {
            let _ = handle.join();
        }

        // Entries queue is now closed; the filter pool drains and its last
        // worker closes the results queue.
        filter_pool.join();
        debug!("Filter pool drained");

        // Both sinks observe their queues closed and exit.
        printer
            .join()
            .map_err(|_| WalkerError::WorkerPanic { name: "printer" })?;
        error_printer
            .join()
            .map_err(|_| WalkerError::WorkerPanic { name: "err-printer" })?;

        // Only a fatal root failure aborts the walk, and only after the
        // pipeline has fully unwound.
        root_result?;

        let result = WalkResult {
            dirs_scanned: scan_stats.dirs_scanned.load(Ordering::Relaxed),
            entries_seen: scan_stats.entries_seen.load(Ordering::Relaxed),
            matched: sink_stats.matched.load(Ordering::Relaxed),
            errors: sink_stats.errors.load(Ordering::Relaxed),
            peak_scan_tasks: admission.high_water(),
            duration: start.elapsed(),
        };

        info!(
            dirs = result.dirs_scanned,
            entries = result.entries_seen,
            matched = result.matched,
            errors = result.errors,
            peak_scan_tasks = result.peak_scan_tasks,
            duration_ms = result.duration.as_millis() as u64,
            "Walk completed"
        );

        Ok(result)
    }
}
