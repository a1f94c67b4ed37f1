//! Directory scan tasks
//!
//! One ScanTask enumerates one directory: it opens an enumeration-only
//! handle, repeatedly fills a private 4 KiB buffer with raw records, parses
//! them, pushes every valid entry downstream, and spawns a child task for
//! every subdirectory. The logical recursion is unbounded; the admission
//! gate bounds how many tasks actually run (and hold descriptors) at once.
//!
//! Fault isolation: a panic anywhere inside a task is caught at the task
//! boundary and converted into an error carrying the task's path. Sibling
//! tasks and the overall walk are unaffected.

use crate::error::ScanError;
use crate::walk::admission::{AdmissionGate, TaskTracker};
use crate::walk::dirent::{parse_record, Entry, EntryType, Parsed};
use crate::walk::sys::{DirHandle, SCAN_BUF_LEN};
use crossbeam_channel::Sender;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::trace;

/// Sequence for child scan thread names, so dumps of a wide walk stay
/// legible ("scan-0", "scan-1", ...)
static SCAN_TASK_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Counters shared by every scan task
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Directories fully or partially enumerated
    pub dirs_scanned: AtomicU64,

    /// Entries pushed to the entries queue
    pub entries_seen: AtomicU64,
}

impl ScanStats {
    fn record_dir(&self) {
        self.dirs_scanned.fetch_add(1, Ordering::Relaxed);
    }

    fn record_entry(&self) {
        self.entries_seen.fetch_add(1, Ordering::Relaxed);
    }
}

/// Everything a scan task needs, cloned into each child task
#[derive(Clone)]
pub(crate) struct ScanContext {
    pub entries: Sender<Entry>,
    pub errors: Sender<ScanError>,
    pub admission: AdmissionGate,
    pub tracker: TaskTracker,
    pub stats: Arc<ScanStats>,
    /// Join handles of every spawned scan thread, drained by the
    /// coordinator after the tracker reports completion
    pub handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

/// Spawn the root scan task.
///
/// Unlike child tasks, the root reports its own failure through the returned
/// handle so the coordinator can treat an immediate open failure as fatal.
/// Every other root-task failure goes to the error queue like any subtree.
pub(crate) fn spawn_root(
    path: String,
    ctx: ScanContext,
) -> std::io::Result<JoinHandle<Result<(), ScanError>>> {
    ctx.tracker.register();

    thread::Builder::new().name("scan-root".into()).spawn(move || {
        let _permit = ctx.admission.acquire();
        let outcome = run_guarded(&path, &ctx);
        let result = match outcome {
            Err(err) if err.is_fatal_at_root() => Err(err),
            Err(err) => {
                let _ = ctx.errors.send(err);
                Ok(())
            }
            Ok(()) => Ok(()),
        };
        ctx.tracker.complete();
        result
    })
}

/// Schedule a scan task for a discovered subdirectory.
///
/// The task is registered with the tracker before the thread exists, and the
/// admission slot is acquired as the first action of the thread body, so a
/// wide directory can queue up many pending tasks while only
/// `admission.capacity()` of them run.
fn spawn_scan(path: String, ctx: &ScanContext) {
    ctx.tracker.register();

    let task_ctx = ctx.clone();
    let task_path = path.clone();
    let task_id = SCAN_TASK_SEQ.fetch_add(1, Ordering::Relaxed);
    let spawned = thread::Builder::new().name(format!("scan-{task_id}")).spawn(move || {
        let _permit = task_ctx.admission.acquire();
        if let Err(err) = run_guarded(&task_path, &task_ctx) {
            let _ = task_ctx.errors.send(err);
        }
        task_ctx.tracker.complete();
    });

    match spawned {
        Ok(handle) => {
            // The lock is only ever contended briefly by sibling spawns.
            if let Ok(mut handles) = ctx.handles.lock() {
                handles.push(handle);
            }
        }
        Err(err) => {
            ctx.tracker.complete();
            let _ = ctx.errors.send(ScanError::Task {
                path,
                message: format!("failed to spawn scan task: {err}"),
            });
        }
    }
}

/// Run one directory scan with panic isolation at the task boundary.
fn run_guarded(path: &str, ctx: &ScanContext) -> Result<(), ScanError> {
    match panic::catch_unwind(AssertUnwindSafe(|| scan_directory(path, ctx))) {
        Ok(result) => result,
        Err(payload) => Err(ScanError::Task {
            path: path.to_string(),
            message: panic_message(payload),
        }),
    }
}

/// Enumerate one directory and emit its entries.
///
/// The enumeration buffer is private to this task; entry names are copied
/// out during parsing, so the buffer can be refilled freely.
fn scan_directory(path: &str, ctx: &ScanContext) -> Result<(), ScanError> {
    let mut dir = DirHandle::open(path).map_err(|source| ScanError::Open {
        path: path.to_string(),
        source,
    })?;
    ctx.stats.record_dir();

    let mut buf = [0u8; SCAN_BUF_LEN];

    loop {
        let valid = dir
            .read_records(&mut buf)
            .map_err(|source| ScanError::Enumerate {
                path: path.to_string(),
                source,
            })?;

        // Directory exhausted; the handle closes on drop.
        if valid == 0 {
            trace!(path, "Directory exhausted");
            return Ok(());
        }

        let mut offset = 0;
        while offset < valid {
            match parse_record(&buf, offset, valid, path) {
                Ok(Parsed::End) => break,
                Ok(Parsed::Skip { next }) => offset = next,
                Ok(Parsed::Entry { entry, next }) => {
                    offset = next;

                    let child_dir = (entry.file_type == EntryType::Directory)
                        .then(|| entry.path.clone());

                    ctx.stats.record_entry();
                    if ctx.entries.send(entry).is_err() {
                        // Entries queue disconnected: the pipeline is being
                        // torn down, stop producing.
                        return Ok(());
                    }

                    if let Some(child_path) = child_dir {
                        spawn_scan(child_path, ctx);
                    }
                }
                Err(fault) => {
                    // Entries already emitted from this buffer stay valid;
                    // the rest of this directory is abandoned.
                    return Err(ScanError::CorruptRecord {
                        path: path.to_string(),
                        fault,
                    });
                }
            }
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "scan task panicked".to_string()
    }
}
