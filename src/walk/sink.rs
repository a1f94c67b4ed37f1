//! Output sinks for results and errors
//!
//! Two independent threads terminate the pipeline: one writes each surviving
//! path as a line to the output writer, the other writes each error's
//! message to the error writer. Writing is best-effort by design; there is
//! no feedback path, no retries and no batching. Each sink exits when its
//! queue disconnects.

use crate::error::ScanError;
use crate::walk::dirent::Entry;
use crossbeam_channel::Receiver;
use std::io::{BufWriter, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Counters shared with the coordinator for the final summary
#[derive(Debug, Default)]
pub struct SinkStats {
    /// Paths written to the output stream
    pub matched: AtomicU64,

    /// Errors written to the error stream
    pub errors: AtomicU64,
}

/// Spawn the results sink: one line per surviving path.
pub fn spawn_printer<W>(
    results: Receiver<Entry>,
    out: W,
    stats: Arc<SinkStats>,
) -> std::io::Result<JoinHandle<()>>
where
    W: Write + Send + 'static,
{
    thread::Builder::new().name("printer".into()).spawn(move || {
        let mut out = BufWriter::new(out);
        while let Ok(entry) = results.recv() {
            stats.matched.fetch_add(1, Ordering::Relaxed);
            let _ = writeln!(out, "{}", entry.path);
        }
        let _ = out.flush();
    })
}

/// Spawn the error sink: one human-readable message per error.
pub fn spawn_error_printer<W>(
    errors: Receiver<ScanError>,
    mut err_out: W,
    stats: Arc<SinkStats>,
) -> std::io::Result<JoinHandle<()>>
where
    W: Write + Send + 'static,
{
    thread::Builder::new()
        .name("err-printer".into())
        .spawn(move || {
            while let Ok(err) = errors.recv() {
                stats.errors.fetch_add(1, Ordering::Relaxed);
                let _ = writeln!(err_out, "fsearch: {err}");
            }
            let _ = err_out.flush();
        })
}
