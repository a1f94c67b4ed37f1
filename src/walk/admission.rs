//! Concurrency admission and task accounting
//!
//! Two pieces of shared state connect the scan tasks:
//!
//! - [`AdmissionGate`]: a fixed-capacity token gate bounding how many scan
//!   tasks run (and hold open directory descriptors) at once. A task
//!   acquires a slot as the first thing in its body and the RAII permit
//!   releases it on every exit path.
//! - [`TaskTracker`]: the outstanding-task counter. A task is registered
//!   before it is spawned, so the count can never be observed at zero while
//!   work is still in flight; the transition to zero fires the completion
//!   signal that starts pipeline shutdown.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Bounded-capacity gate limiting concurrently running scan tasks
///
/// Implemented as a bounded channel of unit tokens: acquiring a slot sends a
/// token (blocking while the channel is full), releasing receives one back.
/// The gate is instrumented with an in-use count and a high-water mark.
#[derive(Clone)]
pub struct AdmissionGate {
    slots: Sender<()>,
    returns: Receiver<()>,
    capacity: usize,
    in_use: Arc<AtomicUsize>,
    high_water: Arc<AtomicUsize>,
}

impl AdmissionGate {
    /// Create a gate with `capacity` slots. `capacity` must be nonzero
    /// (enforced by config validation).
    pub fn new(capacity: usize) -> Self {
        let (slots, returns) = bounded(capacity);
        Self {
            slots,
            returns,
            capacity,
            in_use: Arc::new(AtomicUsize::new(0)),
            high_water: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Acquire a slot, blocking while the gate is full.
    ///
    /// Must be called before any queue write in the task body: queue
    /// consumers run independently of admission, so blocking here can never
    /// deadlock against the entries/errors queues.
    pub fn acquire(&self) -> AdmissionPermit {
        // Cannot fail: the gate owns both channel ends for its lifetime.
        let _ = self.slots.send(());

        let now = self.in_use.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        AdmissionPermit {
            returns: self.returns.clone(),
            in_use: Arc::clone(&self.in_use),
        }
    }

    /// Configured slot capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::SeqCst)
    }

    /// Most slots ever held at once
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }
}

/// RAII slot held for the lifetime of one scan task
pub struct AdmissionPermit {
    returns: Receiver<()>,
    in_use: Arc<AtomicUsize>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.in_use.fetch_sub(1, Ordering::SeqCst);
        // A token is guaranteed present: exactly one was sent per permit.
        let _ = self.returns.try_recv();
    }
}

/// Outstanding scan task counter with a completion signal
#[derive(Clone)]
pub struct TaskTracker {
    outstanding: Arc<AtomicUsize>,
    done_tx: Sender<()>,
    done_rx: Receiver<()>,
}

impl TaskTracker {
    pub fn new() -> Self {
        let (done_tx, done_rx) = bounded(1);
        Self {
            outstanding: Arc::new(AtomicUsize::new(0)),
            done_tx,
            done_rx,
        }
    }

    /// Count a task before it is spawned.
    ///
    /// Registration happens in the parent, while the parent itself is still
    /// outstanding, so the counter never dips to zero with work in flight.
    pub fn register(&self) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
    }

    /// Count a task as finished; the last task fires the completion signal.
    pub fn complete(&self) {
        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.done_tx.try_send(());
        }
    }

    /// Block until every registered task has completed.
    pub fn wait(&self) {
        let _ = self.done_rx.recv();
    }

    /// Tasks registered but not yet completed
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}

impl Default for TaskTracker {
    fn default() -> Self {
        Self::new()
    }
}
