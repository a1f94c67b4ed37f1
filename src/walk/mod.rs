//! Parallel recursive directory walk
//!
//! This module implements the concurrent traversal engine: raw record
//! parsing, admission-bounded recursive scanning, regex name filtering, and
//! the line-oriented output sinks, wired together by the coordinator.
//!
//! # Architecture
//!
//! ```text
//!        ┌────────────────────────────────────────────┐
//!        │              Scan tasks                    │
//!        │  one per directory, admission-bounded      │
//!        │  getdents64 → record parser → Entry        │
//!        └───────┬───────────────────────────┬────────┘
//!                │ entries queue             │ errors queue
//!                ▼                           │
//!        ┌───────────────┐                   │
//!        │  Filter pool  │                   │
//!        │  name/exclude │                   │
//!        └───────┬───────┘                   │
//!                │ results queue             │
//!                ▼                           ▼
//!        ┌───────────────┐          ┌────────────────┐
//!        │    printer    │          │  error printer │
//!        │    stdout     │          │     stderr     │
//!        └───────────────┘          └────────────────┘
//! ```

pub mod admission;
pub mod coordinator;
pub mod dirent;
pub mod filter;
pub(crate) mod scanner;
pub mod sink;
pub mod sys;

pub use coordinator::{WalkCoordinator, WalkResult};
pub use dirent::{Entry, EntryType};
pub use filter::Filters;
