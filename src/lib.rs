//! fsearch - parallel recursive directory walker
//!
//! Walks very large directory trees by reading directory contents straight
//! through the kernel's raw enumeration call (`getdents64` on Linux,
//! `__getdirentries64` on macOS), parsing the packed binary records itself,
//! and overlapping I/O across many in-flight subdirectories.
//!
//! # Features
//!
//! - **Raw enumeration**: no `readdir` abstraction; one 4 KiB buffer per
//!   scan task, parsed with strict bounds checking.
//!
//! - **Bounded parallelism**: unbounded logical recursion mapped onto a
//!   fixed-capacity admission gate, so wide trees never exhaust file
//!   descriptors or spawn unbounded concurrent work.
//!
//! - **Streaming pipeline**: scan tasks feed a regex filter pool which
//!   feeds the output sink through bounded queues; paths stream out as
//!   they are found, in no guaranteed order.
//!
//! - **Subtree fault isolation**: a directory that cannot be opened,
//!   enumerated, or parsed produces one error line and costs only its own
//!   subtree; the walk itself fails only when the root cannot be opened.
//!
//! # Example
//!
//! ```bash
//! # Everything under the current directory
//! fsearch
//!
//! # Rust sources under ~/src, skipping build output
//! fsearch -n '\.rs$' -x '^target$' ~/src
//! ```

pub mod config;
pub mod error;
pub mod walk;

pub use config::{CliArgs, WalkConfig};
pub use error::{Result, ScanError, WalkerError};
pub use walk::{Entry, EntryType, Filters, WalkCoordinator, WalkResult};
