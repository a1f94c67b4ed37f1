//! Configuration types for fsearch
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use crate::walk::filter::Filters;
use clap::Parser;
use regex::bytes::Regex;

/// Maximum reasonable number of concurrent scan tasks
const MAX_SCAN_TASKS: usize = 4096;

/// Maximum reasonable filter worker count
const MAX_FILTER_WORKERS: usize = 512;

/// Minimum queue capacity
const MIN_QUEUE_CAPACITY: usize = 16;

/// Parallel recursive directory walker
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fsearch",
    version,
    about = "Parallel recursive directory walker with regex name filtering",
    long_about = "Walks a directory tree using the kernel's raw directory \
                  enumeration call and prints every entry whose name passes \
                  the configured filters.\n\n\
                  Output order is unspecified: subdirectories are scanned \
                  concurrently and results are printed as they arrive.",
    after_help = "EXAMPLES:\n    \
        fsearch /var/log\n    \
        fsearch -n '\\.rs$' ~/src\n    \
        fsearch -n '^foo' -x 'bar$' /data\n    \
        fsearch -j 16 /mnt/wide-tree"
)]
pub struct CliArgs {
    /// Directory to start the walk from
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: String,

    /// Only print entries whose name matches this regex
    #[arg(short = 'n', long = "name", value_name = "PATTERN")]
    pub name: Option<String>,

    /// Drop entries whose name matches this regex
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    pub exclude: Option<String>,

    /// Maximum number of concurrently running scan tasks (bounds open
    /// directory handles)
    #[arg(
        short = 'j',
        long = "scan-tasks",
        default_value_t = default_scan_tasks(),
        value_name = "NUM"
    )]
    pub scan_tasks: usize,

    /// Number of filter worker threads
    #[arg(
        long,
        default_value_t = default_filter_workers(),
        value_name = "NUM"
    )]
    pub filter_workers: usize,

    /// Capacity of the entry/result queues (controls memory usage)
    #[arg(long, default_value = "1024", value_name = "NUM")]
    pub queue_capacity: usize,

    /// Verbose output (debug-level logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Validated runtime configuration for one walk
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Root directory of the walk
    pub root: String,

    /// Compiled name filters, shared read-only by the filter workers
    pub filters: Filters,

    /// Admission gate capacity (concurrent scan tasks / open handles)
    pub scan_tasks: usize,

    /// Filter worker pool size
    pub filter_workers: usize,

    /// Bounded queue capacity for the entries/results/errors queues
    pub queue_capacity: usize,
}

impl WalkConfig {
    /// Validate CLI arguments and build the runtime configuration
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.scan_tasks == 0 || args.scan_tasks > MAX_SCAN_TASKS {
            return Err(ConfigError::InvalidScanLimit {
                limit: args.scan_tasks,
                max: MAX_SCAN_TASKS,
            });
        }

        if args.filter_workers == 0 || args.filter_workers > MAX_FILTER_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.filter_workers,
                max: MAX_FILTER_WORKERS,
            });
        }

        if args.queue_capacity < MIN_QUEUE_CAPACITY {
            return Err(ConfigError::InvalidQueueCapacity {
                capacity: args.queue_capacity,
                min: MIN_QUEUE_CAPACITY,
            });
        }

        let filters = Filters {
            name: compile_pattern(args.name.as_deref())?,
            exclude: compile_pattern(args.exclude.as_deref())?,
        };

        Ok(Self {
            root: args.path,
            filters,
            scan_tasks: args.scan_tasks,
            filter_workers: args.filter_workers,
            queue_capacity: args.queue_capacity,
        })
    }
}

fn compile_pattern(pattern: Option<&str>) -> Result<Option<Regex>, ConfigError> {
    match pattern {
        None => Ok(None),
        Some(p) => Regex::new(p)
            .map(Some)
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: p.to_string(),
                source,
            }),
    }
}

fn default_scan_tasks() -> usize {
    // Directory enumeration is I/O bound; run well past the core count
    num_cpus::get() * 8
}

fn default_filter_workers() -> usize {
    // Regex matching is cheap relative to the scan; half the cores is plenty
    (num_cpus::get() / 2).max(1)
}
