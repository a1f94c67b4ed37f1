//! Error types for fsearch
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Every per-directory failure carries the offending path
//! - Only a root open failure is fatal to the walk; everything else is
//!   surfaced as data on the error queue and the walk keeps going

use thiserror::Error;

/// Top-level error type for the fsearch application
#[derive(Error, Debug)]
pub enum WalkerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Fatal scan error (root directory could not be opened)
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// A pipeline thread could not be spawned
    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },

    /// A pipeline thread panicked before its queue drained
    #[error("{name} thread panicked")]
    WorkerPanic { name: &'static str },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A name pattern failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    /// Invalid scan task limit
    #[error("Invalid scan task limit {limit}: must be between 1 and {max}")]
    InvalidScanLimit { limit: usize, max: usize },

    /// Invalid filter worker count
    #[error("Invalid filter worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid queue capacity
    #[error("Invalid queue capacity {capacity}: must be at least {min}")]
    InvalidQueueCapacity { capacity: usize, min: usize },
}

/// Per-directory scan errors
///
/// One `ScanError` describes the failure of a single ScanTask. Apart from a
/// root open failure these are reported on the error queue and the rest of
/// the walk continues.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Directory could not be opened for enumeration
    #[error("open '{path}': {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    /// The raw enumeration call failed after the directory was opened
    #[error("enumerate '{path}': {source}")]
    Enumerate {
        path: String,
        source: std::io::Error,
    },

    /// A record in the enumeration buffer failed validation
    #[error("corrupt record in '{path}': {fault}")]
    CorruptRecord {
        path: String,
        #[source]
        fault: RecordFault,
    },

    /// Unexpected fault caught at the ScanTask boundary
    #[error("scan task for '{path}' failed: {message}")]
    Task { path: String, message: String },
}

impl ScanError {
    /// Whether this error aborts the whole walk when raised by the root task.
    ///
    /// Only the root open failure is fatal; deeper failures (and even root
    /// enumerate/parse failures) are reported via the error queue.
    pub fn is_fatal_at_root(&self) -> bool {
        matches!(self, ScanError::Open { .. })
    }

    /// The path of the directory this error belongs to
    pub fn path(&self) -> &str {
        match self {
            ScanError::Open { path, .. }
            | ScanError::Enumerate { path, .. }
            | ScanError::CorruptRecord { path, .. }
            | ScanError::Task { path, .. } => path,
        }
    }
}

/// A record that failed validation during buffer parsing
#[derive(Error, Debug)]
#[error("byte offset {offset}: {reason}")]
pub struct RecordFault {
    /// Offset of the record within the enumeration buffer
    pub offset: usize,
    /// What the validation found
    pub reason: &'static str,
}

/// Result type alias for WalkerError
pub type Result<T> = std::result::Result<T, WalkerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_fatality() {
        let open = ScanError::Open {
            path: "/root".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(open.is_fatal_at_root());

        let enumerate = ScanError::Enumerate {
            path: "/root".into(),
            source: std::io::Error::from(std::io::ErrorKind::Other),
        };
        assert!(!enumerate.is_fatal_at_root());

        let corrupt = ScanError::CorruptRecord {
            path: "/root".into(),
            fault: RecordFault {
                offset: 24,
                reason: "zero record length",
            },
        };
        assert!(!corrupt.is_fatal_at_root());
    }

    #[test]
    fn test_error_conversion() {
        let scan_err = ScanError::Task {
            path: "/data".into(),
            message: "boom".into(),
        };
        let walker_err: WalkerError = scan_err.into();
        assert!(matches!(walker_err, WalkerError::Scan(_)));
    }

    #[test]
    fn test_error_messages_carry_path() {
        let err = ScanError::Open {
            path: "/no/such/dir".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/no/such/dir"));
        assert_eq!(err.path(), "/no/such/dir");
    }
}
