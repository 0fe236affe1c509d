//! Error types for index construction
//!
//! Every variant is terminal for the build that produced it. Each one
//! carries enough context (source name, offsets, byte and element counts)
//! for the caller to report the failure without re-deriving it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building, writing or reading an index
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration file could not be read or is not valid JSON
    #[error("config file {path} unreadable: {reason}")]
    ConfigUnreadable { path: PathBuf, reason: String },

    /// The configuration parsed but does not describe a buildable index
    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    /// A source could not be read in full
    #[error("cannot read {source_name}: offset {offset}, length {length} ({read} bytes read){}", fmt_cause(.cause))]
    SourceUnreadable {
        source_name: String,
        offset: u64,
        length: u64,
        read: u64,
        cause: Option<std::io::Error>,
    },

    /// The logical document does not fit 32-bit positions
    #[error("overall input length too large (exceeds 4GB): {total_length}")]
    SizeExceeded { total_length: u64 },

    /// A working buffer could not be allocated
    #[error("cannot allocate {what} ({bytes} bytes)")]
    AllocationFailed { what: &'static str, bytes: u64 },

    /// The destination could not be opened, flushed or committed
    #[error("cannot write index file {destination}: {cause}")]
    DestinationUnwritable {
        destination: String,
        cause: std::io::Error,
    },

    /// One of the two persisted arrays was only partially written
    #[error("short write of {array}: {written} of {expected} elements written: {cause}")]
    WriteIncomplete {
        array: &'static str,
        written: u64,
        expected: u64,
        cause: std::io::Error,
    },

    /// A primitive was handed inconsistent buffers
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An existing artifact does not match the document it claims to index
    #[error("index artifact mismatch: {0}")]
    ArtifactMismatch(String),
}

fn fmt_cause(cause: &Option<std::io::Error>) -> String {
    match cause {
        Some(err) => format!(": {}", err),
        None => String::new(),
    }
}

impl Error {
    /// Process exit code reported for this error kind
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ConfigUnreadable { .. } => 2,
            Error::ConfigInvalid(_) => 3,
            Error::SourceUnreadable { .. } => 4,
            Error::DestinationUnwritable { .. } | Error::WriteIncomplete { .. } => 5,
            Error::SizeExceeded { .. } => 6,
            Error::AllocationFailed { .. } => 7,
            Error::InvalidInput(_) => 8,
            Error::ArtifactMismatch(_) => 9,
        }
    }
}
