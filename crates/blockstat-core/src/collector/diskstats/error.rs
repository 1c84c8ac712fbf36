//! Error types for block device statistics collection.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that fail a collector or one of its data sources.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The counters source cannot be read.
    #[error("failed to read {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A counters row has a width no known kernel revision produces.
    #[error("invalid diskstats row: {columns} columns, expected one of {expected:?}: {line}")]
    MalformedSource {
        columns: usize,
        expected: Vec<usize>,
        line: String,
    },

    /// The storage devices pattern cannot be expanded.
    #[error("failed to expand storage devices pattern {pattern}: {source}")]
    GlobFailure {
        pattern: String,
        #[source]
        source: io::Error,
    },

    /// The ignored devices pattern does not compile.
    #[error("invalid ignored devices pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A metric descriptor is rejected, e.g. by an invalid constant label.
    #[error("invalid metric descriptor: {0}")]
    InvalidDescriptor(#[from] prometheus::Error),
}

/// Errors confined to a single device's sysfs attributes.
#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("failed to read {attribute}: {source}")]
    Unavailable {
        attribute: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("unknown rotational {0:?}")]
    UnknownRotational(String),

    #[error("unknown scheduler: {0:?}")]
    UnknownScheduler(String),
}
