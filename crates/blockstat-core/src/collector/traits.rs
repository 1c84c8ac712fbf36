//! Seams between the collector and the outside world.
//!
//! The `FileSystem` trait lets the collector read the real `/proc` and `/sys`
//! trees on Linux or an in-memory mock in tests. The `Collector` trait is the
//! per-scrape contract the hosting exporter drives.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::collector::diskstats::CollectError;
use crate::metrics::MetricSink;

/// Abstraction for filesystem operations.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    ///
    /// The file handle is opened and released within the call.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Expands a shell-style glob pattern into matching paths.
    ///
    /// `*` never crosses a `/`. Results are returned in lexical order.
    /// An invalid pattern is reported as `ErrorKind::InvalidInput`.
    fn glob(&self, pattern: &str) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem implementation that delegates to `std::fs` and `glob`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn glob(&self, pattern: &str) -> io::Result<Vec<PathBuf>> {
        let paths = glob::glob(pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        Ok(readable_matches(pattern, paths))
    }
}

/// Keeps matched paths, logging entries the walk could not read.
fn readable_matches<E: fmt::Display>(
    pattern: &str,
    entries: impl IntoIterator<Item = Result<PathBuf, E>>,
) -> Vec<PathBuf> {
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(pattern, error = %e, "read glob entry failed; skip");
                None
            }
        })
        .collect()
}

/// A metrics collector invoked once per scrape cycle.
///
/// Implementations hold only immutable state after construction, so a single
/// instance can serve concurrent scrapes.
pub trait Collector: Send + Sync {
    /// Collects current values and emits them into `sink`.
    ///
    /// An error means the scrape produced no trustworthy data for this
    /// collector; samples already emitted must not be relied upon.
    fn update(&self, sink: &mut dyn MetricSink) -> Result<(), CollectError>;
}
