//! Storage device properties from the `/sys/block/*` attribute tree.

use std::path::Path;

use tracing::{trace, warn};

use super::error::{CollectError, PropertyError};
use super::filter::DeviceFilter;
use crate::collector::traits::FileSystem;

const ROTATIONAL_ATTRIBUTE: &str = "queue/rotational";
const SCHEDULER_ATTRIBUTE: &str = "queue/scheduler";

/// Properties of one storage device, re-read on every scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageProperties {
    pub device: String,
    pub rotational: bool,
    /// Name of the active I/O scheduler, `none` when the queue has none.
    pub scheduler: String,
}

impl StorageProperties {
    /// Kernel encoding of the rotational flag, used as label value.
    pub fn rotational_label(&self) -> &'static str {
        if self.rotational { "1" } else { "0" }
    }
}

/// Reads properties of every device directory matched by `pattern`.
///
/// Devices excluded by `filter` are skipped. A device whose attributes are
/// missing or unrecognized is logged and left out; only a pattern that cannot
/// be expanded fails the whole call. Output order follows the glob expansion.
pub fn read_storage_properties<F: FileSystem>(
    fs: &F,
    pattern: &str,
    filter: &DeviceFilter,
) -> Result<Vec<StorageProperties>, CollectError> {
    let dirs = fs.glob(pattern).map_err(|source| CollectError::GlobFailure {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut storages = Vec::with_capacity(dirs.len());

    for devpath in dirs {
        let Some(device) = devpath.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        if filter.is_excluded(&device) {
            trace!(device = %device, "skip device");
            continue;
        }

        match read_device_properties(fs, &devpath, &device) {
            Ok(properties) => storages.push(properties),
            Err(e) => warn!(device = %device, error = %e, "get storage properties failed; skip"),
        }
    }

    Ok(storages)
}

fn read_device_properties<F: FileSystem>(
    fs: &F,
    devpath: &Path,
    device: &str,
) -> Result<StorageProperties, PropertyError> {
    let rotational = parse_rotational(&read_attribute(fs, devpath, ROTATIONAL_ATTRIBUTE)?)?;
    let scheduler = parse_scheduler(&read_attribute(fs, devpath, SCHEDULER_ATTRIBUTE)?)?;

    Ok(StorageProperties {
        device: device.to_string(),
        rotational,
        scheduler,
    })
}

fn read_attribute<F: FileSystem>(
    fs: &F,
    devpath: &Path,
    attribute: &'static str,
) -> Result<String, PropertyError> {
    fs.read_to_string(&devpath.join(attribute))
        .map_err(|source| PropertyError::Unavailable { attribute, source })
}

/// Parses `queue/rotational`: exactly `0` or `1` on the first line.
pub fn parse_rotational(content: &str) -> Result<bool, PropertyError> {
    match content.lines().next().unwrap_or_default() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(PropertyError::UnknownRotational(other.to_string())),
    }
}

/// Extracts the active scheduler from `queue/scheduler`.
///
/// The active entry is the one wrapped in brackets, e.g. `mq-deadline` in
/// `noop [mq-deadline] kyber`. Queues without a scheduler report a bare
/// `none`.
pub fn parse_scheduler(content: &str) -> Result<String, PropertyError> {
    let line = content.lines().next().unwrap_or_default();

    let active = line.split_whitespace().find_map(|token| {
        token
            .strip_prefix('[')
            .and_then(|t| t.strip_suffix(']'))
            .filter(|t| !t.is_empty())
    });
    if let Some(active) = active {
        return Ok(active.to_string());
    }

    if line.split_whitespace().any(|token| token == "none") {
        return Ok("none".to_string());
    }

    Err(PropertyError::UnknownScheduler(line.to_string()))
}
