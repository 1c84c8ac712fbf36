//! Parser for `/proc/diskstats`.
//!
//! Rows are validated against the known kernel layouts before anything else:
//! an unexpected width means the positional meaning of every value is in
//! doubt, so the whole source is rejected rather than the single row.

use std::collections::HashMap;

use tracing::{trace, warn};

use super::error::CollectError;
use super::filter::DeviceFilter;
use super::layout::{self, HEADER_COLUMNS};

/// Device name → positional counter vector.
pub type DeviceCounters = HashMap<String, Vec<f64>>;

/// Parses `/proc/diskstats` content.
///
/// Format: `major minor name` followed by 11, 15 or 17 counters depending on
/// the kernel. Devices matched by `filter` are left out. A value that is not a
/// number is logged and recorded as `0`. When a device is listed twice the
/// later row wins.
pub fn parse_diskstats(content: &str, filter: &DeviceFilter) -> Result<DeviceCounters, CollectError> {
    let mut stats = DeviceCounters::new();

    for line in content.lines() {
        let values: Vec<&str> = line.split_whitespace().collect();
        if values.is_empty() {
            continue;
        }

        if !layout::is_valid_row_width(values.len()) {
            return Err(CollectError::MalformedSource {
                columns: values.len(),
                expected: layout::valid_row_widths(),
                line: line.trim().to_string(),
            });
        }

        let device = values[2];
        if filter.is_excluded(device) {
            trace!(device, "ignore device");
            continue;
        }

        let stat = values[HEADER_COLUMNS..]
            .iter()
            .enumerate()
            .map(|(index, raw)| parse_value(device, index, raw))
            .collect();

        stats.insert(device.to_string(), stat);
    }

    Ok(stats)
}

fn parse_value(device: &str, index: usize, raw: &str) -> f64 {
    raw.parse::<f64>().unwrap_or_else(|e| {
        warn!(device, index, value = raw, error = %e, "convert counter to float failed; use 0");
        0.0
    })
}
