//! Metric families exposed by the diskstats collector.
//!
//! Docs from <https://www.kernel.org/doc/Documentation/iostats.txt>.

use prometheus::Opts;
use prometheus::core::Desc;
use prometheus::proto::MetricType;

use crate::metrics::{ConstDesc, Labels};

use super::layout::DiskMetric;

/// Size of the sectors `/proc/diskstats` counts in, regardless of the device's
/// physical sector size.
pub const DISK_SECTOR_SIZE: f64 = 512.0;

const MILLISECONDS: f64 = 0.001;

const NAMESPACE: &str = "node";

const DISK_LABELS: &[&str] = &["device", "type"];
const DEVICE_LABELS: &[&str] = &["device"];
const STORAGE_LABELS: &[&str] = &["device", "rotational", "scheduler"];

/// Descriptor table, built once per collector.
#[derive(Debug, Clone)]
pub struct DiskstatsDescriptors {
    completed: ConstDesc,
    merged: ConstDesc,
    bytes: ConstDesc,
    times: ConstDesc,
    io_now: ConstDesc,
    io_time: ConstDesc,
    io_time_weighted: ConstDesc,
    storage_info: ConstDesc,
}

fn describe(
    subsystem: &str,
    name: &str,
    help: &str,
    variable_labels: &[&str],
    labels: &Labels,
    metric_type: MetricType,
) -> prometheus::Result<ConstDesc> {
    let opts = Opts::new(name, help)
        .namespace(NAMESPACE)
        .subsystem(subsystem)
        .const_labels(labels.clone())
        .variable_labels(variable_labels.iter().map(|l| l.to_string()).collect());
    ConstDesc::new(opts, metric_type)
}

impl DiskstatsDescriptors {
    /// Builds every descriptor with `labels` as constant labels.
    ///
    /// Fails when a constant label name is invalid or clashes with a variable
    /// label.
    pub fn new(labels: &Labels) -> prometheus::Result<Self> {
        Ok(Self {
            completed: describe(
                "disk",
                "completed_total",
                "The total number of IO requests completed successfully of each type.",
                DISK_LABELS,
                labels,
                MetricType::COUNTER,
            )?,
            merged: describe(
                "disk",
                "merged_total",
                "The total number of merged IO requests of each type.",
                DISK_LABELS,
                labels,
                MetricType::COUNTER,
            )?,
            bytes: describe(
                "disk",
                "bytes_total",
                "The total number of bytes processed by IO requests of each type.",
                DISK_LABELS,
                labels,
                MetricType::COUNTER,
            )?
            .with_factor(DISK_SECTOR_SIZE),
            times: describe(
                "disk",
                "time_seconds_total",
                "The total number of seconds spent on all requests of each type.",
                DISK_LABELS,
                labels,
                MetricType::COUNTER,
            )?
            .with_factor(MILLISECONDS),
            io_now: describe(
                "disk",
                "io_now",
                "The number of I/Os currently in progress.",
                DEVICE_LABELS,
                labels,
                MetricType::GAUGE,
            )?,
            io_time: describe(
                "disk",
                "io_time_seconds_total",
                "Total seconds spent doing I/Os.",
                DEVICE_LABELS,
                labels,
                MetricType::COUNTER,
            )?
            .with_factor(MILLISECONDS),
            io_time_weighted: describe(
                "disk",
                "io_time_weighted_seconds_total",
                "The weighted # of seconds spent doing I/Os.",
                DEVICE_LABELS,
                labels,
                MetricType::COUNTER,
            )?
            .with_factor(MILLISECONDS),
            storage_info: describe(
                "system",
                "storage_info",
                "Labeled information about storage devices present in the system.",
                STORAGE_LABELS,
                labels,
                MetricType::GAUGE,
            )?,
        })
    }

    /// Descriptor a counter position maps to.
    pub fn for_metric(&self, metric: DiskMetric) -> &ConstDesc {
        match metric {
            DiskMetric::Completed => &self.completed,
            DiskMetric::Merged => &self.merged,
            DiskMetric::Bytes => &self.bytes,
            DiskMetric::Time => &self.times,
            DiskMetric::IoNow => &self.io_now,
            DiskMetric::IoTime => &self.io_time,
            DiskMetric::IoTimeWeighted => &self.io_time_weighted,
        }
    }

    pub fn storage_info(&self) -> &ConstDesc {
        &self.storage_info
    }

    /// Every descriptor, for registration with a `prometheus::Registry`.
    pub fn descs(&self) -> Vec<&Desc> {
        [
            &self.completed,
            &self.merged,
            &self.bytes,
            &self.times,
            &self.io_now,
            &self.io_time,
            &self.io_time_weighted,
            &self.storage_info,
        ]
        .into_iter()
        .map(ConstDesc::desc)
        .collect()
    }
}
