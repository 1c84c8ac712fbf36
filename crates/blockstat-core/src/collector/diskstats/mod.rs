//! Block device statistics collector.
//!
//! Cross-references two kernel interfaces into one device-keyed result set:
//!
//! - `/proc/diskstats`: cumulative I/O counters, one row per block device,
//!   in one of three layouts depending on the kernel (see [`layout`]);
//! - `/sys/block/<dev>/queue/{rotational,scheduler}`: per-device properties.
//!
//! Both sources go through the same [`DeviceFilter`], so a device either shows
//! up in both metric sets or in neither.

pub mod descriptors;
mod error;
pub mod filter;
pub mod layout;
pub mod parser;
pub mod sysfs;

use std::path::PathBuf;
use std::time::Instant;

use prometheus::core::Desc;
use prometheus::proto::MetricFamily;
use tracing::{debug, error, warn};

use crate::collector::traits::{Collector, FileSystem};
use crate::metrics::{Families, Labels, MetricSink};

pub use descriptors::{DISK_SECTOR_SIZE, DiskstatsDescriptors};
pub use error::{CollectError, PropertyError};
pub use filter::{DEFAULT_IGNORED_DEVICES, DeviceFilter};
pub use parser::{DeviceCounters, parse_diskstats};
pub use sysfs::{StorageProperties, read_storage_properties};

/// Where the collector reads from and which devices it ignores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskstatsConfig {
    /// Base path to proc filesystem (usually "/proc").
    pub proc_path: PathBuf,
    /// Glob matching one directory per block device.
    pub sysfs_block_glob: String,
    /// Exclusion pattern; `None` keeps every device.
    pub ignored_devices: Option<String>,
}

impl Default for DiskstatsConfig {
    fn default() -> Self {
        Self {
            proc_path: PathBuf::from("/proc"),
            sysfs_block_glob: "/sys/block/*".to_string(),
            ignored_devices: Some(DEFAULT_IGNORED_DEVICES.to_string()),
        }
    }
}

impl DiskstatsConfig {
    pub fn with_proc_path(mut self, proc_path: impl Into<PathBuf>) -> Self {
        self.proc_path = proc_path.into();
        self
    }

    pub fn with_sysfs_block_glob(mut self, pattern: impl Into<String>) -> Self {
        self.sysfs_block_glob = pattern.into();
        self
    }

    pub fn with_ignored_devices(mut self, pattern: Option<String>) -> Self {
        self.ignored_devices = pattern;
        self
    }

    /// Path of the counters source.
    pub fn diskstats_path(&self) -> PathBuf {
        self.proc_path.join("diskstats")
    }
}

/// Collects disk I/O counters and storage properties.
///
/// Holds only immutable state: the compiled filter and the descriptor table.
/// Every call to [`Collector::update`] re-reads both kernel interfaces.
pub struct DiskstatsCollector<F: FileSystem> {
    fs: F,
    diskstats_path: PathBuf,
    sysfs_block_glob: String,
    filter: DeviceFilter,
    descriptors: DiskstatsDescriptors,
}

impl<F: FileSystem> DiskstatsCollector<F> {
    /// Creates a new diskstats collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `config` - Source paths and exclusion pattern
    /// * `labels` - Labeling context attached to every emitted sample
    ///
    /// Fails when the exclusion pattern does not compile or a constant label
    /// is rejected by the metric descriptors.
    pub fn new(fs: F, config: &DiskstatsConfig, labels: &Labels) -> Result<Self, CollectError> {
        let filter = DeviceFilter::new(config.ignored_devices.as_deref())?;

        Ok(Self {
            fs,
            diskstats_path: config.diskstats_path(),
            sysfs_block_glob: config.sysfs_block_glob.clone(),
            filter,
            descriptors: DiskstatsDescriptors::new(labels)?,
        })
    }

    pub fn filter(&self) -> &DeviceFilter {
        &self.filter
    }

    /// Reads and parses `/proc/diskstats`.
    pub fn collect_counters(&self) -> Result<DeviceCounters, CollectError> {
        let content = self
            .fs
            .read_to_string(&self.diskstats_path)
            .map_err(|source| CollectError::SourceUnavailable {
                path: self.diskstats_path.clone(),
                source,
            })?;
        parse_diskstats(&content, &self.filter)
    }

    /// Reads storage properties of every non-excluded block device.
    pub fn collect_storage_properties(&self) -> Result<Vec<StorageProperties>, CollectError> {
        read_storage_properties(&self.fs, &self.sysfs_block_glob, &self.filter)
    }

    /// Emits every metric a device's counter vector carries and returns how
    /// many were emitted. Vectors shorter than the oldest layout emit nothing.
    fn emit_counters(&self, device: &str, stat: &[f64], sink: &mut dyn MetricSink) -> usize {
        let mut emitted = 0;
        for field in layout::fields_for(stat.len()) {
            let desc = self.descriptors.for_metric(field.metric);
            let metric = match field.op {
                Some(op) => desc.metric(stat[field.index], &[device, op]),
                None => desc.metric(stat[field.index], &[device]),
            };
            sink.emit(desc, metric);
            emitted += 1;
        }
        emitted
    }
}

impl<F: FileSystem> Collector for DiskstatsCollector<F> {
    fn update(&self, sink: &mut dyn MetricSink) -> Result<(), CollectError> {
        let start = Instant::now();

        let stats = self.collect_counters()?;

        let mut metrics = 0;
        for (device, stat) in &stats {
            metrics += self.emit_counters(device, stat, sink);
        }

        match self.collect_storage_properties() {
            Ok(storages) => {
                let info = self.descriptors.storage_info();
                for s in &storages {
                    let metric = info.metric(
                        1.0,
                        &[s.device.as_str(), s.rotational_label(), s.scheduler.as_str()],
                    );
                    sink.emit(info, metric);
                }
                metrics += storages.len();
            }
            Err(e) => warn!(error = %e, "get storage devices properties failed; skip"),
        }

        debug!(
            devices = stats.len(),
            metrics,
            elapsed = ?start.elapsed(),
            "diskstats collected"
        );

        Ok(())
    }
}

/// Lets the collector be registered with a `prometheus::Registry`. A failed
/// scrape is logged and yields no families.
impl<F: FileSystem> prometheus::core::Collector for DiskstatsCollector<F> {
    fn desc(&self) -> Vec<&Desc> {
        self.descriptors.descs()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut families = Families::new();
        match self.update(&mut families) {
            Ok(()) => families.into_inner(),
            Err(e) => {
                error!(error = %e, "collect diskstats failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::metrics::{ConstDesc, Sample, samples};
    use prometheus::proto::{self, MetricType};

    /// Sink keeping metrics flat and in emission order.
    #[derive(Default)]
    struct Recorder(Vec<Sample>);

    impl MetricSink for Recorder {
        fn emit(&mut self, desc: &ConstDesc, metric: proto::Metric) {
            let mut families = Families::new();
            families.emit(desc, metric);
            self.0.extend(samples(families.as_slice()));
        }
    }

    impl std::ops::Deref for Recorder {
        type Target = [Sample];

        fn deref(&self) -> &[Sample] {
            &self.0
        }
    }

    fn collector(fs: MockFs) -> DiskstatsCollector<MockFs> {
        DiskstatsCollector::new(fs, &DiskstatsConfig::default(), &Labels::new()).unwrap()
    }

    fn scrape(collector: &DiskstatsCollector<MockFs>) -> Vec<Sample> {
        let mut families = Families::new();
        collector.update(&mut families).unwrap();
        samples(families.as_slice())
    }

    fn find<'a>(samples: &'a [Sample], name: &str, device: &str, op: Option<&str>) -> &'a Sample {
        samples
            .iter()
            .find(|s| s.name == name && s.label("device") == Some(device) && s.label("type") == op)
            .unwrap_or_else(|| panic!("missing {name} {device} {op:?}"))
    }

    fn count(samples: &[Sample], name: &str) -> usize {
        samples.iter().filter(|s| s.name == name).count()
    }

    #[test]
    fn test_collector_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DiskstatsCollector<MockFs>>();
    }

    #[test]
    fn test_typical_host() {
        let samples = scrape(&collector(MockFs::typical_host()));

        // sda, nvme0n1, dm-0: 17 counters each, plus 3 storage_info
        assert_eq!(samples.len(), 3 * 17 + 3);
        for excluded in ["loop0", "sda1", "nvme0n1p1"] {
            assert!(samples.iter().all(|s| s.label("device") != Some(excluded)));
        }

        assert_eq!(count(&samples, "node_disk_completed_total"), 3 * 4);
        assert_eq!(count(&samples, "node_disk_merged_total"), 3 * 3);
        assert_eq!(count(&samples, "node_disk_bytes_total"), 3 * 3);
        assert_eq!(count(&samples, "node_disk_time_seconds_total"), 3 * 4);
        assert_eq!(count(&samples, "node_disk_io_now"), 3);
        assert_eq!(count(&samples, "node_system_storage_info"), 3);
    }

    #[test]
    fn test_unit_conversions() {
        let samples = scrape(&collector(MockFs::typical_host()));

        let bytes = find(&samples, "node_disk_bytes_total", "sda", Some("reads"));
        assert_eq!(bytes.value, 987654.0 * 512.0);
        let bytes = find(&samples, "node_disk_bytes_total", "sda", Some("discards"));
        assert_eq!(bytes.value, 24576.0 * 512.0);

        let time = find(&samples, "node_disk_time_seconds_total", "sda", Some("writes"));
        assert_eq!(time.value, 3000.0 * 0.001);
        let time = find(&samples, "node_disk_time_seconds_total", "nvme0n1", Some("flush"));
        assert_eq!(time.value, 210.0 * 0.001);

        let weighted = find(&samples, "node_disk_io_time_weighted_seconds_total", "sda", None);
        assert_eq!(weighted.value, 8000.0 * 0.001);

        let io_now = find(&samples, "node_disk_io_now", "nvme0n1", None);
        assert_eq!(io_now.value, 5.0);
        assert_eq!(io_now.metric_type, MetricType::GAUGE);

        let flushes = find(&samples, "node_disk_completed_total", "nvme0n1", Some("flush"));
        assert_eq!(flushes.value, 900.0);
        assert_eq!(flushes.metric_type, MetricType::COUNTER);
    }

    #[test]
    fn test_emission_counts_per_layout() {
        let collector = collector(MockFs::new());
        for (len, expected) in [(10, 0), (11, 11), (14, 11), (15, 15), (16, 15), (17, 17)] {
            let mut samples = Recorder::default();
            let emitted = collector.emit_counters("sda", &vec![1.0; len], &mut samples);
            assert_eq!(emitted, expected, "len {len}");
            assert_eq!(samples.len(), expected, "len {len}");
        }

        let mut samples = Recorder::default();
        collector.emit_counters("sda", &[1.0; 15], &mut samples);
        assert_eq!(samples.iter().filter(|s| s.label("type") == Some("discards")).count(), 4);
        assert_eq!(samples.iter().filter(|s| s.label("type") == Some("flush")).count(), 0);

        let mut samples = Recorder::default();
        collector.emit_counters("sda", &[1.0; 17], &mut samples);
        assert_eq!(samples.iter().filter(|s| s.label("type") == Some("flush")).count(), 2);
    }

    #[test]
    fn test_emission_order_per_device() {
        let collector = collector(MockFs::new());
        let mut samples = Recorder::default();
        collector.emit_counters("sda", &[1.0; 17], &mut samples);

        let ops: Vec<Option<&str>> = samples.iter().map(|s| s.label("type")).collect();
        let position = |op: Option<&str>| ops.iter().position(|o| *o == op).unwrap();
        let last = |op: Option<&str>| ops.iter().rposition(|o| *o == op).unwrap();

        assert!(last(Some("reads")) < position(Some("writes")));
        assert!(last(Some("writes")) < position(None));
        assert!(last(None) < position(Some("discards")));
        assert!(last(Some("discards")) < position(Some("flush")));
    }

    #[test]
    fn test_legacy_kernel_host() {
        let samples = scrape(&collector(MockFs::legacy_kernel_host()));

        assert_eq!(samples.len(), 11 + 1);
        assert!(samples.iter().all(|s| s.label("device") == Some("sda")));
        assert!(samples.iter().all(|s| s.label("type") != Some("discards")));

        let info = find(&samples, "node_system_storage_info", "sda", None);
        assert_eq!(info.value, 1.0);
        assert_eq!(info.label("rotational"), Some("1"));
        assert_eq!(info.label("scheduler"), Some("deadline"));
    }

    #[test]
    fn test_kernel_4_18_host() {
        let samples = scrape(&collector(MockFs::kernel_4_18_host()));

        assert_eq!(samples.len(), 2 * 15 + 2);
        assert_eq!(samples.iter().filter(|s| s.label("type") == Some("discards")).count(), 8);
        assert!(samples.iter().all(|s| s.label("type") != Some("flush")));

        let info = find(&samples, "node_system_storage_info", "sda", None);
        assert_eq!(info.label("scheduler"), Some("mq-deadline"));
    }

    #[test]
    fn test_two_device_source_keeps_only_sda() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/diskstats",
            "\
   8       0 sda 1234 0 56789 100 5678 0 98765 200 0 150 300
   7       0 loop0 10 0 20 1 0 0 0 0 0 1 1
",
        );
        let stats = collector(fs).collect_counters().unwrap();
        assert_eq!(stats.keys().collect::<Vec<_>>(), vec!["sda"]);
        assert_eq!(stats["sda"].len(), 11);
    }

    #[test]
    fn test_missing_source_fails_scrape() {
        let mut fs = MockFs::typical_host();
        fs.remove_file("/proc/diskstats");

        let mut samples = Recorder::default();
        let err = collector(fs).update(&mut samples).unwrap_err();
        assert!(matches!(err, CollectError::SourceUnavailable { .. }));
        assert!(err.to_string().contains("/proc/diskstats"));
        assert!(samples.is_empty());
    }

    #[test]
    fn test_malformed_source_fails_scrape() {
        let mut fs = MockFs::typical_host();
        fs.add_file(
            "/proc/diskstats",
            "\
   8       0 sda 12345 100 987654 5000 6789 50 456789 3000 0 4000 8000
   8      16 sdb 1 2 3 4 5 6 7 8 9
",
        );

        let mut samples = Recorder::default();
        let err = collector(fs).update(&mut samples).unwrap_err();
        assert!(matches!(err, CollectError::MalformedSource { columns: 12, .. }));
        assert!(samples.is_empty());
    }

    #[test]
    fn test_glob_failure_keeps_counters() {
        let config = DiskstatsConfig::default().with_sysfs_block_glob("/sys/block/[");
        let collector =
            DiskstatsCollector::new(MockFs::typical_host(), &config, &Labels::new()).unwrap();

        let mut samples = Recorder::default();
        collector.update(&mut samples).unwrap();
        assert_eq!(samples.len(), 3 * 17);
        assert_eq!(count(&samples, "node_system_storage_info"), 0);
    }

    #[test]
    fn test_bad_property_drops_only_that_device_info() {
        let mut fs = MockFs::typical_host();
        fs.add_file("/sys/block/nvme0n1/queue/rotational", "maybe\n");

        let samples = scrape(&collector(fs));
        assert_eq!(count(&samples, "node_system_storage_info"), 2);
        // counters of the device are unaffected
        assert_eq!(
            samples
                .iter()
                .filter(|s| s.label("device") == Some("nvme0n1"))
                .count(),
            17
        );
    }

    #[test]
    fn test_filter_disabled() {
        let config = DiskstatsConfig::default().with_ignored_devices(None);
        let collector =
            DiskstatsCollector::new(MockFs::typical_host(), &config, &Labels::new()).unwrap();
        assert_eq!(collector.filter().pattern(), None);

        let stats = collector.collect_counters().unwrap();
        assert_eq!(stats.len(), 6);
        assert_eq!(collector.collect_storage_properties().unwrap().len(), 4);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let config = DiskstatsConfig::default().with_ignored_devices(Some("(sd".to_string()));
        let result = DiskstatsCollector::new(MockFs::new(), &config, &Labels::new());
        assert!(matches!(result, Err(CollectError::InvalidPattern(_))));
    }

    #[test]
    fn test_custom_proc_path() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/host/proc/diskstats",
            "   8       0 sda 1 2 3 4 5 6 7 8 9 10 11\n",
        );
        let config = DiskstatsConfig::default().with_proc_path("/host/proc");
        assert_eq!(config.diskstats_path(), PathBuf::from("/host/proc/diskstats"));

        let collector = DiskstatsCollector::new(fs, &config, &Labels::new()).unwrap();
        let mut samples = Recorder::default();
        collector.update(&mut samples).unwrap();
        assert_eq!(samples.len(), 11);
    }

    #[test]
    fn test_const_labels_on_every_sample() {
        let mut labels = Labels::new();
        labels.insert("instance".to_string(), "db1:9890".to_string());
        let collector =
            DiskstatsCollector::new(MockFs::typical_host(), &DiskstatsConfig::default(), &labels)
                .unwrap();

        let samples = scrape(&collector);
        assert!(!samples.is_empty());
        assert!(samples.iter().all(|s| s.label("instance") == Some("db1:9890")));
    }

    #[test]
    fn test_storage_info_labels_match_counter_devices() {
        let samples = scrape(&collector(MockFs::typical_host()));

        let mut counter_devices: Vec<&str> = samples
            .iter()
            .filter(|s| s.name == "node_disk_io_now")
            .filter_map(|s| s.label("device"))
            .collect();
        let mut info_devices: Vec<&str> = samples
            .iter()
            .filter(|s| s.name == "node_system_storage_info")
            .filter_map(|s| s.label("device"))
            .collect();
        counter_devices.sort();
        info_devices.sort();
        assert_eq!(counter_devices, info_devices);
    }

    #[test]
    fn test_const_label_clash_rejected() {
        let mut labels = Labels::new();
        labels.insert("type".to_string(), "ssd".to_string());
        let result = DiskstatsCollector::new(MockFs::new(), &DiskstatsConfig::default(), &labels);
        assert!(matches!(result, Err(CollectError::InvalidDescriptor(_))));
    }

    #[test]
    fn test_registry_gathers_collector() {
        let registry = prometheus::Registry::new();
        registry
            .register(Box::new(collector(MockFs::legacy_kernel_host())))
            .unwrap();

        let families = registry.gather();
        let names: Vec<&str> = families.iter().map(|mf| mf.get_name()).collect();
        assert!(names.contains(&"node_disk_io_now"));
        assert!(names.contains(&"node_system_storage_info"));
        assert_eq!(samples(&families).len(), 11 + 1);

        let text = crate::metrics::encode_text(&families).unwrap();
        assert!(text.contains("# TYPE node_disk_bytes_total counter"));
        assert!(text.contains(
            "node_system_storage_info{device=\"sda\",rotational=\"1\",scheduler=\"deadline\"} 1"
        ));
    }

    #[test]
    fn test_registry_collect_failure_yields_nothing() {
        let registry = prometheus::Registry::new();
        registry.register(Box::new(collector(MockFs::new()))).unwrap();
        assert!(registry.gather().is_empty());
    }
}
