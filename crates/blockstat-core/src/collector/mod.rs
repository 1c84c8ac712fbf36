//! Block device metrics collector for Linux.
//!
//! This module provides the diskstats collector and the filesystem abstraction
//! it reads through, with support for mocking for testing on macOS.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     DiskstatsCollector                       │
//! │  ┌──────────────────────┐      ┌──────────────────────────┐  │
//! │  │  parse_diskstats     │      │  read_storage_properties │  │
//! │  │  - /proc/diskstats   │      │  - /sys/block/*/queue/*  │  │
//! │  └──────────┬───────────┘      └────────────┬─────────────┘  │
//! │             └───────── DeviceFilter ────────┘                │
//! │                            │                                 │
//! │                     ┌──────▼──────┐                          │
//! │                     │  FileSystem │ (trait)                  │
//! │                     └──────┬──────┘                          │
//! └────────────────────────────┼─────────────────────────────────┘
//!                              │
//!              ┌───────────────┼───────────────┐
//!              │               │               │
//!       ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//!       │   RealFs    │ │   MockFs    │ │  Scenarios  │
//!       │ (Linux)     │ │ (Testing)   │ │ (Fixtures)  │
//!       └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ## Production (Linux)
//!
//! ```ignore
//! use blockstat_core::collector::{Collector, DiskstatsCollector, DiskstatsConfig, RealFs};
//! use blockstat_core::metrics::{Families, Labels, encode_text};
//!
//! let collector = DiskstatsCollector::new(RealFs::new(), &DiskstatsConfig::default(), &Labels::new())?;
//! let mut families = Families::new();
//! collector.update(&mut families)?;
//! print!("{}", encode_text(families.as_slice())?);
//! ```
//!
//! ## Testing (with MockFs)
//!
//! ```
//! use blockstat_core::collector::{Collector, DiskstatsCollector, DiskstatsConfig, MockFs};
//! use blockstat_core::metrics::{Families, Labels};
//!
//! let fs = MockFs::typical_host();
//! let collector = DiskstatsCollector::new(fs, &DiskstatsConfig::default(), &Labels::new()).unwrap();
//! let mut families = Families::new();
//! collector.update(&mut families).unwrap();
//! assert!(families.metric_count() > 0);
//! ```
//!
//! ## With a `prometheus::Registry`
//!
//! ```
//! use blockstat_core::collector::{DiskstatsCollector, DiskstatsConfig, MockFs};
//! use blockstat_core::metrics::Labels;
//!
//! let collector =
//!     DiskstatsCollector::new(MockFs::typical_host(), &DiskstatsConfig::default(), &Labels::new()).unwrap();
//! let registry = prometheus::Registry::new();
//! registry.register(Box::new(collector)).unwrap();
//! assert!(!registry.gather().is_empty());
//! ```

pub mod diskstats;
pub mod mock;
pub mod traits;

pub use diskstats::{CollectError, DiskstatsCollector, DiskstatsConfig};
pub use mock::MockFs;
pub use traits::{Collector, FileSystem, RealFs};
