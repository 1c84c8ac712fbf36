//! blockstat-core: block device statistics collector.
//!
//! Provides:
//! - `collector`: the `/proc/diskstats` + `/sys/block` collector, the
//!   filesystem abstraction it reads through and mock fixtures for tests
//! - `metrics`: const metric descriptors and sinks on the `prometheus` data model, text and JSON export

pub mod collector;
pub mod metrics;
