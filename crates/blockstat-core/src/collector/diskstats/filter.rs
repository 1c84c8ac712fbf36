//! Device exclusion pattern shared by the counters and sysfs paths.

use regex::Regex;

/// Excludes ram disks, loop and floppy devices, partitions of `hd`/`sd`/`vd`/
/// `xvd` disks and NVMe namespace partitions.
pub const DEFAULT_IGNORED_DEVICES: &str = r"^(ram|loop|fd|(h|s|v|xv)d[a-z]|nvme\d+n\d+p)\d+$";

/// Compiled device exclusion pattern.
///
/// Built once per collector and only read afterwards; both data sources are
/// filtered through the same instance.
#[derive(Debug, Clone)]
pub struct DeviceFilter {
    pattern: Option<Regex>,
}

impl DeviceFilter {
    /// Compiles `pattern`. `None` builds a filter that excludes nothing.
    pub fn new(pattern: Option<&str>) -> Result<Self, regex::Error> {
        let pattern = pattern.map(Regex::new).transpose()?;
        Ok(Self { pattern })
    }

    /// A filter that keeps every device.
    pub fn disabled() -> Self {
        Self { pattern: None }
    }

    pub fn is_excluded(&self, device: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(device))
    }

    /// Source of the compiled pattern, if any.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }
}
