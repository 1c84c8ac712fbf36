//! Positional layout of `/proc/diskstats` rows across kernel revisions.
//!
//! The kernel appends fields to the end of each row as the ABI evolves, so a
//! counter's meaning is its index. Every supported revision is one [`Tier`]:
//! the vector length it produces and the fields it adds on top of the previous
//! tier. Row-width validation in the parser is derived from the same table.
//!
//! See <https://www.kernel.org/doc/Documentation/ABI/testing/procfs-diskstats>.

/// Columns preceding the counters: major, minor, device name.
pub const HEADER_COLUMNS: usize = 3;

pub const OP_READS: &str = "reads";
pub const OP_WRITES: &str = "writes";
pub const OP_DISCARDS: &str = "discards";
pub const OP_FLUSH: &str = "flush";

/// Metric family a counter position feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskMetric {
    Completed,
    Merged,
    Bytes,
    Time,
    IoNow,
    IoTime,
    IoTimeWeighted,
}

/// One counter position.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// Index into the counter vector (header columns already stripped).
    pub index: usize,
    pub metric: DiskMetric,
    /// Value of the `type` label, `None` for device-level metrics.
    pub op: Option<&'static str>,
}

const fn field(index: usize, metric: DiskMetric, op: Option<&'static str>) -> Field {
    Field { index, metric, op }
}

/// Fields introduced by one kernel revision.
#[derive(Debug)]
pub struct Tier {
    /// Counter vector length produced by this revision.
    pub len: usize,
    pub fields: &'static [Field],
}

impl Tier {
    /// Total whitespace-separated columns of a row in this revision.
    pub const fn row_width(&self) -> usize {
        self.len + HEADER_COLUMNS
    }
}

use DiskMetric::*;

const BASE_FIELDS: [Field; 11] = [
    field(0, Completed, Some(OP_READS)),
    field(1, Merged, Some(OP_READS)),
    field(2, Bytes, Some(OP_READS)),
    field(3, Time, Some(OP_READS)),
    field(4, Completed, Some(OP_WRITES)),
    field(5, Merged, Some(OP_WRITES)),
    field(6, Bytes, Some(OP_WRITES)),
    field(7, Time, Some(OP_WRITES)),
    field(8, IoNow, None),
    field(9, IoTime, None),
    field(10, IoTimeWeighted, None),
];

const DISCARD_FIELDS: [Field; 4] = [
    field(11, Completed, Some(OP_DISCARDS)),
    field(12, Merged, Some(OP_DISCARDS)),
    field(13, Bytes, Some(OP_DISCARDS)),
    field(14, Time, Some(OP_DISCARDS)),
];

const FLUSH_FIELDS: [Field; 2] = [
    field(15, Completed, Some(OP_FLUSH)),
    field(16, Time, Some(OP_FLUSH)),
];

/// Supported revisions, oldest first. A vector of length `n` carries every
/// tier whose `len <= n`.
pub const TIERS: &[Tier] = &[
    // before 4.18
    Tier {
        len: 11,
        fields: &BASE_FIELDS,
    },
    // 4.18+
    Tier {
        len: 15,
        fields: &DISCARD_FIELDS,
    },
    // 5.5+
    Tier {
        len: 17,
        fields: &FLUSH_FIELDS,
    },
];

/// Row widths (including header columns) the parser accepts.
pub fn valid_row_widths() -> Vec<usize> {
    TIERS.iter().map(Tier::row_width).collect()
}

pub fn is_valid_row_width(columns: usize) -> bool {
    TIERS.iter().any(|tier| tier.row_width() == columns)
}

/// Fields present in a counter vector of the given length, in emission order.
pub fn fields_for(len: usize) -> impl Iterator<Item = &'static Field> {
    TIERS
        .iter()
        .take_while(move |tier| tier.len <= len)
        .flat_map(|tier| tier.fields.iter())
}
