//! Pre-built mock filesystem scenarios for testing.
//!
//! Each scenario is a host running one of the three `/proc/diskstats` layouts
//! together with a matching `/sys/block` tree.

use super::filesystem::MockFs;

impl MockFs {
    /// Host on kernel 5.5+ (20 columns: discard and flush fields present).
    ///
    /// Includes a SATA disk with a partition, an NVMe namespace with a
    /// partition, a loop device and a device-mapper volume.
    pub fn typical_host() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/proc/diskstats",
            "\
   7       0 loop0 55 0 2218 12 0 0 0 0 0 24 12 0 0 0 0 0 0
   8       0 sda 12345 100 987654 5000 6789 50 456789 3000 0 4000 8000 120 0 24576 40 310 95
   8       1 sda1 10000 80 800000 4000 5000 40 400000 2500 0 3500 6500 0 0 0 0 0 0
 259       0 nvme0n1 50000 200 2000000 10000 30000 150 1500000 8000 5 15000 18000 600 2 98304 150 900 210
 259       1 nvme0n1p1 40000 150 1800000 9000 25000 100 1200000 7000 0 12000 16000 0 0 0 0 0 0
 253       0 dm-0 4000 0 200000 1500 3000 0 180000 1200 0 2500 2700 0 0 0 0 0 0
",
        );

        fs.add_block_device("/sys/block", "loop0", "0\n", "none\n");
        fs.add_block_device("/sys/block", "sda", "1\n", "mq-deadline kyber [bfq] none\n");
        fs.add_block_device("/sys/block", "nvme0n1", "0\n", "[none] mq-deadline kyber\n");
        fs.add_block_device("/sys/block", "dm-0", "0\n", "none\n");

        fs
    }

    /// Host on kernel 4.18 to 5.4 (18 columns: discard fields, no flush).
    pub fn kernel_4_18_host() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/proc/diskstats",
            "\
   8       0 sda 12345 100 987654 5000 6789 50 456789 3000 0 4000 8000 120 0 24576 40
   8       1 sda1 10000 80 800000 4000 5000 40 400000 2500 0 3500 6500 0 0 0 0
 259       0 nvme0n1 50000 200 2000000 10000 30000 150 1500000 8000 5 15000 18000 600 2 98304 150
",
        );

        fs.add_block_device("/sys/block", "sda", "1\n", "noop [mq-deadline] kyber\n");
        fs.add_block_device("/sys/block", "nvme0n1", "0\n", "[none] mq-deadline\n");

        fs
    }

    /// Host on a kernel older than 4.18 (14 columns: base fields only).
    pub fn legacy_kernel_host() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/proc/diskstats",
            "\
   1       0 ram0 0 0 0 0 0 0 0 0 0 0 0
   8       0 sda 12345 100 987654 5000 6789 50 456789 3000 0 4000 8000
   8       1 sda1 10000 80 800000 4000 5000 40 400000 2500 0 3500 6500
",
        );

        fs.add_block_device("/sys/block", "ram0", "0\n", "none\n");
        fs.add_block_device("/sys/block", "sda", "1\n", "noop [deadline] cfq\n");

        fs
    }
}
