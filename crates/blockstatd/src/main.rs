//! blockstatd - Block device metrics collector.
//!
//! Scrapes /proc/diskstats and /sys/block on a fixed interval and writes the
//! result as Prometheus text (or JSON) to stdout or to a file, e.g. inside a
//! node exporter textfile directory.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use blockstat_core::collector::diskstats::DEFAULT_IGNORED_DEVICES;
use blockstat_core::collector::{Collector, DiskstatsCollector, DiskstatsConfig, RealFs};
use blockstat_core::metrics::{Families, Labels, encode_text, samples};

/// Output encoding of a scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Prometheus text exposition format.
    Text,
    /// JSON array of samples, one per metric.
    Json,
}

/// Block device metrics collector.
#[derive(Parser)]
#[command(name = "blockstatd", about = "Block device metrics collector", version)]
struct Args {
    /// Path to /proc filesystem (for testing/containers).
    #[arg(long, default_value = "/proc")]
    proc_path: PathBuf,

    /// Glob matching one sysfs directory per block device.
    #[arg(long, default_value = "/sys/block/*")]
    sysfs_block_glob: String,

    /// Regular expression of device names to ignore.
    #[arg(long, value_name = "REGEX", default_value = DEFAULT_IGNORED_DEVICES)]
    ignored_devices: String,

    /// Collect every device, ignoring --ignored-devices.
    #[arg(long)]
    no_device_filter: bool,

    /// Constant label added to every metric (repeatable).
    #[arg(long = "label", value_name = "KEY=VALUE", value_parser = parse_label)]
    labels: Vec<(String, String)>,

    /// Collection interval in seconds.
    #[arg(short, long, default_value = "15")]
    interval: u64,

    /// Collect once and exit.
    #[arg(long)]
    once: bool,

    /// Write metrics to this file instead of stdout. The file is replaced
    /// atomically on every scrape.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn diskstats_config(&self) -> DiskstatsConfig {
        let ignored = (!self.no_device_filter).then(|| self.ignored_devices.clone());
        DiskstatsConfig::default()
            .with_proc_path(self.proc_path.clone())
            .with_sysfs_block_glob(&self.sysfs_block_glob)
            .with_ignored_devices(ignored)
    }

    fn const_labels(&self) -> Labels {
        self.labels.iter().cloned().collect()
    }
}

/// Parses a `KEY=VALUE` label argument.
fn parse_label(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid label '{}': expected KEY=VALUE", s))?;
    let key = key.trim();

    let mut chars = key.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("invalid label name '{}'", key));
    }

    Ok((key.to_string(), value.to_string()))
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["blockstatd", "blockstat_core"] {
        match format!("{}={}", target, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("invalid log directive for {}: {}", target, e),
        }
    }

    // Logs go to stderr so they never mix with metrics written to stdout.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Encodes gathered families in the requested format.
fn render(families: &Families, format: Format) -> io::Result<String> {
    match format {
        Format::Text => encode_text(families.as_slice()).map_err(io::Error::other),
        Format::Json => {
            let flat = samples(families.as_slice());
            let mut json = serde_json::to_string_pretty(&flat).map_err(io::Error::other)?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Replaces `path` with `content` via a temporary sibling file and a rename,
/// so readers never observe a partially written file.
fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let mut tmp_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name"))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, content)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}

fn write_output(output: Option<&Path>, content: &str) -> io::Result<()> {
    match output {
        Some(path) => write_atomic(path, content),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()
        }
    }
}

/// Runs one scrape and writes its result. Returns the number of metrics.
fn scrape_once(collector: &dyn Collector, args: &Args) -> Result<usize, String> {
    let mut families = Families::new();
    collector
        .update(&mut families)
        .map_err(|e| format!("collect diskstats failed: {}", e))?;

    let content = render(&families, args.format).map_err(|e| format!("render failed: {}", e))?;
    write_output(args.output.as_deref(), &content)
        .map_err(|e| format!("write metrics failed: {}", e))?;

    Ok(families.metric_count())
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("blockstatd {} starting", env!("CARGO_PKG_VERSION"));

    let config = args.diskstats_config();
    info!(
        "Config: proc={}, sysfs={}, ignored_devices={}",
        config.proc_path.display(),
        config.sysfs_block_glob,
        config.ignored_devices.as_deref().unwrap_or("<none>")
    );

    let labels = args.const_labels();
    if !labels.is_empty() {
        info!("Constant labels: {:?}", labels);
    }

    let collector = match DiskstatsCollector::new(RealFs::new(), &config, &labels) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create diskstats collector: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.once {
        return match scrape_once(&collector, &args) {
            Ok(count) => {
                debug!("Collected {} samples", count);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    let interval = Duration::from_secs(args.interval.max(1));

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Starting collection loop, interval={}s", interval.as_secs());

    let mut scrape_count: u64 = 0;
    while running.load(Ordering::SeqCst) {
        let start = Instant::now();
        match scrape_once(&collector, &args) {
            Ok(count) => {
                scrape_count += 1;
                debug!(
                    "Scrape #{}: {} samples in {:?}",
                    scrape_count,
                    count,
                    start.elapsed()
                );
            }
            Err(e) => {
                error!("{}", e);
            }
        }

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval.saturating_sub(start.elapsed());
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}
