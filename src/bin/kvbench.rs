//! kvbench Binary
//!
//! Runs a write/read/delete throughput benchmark against a directory or a
//! raw block device.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use kvbench::{open_backend, BenchConfig, BenchmarkDriver, ReadMode};
use tracing_subscriber::{fmt, EnvFilter};

/// kvbench
#[derive(Parser, Debug)]
#[command(name = "kvbench")]
#[command(about = "Throughput benchmark for put/get/delete storage backends")]
#[command(version)]
struct Args {
    /// Target directory, or a device path under /dev
    #[arg(short, long)]
    path: PathBuf,

    /// Duration of each time-bounded phase in seconds
    #[arg(short, long, default_value = "10")]
    duration: u64,

    /// Value size in bytes
    #[arg(short, long, default_value = "2097152")]
    size: usize,

    /// Concurrent workers per phase
    #[arg(short = 't', long, default_value = "1")]
    workers: usize,

    /// How the read phase terminates
    #[arg(long, value_enum, default_value_t = ReadModeArg::SinglePass)]
    read_mode: ReadModeArg,

    /// Skip O_SYNC on writes
    #[arg(long)]
    no_sync: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReadModeArg {
    SinglePass,
    Timed,
}

impl From<ReadModeArg> for ReadMode {
    fn from(arg: ReadModeArg) -> Self {
        match arg {
            ReadModeArg::SinglePass => ReadMode::SinglePass,
            ReadModeArg::Timed => ReadMode::Timed,
        }
    }
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only the report
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kvbench=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("kvbench v{}", kvbench::VERSION);
    tracing::info!("Target: {}", args.path.display());

    let config = BenchConfig::builder()
        .target(&args.path)
        .duration(Duration::from_secs(args.duration))
        .value_size(args.size)
        .workers(args.workers)
        .read_mode(args.read_mode.into())
        .sync_writes(!args.no_sync)
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        return ExitCode::FAILURE;
    }

    let backend = match open_backend(&config) {
        Ok(b) => b,
        Err(e) => {
            tracing::error!("Failed to open backend: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let driver = match BenchmarkDriver::new(backend.as_ref(), config) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let report = match driver.run() {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Benchmark failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                tracing::error!("Failed to encode report: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", report);
    }

    ExitCode::SUCCESS
}
