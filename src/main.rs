// src/main.rs

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing::info;

use hostprobe::core::config::{
    DEFAULT_DNS_REPEATS, DEFAULT_GEO_DATABASE, DEFAULT_MAX_REDIRECT_HOPS, ScanConfig,
};
use hostprobe::core::scanner::Scanner;
use hostprobe::core::scanner::geo_scanner::open_locator;
use hostprobe::core::scanner::runner::ProcessRunner;
use hostprobe::core::store;
use hostprobe::{logging, report};

/// Unauthenticated network reconnaissance for a list of hostnames.
#[derive(Debug, Parser)]
#[command(name = "hostprobe", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Probe every hostname in a file and write one JSON record per host
    Scan {
        /// Text file with one hostname per line
        input_file: PathBuf,
        /// JSON file receiving the host records
        output_file: PathBuf,
        #[command(flatten)]
        options: ScanOptions,
    },
    /// Render a JSON record file into plain-text tables
    Report {
        /// JSON file produced by `scan`
        input_file: PathBuf,
        /// Text file receiving the tables
        output_file: PathBuf,
    },
}

#[derive(Debug, Args)]
struct ScanOptions {
    /// Deadline for each external command and HTTP request, in milliseconds
    #[arg(long = "timeout-ms", default_value_t = 2000)]
    timeout_ms: u64,
    /// How many times each public resolver is queried
    #[arg(long, default_value_t = DEFAULT_DNS_REPEATS)]
    dns_repeats: usize,
    /// Maximum redirects followed by the HTTPS-redirect and HSTS checks
    #[arg(long, default_value_t = DEFAULT_MAX_REDIRECT_HOPS)]
    max_hops: usize,
    /// Path to a MaxMind GeoLite2-City database
    #[arg(long, default_value = DEFAULT_GEO_DATABASE)]
    geo_db: PathBuf,
    /// Number of hosts scanned at the same time
    #[arg(long, default_value_t = 1)]
    host_concurrency: usize,
}

impl ScanOptions {
    fn into_config(self) -> ScanConfig {
        let timeout = Duration::from_millis(self.timeout_ms);
        ScanConfig {
            dns_repeats: self.dns_repeats,
            command_timeout: timeout,
            http_timeout: timeout,
            max_redirect_hops: self.max_hops,
            geo_database: self.geo_db,
            host_concurrency: self.host_concurrency.max(1),
            ..ScanConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let log_path = logging::initialize_logging()?;
    info!(log = %log_path.display(), "hostprobe started.");

    match cli.command {
        Commands::Scan { input_file, output_file, options } => {
            run_scan(&input_file, &output_file, options.into_config()).await
        }
        Commands::Report { input_file, output_file } => report::generate_report(&input_file, &output_file),
    }
}

async fn run_scan(input: &std::path::Path, output: &std::path::Path, config: ScanConfig) -> Result<()> {
    let hostnames = store::load_hostnames(input)?;
    info!(hosts = hostnames.len(), "Loaded hostnames.");

    let runner = ProcessRunner::new(config.command_timeout);
    let geo = open_locator(&config.geo_database);
    let scanner = Scanner::new(runner, geo, config);

    let records = scanner
        .scan_hosts(&hostnames, |hostname| println!("creating entry for {hostname}"))
        .await;

    store::write_records(output, &records)?;
    info!(kept = records.len(), output = %output.display(), "Records written.");
    Ok(())
}
