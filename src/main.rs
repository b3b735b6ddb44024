use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use portsweep_rs::config::{ReportFormat, ScanConfig, DEFAULT_CONCURRENCY};
use portsweep_rs::ports::DEFAULT_PORT_SPEC;
use portsweep_rs::report::{format_line, summary_line, ReportWriter};
use portsweep_rs::ScanResult;

/// portsweep-rs — concurrent TCP connect port scanner.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "portsweep-rs",
    version,
    about = "Concurrent TCP connect port scanner with banner grabbing.",
    long_about = None,
    after_help = "EXAMPLES:\n  portsweep-rs -t 192.168.1.1 -p 80,443 -o results.txt\n  portsweep-rs -t 10.0.0.0/24 -v -o verbose_scan.txt"
)]
struct Cli {
    /// Target IP or CIDR range (e.g. 192.168.1.0/24).
    #[arg(short, long)]
    target: String,

    /// Ports to scan: a range like '1-1024' or a list like '80,443'.
    #[arg(short, long, default_value = DEFAULT_PORT_SPEC)]
    ports: String,

    /// Number of concurrent workers.
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Per-connection timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = 500)]
    timeout_ms: u64,

    /// Show every connection attempt, closed ports included.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Save results to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report file layout.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,
}

impl From<Cli> for ScanConfig {
    fn from(cli: Cli) -> Self {
        ScanConfig {
            target: cli.target,
            ports_spec: cli.ports,
            concurrency: cli.concurrency,
            timeout: Duration::from_millis(cli.timeout_ms),
            verbose: cli.verbose,
            output: cli.output,
            format: cli.format,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "portsweep_rs=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = ScanConfig::from(cli);

    let plan = config
        .resolve()
        .with_context(|| format!("cannot start scan of '{}'", config.target))?;
    let mut summary = plan.summary(&config);

    let mut report = match config.output.as_deref() {
        Some(path) => Some(ReportWriter::create(path, config.format, config.verbose)?),
        None => None,
    };
    if let Some(w) = report.as_mut() {
        w.write_header(&summary, OffsetDateTime::now_utc())?;
    }

    println!(
        "{} {} | {} {} | {} {}",
        "[*] Target:".cyan(),
        config.target,
        "[*] Hosts:".cyan(),
        summary.hosts,
        "[*] Concurrency:".cyan(),
        plan.engine.concurrency()
    );
    if let Some(path) = config.output.as_deref() {
        println!("{} {}", "[*] Saving results to:".cyan(), path.display());
    }
    println!("{}", "-".repeat(65));

    // Ctrl-C cancels the scan; results gathered so far are still reported.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping scan");
            cancel_ctrlc.cancel();
        }
    });

    let started = Instant::now();
    let mut results = plan.engine.run_with_cancel(plan.ports.clone(), cancel.clone());
    while let Some(res) = results.recv().await {
        summary.record(&res);
        render(&res, config.verbose);
        if let Some(w) = report.as_mut() {
            w.record(&res)?;
        }
    }
    summary.duration = started.elapsed();

    if cancel.is_cancelled() {
        debug!(
            scanned = summary.scanned,
            expected = summary.expected(),
            "scan ended early"
        );
    }

    println!("\n{}", summary_line(&summary).green());
    if let Some(w) = report {
        w.finish(&summary)
            .context("failed to finalize report file")?;
    }
    Ok(())
}

/// Print one result; closed ports only update a transient status line unless verbose.
fn render(res: &ScanResult, verbose: bool) {
    if res.is_open() {
        println!("\r\x1b[K{}", format_line(res).green());
    } else if verbose {
        println!("\r\x1b[K{}", format_line(res).red());
    } else {
        print!(
            "\r{}",
            format!("[*] Scanning... IP: {} | Port: {}", res.address, res.port).yellow()
        );
        let _ = std::io::stdout().flush();
    }
}
