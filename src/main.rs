//! Debug harness: pins "focus" to a given pid and prints the spoken strings,
//! so the reporting pipeline can be exercised without a host runtime.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use color_eyre::Result;

use focustat::config::{load_config, load_config_from_path};
use focustat::host::{PinnedFocus, StdoutSpeech};
use focustat::plugin::ResourceReporter;
use focustat::system::query::SystemQuery;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportKind {
    Ram,
    Cores,
    Average,
}

#[derive(Parser)]
#[command(
    name = "focustat",
    about = "Report CPU and memory usage of a process tree as spoken text"
)]
struct Cli {
    /// Pid to treat as the focused application
    #[arg(long)]
    pid: u32,

    /// Which report to produce
    #[arg(long, value_enum, default_value = "ram")]
    report: ReportKind,

    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    let reporter = ResourceReporter::new(
        &config,
        Arc::new(PinnedFocus(cli.pid)),
        Arc::new(StdoutSpeech),
        Arc::new(SystemQuery::new()),
    );

    match cli.report {
        ReportKind::Ram => reporter.announce_ram(),
        ReportKind::Cores => reporter.announce_cpu_per_core(),
        ReportKind::Average => reporter.announce_cpu_average(),
    }

    reporter.shutdown();
    Ok(())
}
