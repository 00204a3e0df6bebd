//! muonmon: muon trigger-efficiency monitor CLI

mod input;
mod run;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dqm_monitor::{AxisConfig, MonitorConfig, MuonMonitor};

#[derive(Parser)]
#[command(name = "muonmon")]
#[command(about = "Muon trigger-efficiency monitor")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill numerator/denominator histograms from a JSON-lines event stream
    Run {
        /// Monitor configuration (YAML, or JSON with a .json extension)
        #[arg(short, long)]
        config: PathBuf,

        /// Event stream (JSON lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory receiving one run_<number>.json per run
        #[arg(long, default_value = "muonmon_out")]
        out_dir: PathBuf,
    },

    /// Print the default configuration as YAML
    Defaults {
        /// Number of bins of the muon pT axis
        #[arg(long, default_value = "100")]
        pt_bins: i64,

        /// Upper edge of the muon pT axis (GeV)
        #[arg(long, default_value = "500.0")]
        pt_max: f64,
    },

    /// Check a configuration: binnings, selections and trigger gates
    Validate {
        /// Monitor configuration
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Run { config, input, out_dir } => cmd_run(&config, &input, &out_dir),
        Commands::Defaults { pt_bins, pt_max } => cmd_defaults(pt_bins, pt_max),
        Commands::Validate { config } => cmd_validate(&config),
    }
}

fn load_monitor(path: &Path) -> Result<MuonMonitor> {
    let config = MonitorConfig::from_path(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    MuonMonitor::new(config).with_context(|| format!("invalid config {}", path.display()))
}

fn cmd_run(config: &Path, input: &Path, out_dir: &Path) -> Result<()> {
    let monitor = load_monitor(config)?;
    let reports = run::run_stream(&monitor, input, out_dir)?;
    tracing::info!(runs = reports.len(), "done");
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

fn cmd_defaults(pt_bins: i64, pt_max: f64) -> Result<()> {
    let config = MonitorConfig::new(AxisConfig::new(pt_bins, 0.0, pt_max));
    print!("{}", config.to_yaml()?);
    Ok(())
}

fn cmd_validate(config: &Path) -> Result<()> {
    let monitor = load_monitor(config)?;
    let gates = [monitor.numerator_gate(), monitor.denominator_gate()]
        .map(|g| format!("{} gate {}", g.label(), if g.is_on() { "on" } else { "off" }));
    println!(
        "ok: folder '{}', {} histogram pairs, {}",
        monitor.config().folder_name,
        dqm_monitor::HIST_NAMES.len(),
        gates.join(", "),
    );
    Ok(())
}
