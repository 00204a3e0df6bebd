//! `muonmon run`: drive the monitor over a record stream.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use dqm_hist::RegistrySnapshot;
use dqm_monitor::{MonitorRun, MuonMonitor, RunOutput, RunSummary};
use serde::Serialize;

use crate::input::{Record, Records};

/// Contents of `run_<number>.json`.
#[derive(Debug, Serialize)]
struct RunFile {
    run: u32,
    summary: RunSummary,
    #[serde(flatten)]
    snapshot: RegistrySnapshot,
}

/// One line of the report printed on stdout.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run: u32,
    pub output: PathBuf,
    pub summary: RunSummary,
}

pub fn run_stream(monitor: &MuonMonitor, input: &Path, out_dir: &Path) -> Result<Vec<RunReport>> {
    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut reports = Vec::new();
    let mut current: Option<MonitorRun> = None;
    let mut seen = BTreeSet::new();
    for record in Records::new(BufReader::new(file)) {
        let (line, record) = record?;
        match record {
            Record::Run(ctx) => {
                if !seen.insert(ctx.run) {
                    bail!("line {line}: run {} was already processed from this stream", ctx.run);
                }
                if let Some(run) = current.take() {
                    reports.push(write_run(run.finish(), out_dir)?);
                }
                tracing::info!(run = ctx.run, line, "starting run");
                current = Some(monitor.start_run(&ctx)?);
            }
            Record::Event(event) => {
                let Some(run) = current.as_mut() else {
                    bail!("line {line}: event before the first run record");
                };
                if event.id.run != run.run() {
                    bail!(
                        "line {line}: event {} does not belong to run {}",
                        event.id,
                        run.run()
                    );
                }
                monitor.process_event(run, &*event)?;
            }
        }
    }
    if let Some(run) = current {
        reports.push(write_run(run.finish(), out_dir)?);
    }
    Ok(reports)
}

fn write_run(output: RunOutput, out_dir: &Path) -> Result<RunReport> {
    let path = out_dir.join(format!("run_{}.json", output.run));
    let file = RunFile {
        run: output.run,
        summary: output.summary,
        snapshot: output.registry.snapshot(),
    };
    std::fs::write(&path, serde_json::to_string_pretty(&file)?)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(run = output.run, path = %path.display(), "wrote histograms");
    Ok(RunReport { run: output.run, output: path, summary: output.summary })
}
