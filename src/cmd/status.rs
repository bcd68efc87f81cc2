//! One-shot evaluation: `phasetrack status` and `phasetrack eval`.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use phasetrack::snapshot::Snapshot;
use phasetrack::ui::print_report;

use super::super::Cli;
use super::load_context;

pub fn cmd_status(
    cli: &Cli,
    project_dir: &Path,
    phase: &str,
    progress: Option<f64>,
    stage: Option<i64>,
    failed_phase: Option<&str>,
) -> Result<()> {
    let ctx = load_context(cli, project_dir)?;

    let mut snapshot = Snapshot::new(phase);
    if let Some(fraction) = progress {
        snapshot = snapshot.with_progress(fraction);
    }
    if let Some(stage) = stage {
        snapshot = snapshot.with_stage(stage);
    }
    if let Some(failed) = failed_phase {
        snapshot = snapshot.with_failed_phase(failed);
    }

    let report = ctx.tracker.evaluate(&snapshot);
    print_report(&ctx.registry, &report, ctx.config.ui_mode())
}

pub fn cmd_eval(cli: &Cli, project_dir: &Path, input: Option<&Path>) -> Result<()> {
    let ctx = load_context(cli, project_dir)?;

    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read snapshot from stdin")?;
            buf
        }
    };

    let snapshot: Snapshot =
        serde_json::from_str(raw.trim()).context("Failed to parse snapshot JSON")?;
    let report = ctx.tracker.evaluate(&snapshot);
    print_report(&ctx.registry, &report, ctx.config.ui_mode())
}
