//! Streaming evaluation: `phasetrack watch`.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use phasetrack::feed::read_snapshots;
use phasetrack::snapshot::Snapshot;
use phasetrack::ui::TrackerUI;

use super::super::Cli;
use super::load_context;

const FEED_BUFFER: usize = 64;

pub async fn cmd_watch(
    cli: &Cli,
    project_dir: &Path,
    input: Option<&Path>,
    until_done: bool,
) -> Result<()> {
    let ctx = load_context(cli, project_dir)?;

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open snapshot stream: {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let (tx, mut rx) = mpsc::channel::<Snapshot>(FEED_BUFFER);
    let feed = tokio::spawn(read_snapshots(reader, tx));

    let ui = TrackerUI::new(Arc::clone(&ctx.registry), ctx.config.ui_mode())?;
    let mut last = None;

    loop {
        tokio::select! {
            next = rx.recv() => {
                let Some(snapshot) = next else { break };
                let report = ctx.tracker.evaluate(&snapshot);
                ui.handle_report(&report)?;
                let done = until_done && report.is_terminal();
                last = Some(report);
                if done {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted; stopping watch");
                break;
            }
        }
    }

    // The reader may still be blocked on input after an early stop.
    drop(rx);
    feed.abort();
    ui.finish(last.as_ref())?;

    match feed.await {
        Ok(Ok(stats)) => {
            info!(
                accepted = stats.accepted,
                skipped = stats.skipped,
                "snapshot stream finished"
            );
        }
        Ok(Err(err)) => return Err(err).context("Snapshot stream failed"),
        Err(err) if err.is_cancelled() => {}
        Err(err) => return Err(err).context("Snapshot reader task panicked"),
    }

    Ok(())
}
