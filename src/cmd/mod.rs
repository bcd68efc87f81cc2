//! CLI command implementations.
//!
//! | Module    | Commands handled            |
//! |-----------|-----------------------------|
//! | `phase`   | `Phases`                    |
//! | `status`  | `Status`, `Eval`            |
//! | `watch`   | `Watch`                     |
//! | `config`  | `Config`                    |

pub mod config;
pub mod phase;
pub mod status;
pub mod watch;

pub use config::cmd_config;
pub use phase::cmd_phases;
pub use status::{cmd_eval, cmd_status};
pub use watch::cmd_watch;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use phasetrack::config::TrackerConfig;
use phasetrack::registry::PhaseRegistry;
use phasetrack::snapshot::Tracker;

use super::Cli;

/// Configuration, registry, and tracker resolved for one command run.
pub struct CommandContext {
    pub config: TrackerConfig,
    pub registry: Arc<PhaseRegistry>,
    pub tracker: Tracker,
}

pub fn load_context(cli: &Cli, project_dir: &Path) -> Result<CommandContext> {
    let config = TrackerConfig::with_cli_args(
        project_dir.to_path_buf(),
        cli.registry.clone(),
        cli.ui.clone(),
    )?;
    let registry = Arc::new(config.load_registry()?);
    let tracker =
        Tracker::new(Arc::clone(&registry)).with_failed_progress(config.failed_progress());

    tracing::debug!(
        phases = registry.len(),
        failed_progress = %config.failed_progress(),
        "tracker ready"
    );

    Ok(CommandContext {
        config,
        registry,
        tracker,
    })
}
