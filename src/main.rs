use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use phasetrack::logging::{LogConfig, LogFormat, init_logging};

mod cmd;

#[derive(Parser)]
#[command(name = "phasetrack")]
#[command(version, about = "Pipeline phase-progress tracker")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Path to a registry.json. Overrides tracker.toml and PHASETRACK_REGISTRY.
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    /// UI output mode: full, minimal, json. Overrides tracker.toml and PHASETRACK_UI.
    #[arg(long, global = true)]
    pub ui: Option<String>,

    /// Log line format on stderr: text, json
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the phases of the registry in execution order
    Phases,
    /// Evaluate one snapshot given on the command line
    Status {
        /// Current phase: a phase id, "completed", or "failed"
        #[arg(short, long)]
        phase: String,

        /// Fraction of the current phase that is done (usually 0.0-1.0)
        #[arg(long, allow_hyphen_values = true)]
        progress: Option<f64>,

        /// Sub-stage counter for the sub-staged phase
        #[arg(long, allow_hyphen_values = true)]
        stage: Option<i64>,

        /// Phase that was running when the pipeline failed
        #[arg(long)]
        failed_phase: Option<String>,
    },
    /// Evaluate one JSON snapshot read from a file or stdin
    Eval {
        /// Snapshot file (reads stdin when omitted)
        input: Option<PathBuf>,
    },
    /// Render a stream of JSON-lines snapshots from a file or stdin
    Watch {
        /// Snapshot stream (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Stop after the first completed or failed snapshot
        #[arg(long)]
        until_done: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default tracker.toml file
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogConfig {
        verbose: cli.verbose,
        format: cli.log_format,
    })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;
    let result = runtime.block_on(run(&cli));

    // A stdin read parked on a blocking thread must not hold the process open.
    runtime.shutdown_background();
    result
}

async fn run(cli: &Cli) -> Result<()> {
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Phases => cmd::cmd_phases(cli, &project_dir)?,
        Commands::Status {
            phase,
            progress,
            stage,
            failed_phase,
        } => cmd::cmd_status(
            cli,
            &project_dir,
            phase,
            *progress,
            *stage,
            failed_phase.as_deref(),
        )?,
        Commands::Eval { input } => cmd::cmd_eval(cli, &project_dir, input.as_deref())?,
        Commands::Watch { input, until_done } => {
            cmd::cmd_watch(cli, &project_dir, input.as_deref(), *until_done).await?
        }
        Commands::Config { command } => cmd::cmd_config(cli, &project_dir, command.clone())?,
    }

    Ok(())
}
