//! Configuration view and validation commands: `phasetrack config`.

use anyhow::Result;
use std::path::Path;

use phasetrack::config::{TrackerConfig, TrackerToml};

use super::super::{Cli, ConfigCommands};

pub fn cmd_config(cli: &Cli, project_dir: &Path, command: Option<ConfigCommands>) -> Result<()> {
    let config = TrackerConfig::with_cli_args(
        project_dir.to_path_buf(),
        cli.registry.clone(),
        cli.ui.clone(),
    )?;
    let config_path = config.config_file();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Tracker Configuration");
            println!("=====================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No tracker.toml found at {}", config_path.display());
                println!("Using default configuration.");
            }
            println!();

            let toml = &config.toml;
            println!("[registry]");
            match &toml.registry.path {
                Some(path) => println!("  path = \"{}\"", path.display()),
                None => println!("  # path unset: built-in reference registry"),
            }
            println!();
            println!("[progress]");
            println!("  failed_progress = \"{}\"", toml.progress.failed_progress);
            println!();
            println!("[display]");
            println!("  ui = \"{}\"", toml.display.ui);
            println!();

            println!("Effective values (with env/CLI overrides):");
            match config.registry_path() {
                Some(path) => println!("  registry = \"{}\"", path.display()),
                None => println!("  registry = <reference>"),
            }
            println!("  ui = {:?}", config.ui_mode());
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("tracker.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !config.tracker_dir.exists() {
                std::fs::create_dir_all(&config.tracker_dir)?;
            }

            TrackerToml::default().save(&config_path)?;

            println!("Created tracker.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [registry] path to a registry.json");
            println!("  - [progress] failed_progress = \"reset\" | \"hold\"");
            println!("  - [display] ui = \"full\" | \"minimal\" | \"json\"");
            println!();
        }
    }

    Ok(())
}
