//! Registry listing: `phasetrack phases`.

use anyhow::Result;
use std::path::Path;

use super::super::Cli;
use super::load_context;

pub fn cmd_phases(cli: &Cli, project_dir: &Path) -> Result<()> {
    let ctx = load_context(cli, project_dir)?;

    println!();
    match ctx.config.registry_path() {
        Some(path) if path.exists() => println!("Registry loaded from: {}", path.display()),
        _ => println!("Registry: built-in reference pipeline"),
    }
    println!();
    println!(
        "{:<4} {:<20} {:<12} {:<7} Label",
        "#", "Id", "Short", "Stages"
    );
    println!(
        "{:<4} {:<20} {:<12} {:<7} -----",
        "----", "--------------------", "------------", "-------"
    );

    for (index, phase) in ctx.registry.phases().iter().enumerate() {
        let stages = phase
            .sub_stages
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<4} {:<20} {:<12} {:<7} {}",
            index + 1,
            phase.id,
            phase.display_short_label(),
            stages,
            phase.label
        );
        if cli.verbose && !phase.description.is_empty() {
            println!("     {}", console::style(&phase.description).dim());
        }
    }
    println!();
    println!("{} phases", ctx.registry.len());
    println!();

    Ok(())
}
