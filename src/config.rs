//! Layered configuration for the tracker.
//!
//! Settings are read from `.phasetrack/tracker.toml`, then environment
//! variables, then CLI flags (later layers win).
//!
//! # Configuration File Format
//!
//! ```toml
//! [registry]
//! path = "registry.json"
//!
//! [progress]
//! failed_progress = "reset"
//!
//! [display]
//! ui = "full"
//! ```
//!
//! A relative `registry.path` is resolved against the `.phasetrack` directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::progress::FailedProgress;
use crate::registry::{PhaseRegistry, load_registry_or_default};
use crate::ui::UiMode;

/// Directory holding tracker configuration inside a project.
pub const TRACKER_DIR: &str = ".phasetrack";
/// Config file name inside [`TRACKER_DIR`].
pub const CONFIG_FILE: &str = "tracker.toml";

/// Environment override for the registry path.
pub const ENV_REGISTRY: &str = "PHASETRACK_REGISTRY";
/// Environment override for the UI mode.
pub const ENV_UI: &str = "PHASETRACK_UI";

const UI_MODES: [&str; 3] = ["full", "minimal", "json"];

/// Where the phase registry comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySection {
    /// Path to a `registry.json`; the reference registry is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Overall-progress settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressSection {
    /// Percentage reported for a failed job
    #[serde(default)]
    pub failed_progress: FailedProgress,
}

/// Terminal output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySection {
    /// UI mode: full, minimal, json
    #[serde(default = "default_ui")]
    pub ui: String,
}

fn default_ui() -> String {
    "full".to_string()
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self { ui: default_ui() }
    }
}

/// The complete tracker.toml configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrackerToml {
    #[serde(default)]
    pub registry: RegistrySection,
    #[serde(default)]
    pub progress: ProgressSection,
    #[serde(default)]
    pub display: DisplaySection,
}

impl TrackerToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse tracker.toml")
    }

    /// Load `tracker.toml` from `tracker_dir`, or defaults when it does not exist.
    pub fn load_or_default(tracker_dir: &Path) -> Result<Self> {
        let config_path = tracker_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize tracker.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self, tracker_dir: &Path) -> Vec<String> {
        let mut warnings = Vec::new();

        if !UI_MODES.contains(&self.display.ui.to_lowercase().as_str()) {
            warnings.push(format!(
                "Unknown display.ui '{}': expected one of full, minimal, json (falls back to full)",
                self.display.ui
            ));
        }

        if let Some(path) = &self.registry.path {
            let resolved = resolve_path(tracker_dir, path);
            if !resolved.exists() {
                warnings.push(format!(
                    "Registry file {} does not exist; the reference registry will be used",
                    resolved.display()
                ));
            } else if let Err(err) = PhaseRegistry::load(&resolved) {
                warnings.push(format!("Registry file is invalid: {}", err));
            }
        }

        warnings
    }
}

fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Environment variable value, ignoring unset and empty values.
fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Unified configuration combining tracker.toml with environment and CLI overrides.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Path to the project directory
    pub project_dir: PathBuf,
    /// Path to the .phasetrack directory
    pub tracker_dir: PathBuf,
    /// Parsed tracker.toml configuration
    pub toml: TrackerToml,
    /// CLI override: registry path
    pub cli_registry: Option<PathBuf>,
    /// CLI override: UI mode
    pub cli_ui: Option<String>,
}

impl TrackerConfig {
    /// Load configuration for a project directory.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let tracker_dir = project_dir.join(TRACKER_DIR);
        let toml = TrackerToml::load_or_default(&tracker_dir)?;

        Ok(Self {
            project_dir,
            tracker_dir,
            toml,
            cli_registry: None,
            cli_ui: None,
        })
    }

    /// Load configuration with CLI overrides.
    pub fn with_cli_args(
        project_dir: PathBuf,
        registry: Option<PathBuf>,
        ui: Option<String>,
    ) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.cli_registry = registry;
        config.cli_ui = ui;
        Ok(config)
    }

    /// Path to tracker.toml.
    pub fn config_file(&self) -> PathBuf {
        self.tracker_dir.join(CONFIG_FILE)
    }

    /// Registry path (CLI → env → file), or `None` for the reference registry.
    ///
    /// CLI and env paths are taken as given; a file path is relative to the
    /// `.phasetrack` directory.
    pub fn registry_path(&self) -> Option<PathBuf> {
        self.registry_override().or_else(|| {
            self.toml
                .registry
                .path
                .as_deref()
                .map(|path| resolve_path(&self.tracker_dir, path))
        })
    }

    /// Registry path named explicitly on the command line or in the environment.
    fn registry_override(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_registry {
            return Some(path.clone());
        }
        non_empty_env(ENV_REGISTRY).map(PathBuf::from)
    }

    /// UI mode (CLI → env → file → full).
    pub fn ui_mode(&self) -> UiMode {
        let raw = self
            .cli_ui
            .clone()
            .or_else(|| non_empty_env(ENV_UI))
            .unwrap_or_else(|| self.toml.display.ui.clone());
        UiMode::parse(&raw)
    }

    pub fn failed_progress(&self) -> FailedProgress {
        self.toml.progress.failed_progress
    }

    /// Load the configured registry.
    ///
    /// A registry named by `--registry` or `PHASETRACK_REGISTRY` must exist.
    /// A missing `registry.path` from tracker.toml falls back to the
    /// reference registry.
    pub fn load_registry(&self) -> Result<PhaseRegistry> {
        if let Some(path) = self.registry_override() {
            return PhaseRegistry::load(&path).with_context(|| {
                format!("Failed to load phase registry: {}", path.display())
            });
        }
        let path = self.registry_path();
        load_registry_or_default(path.as_deref()).context("Failed to load phase registry")
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        self.toml.validate(&self.tracker_dir)
    }
}
