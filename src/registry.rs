//! Phase registry for the tracker.
//!
//! This module provides:
//! - `PhaseDescriptor` describing a single pipeline phase
//! - `PhaseRegistry`, the validated, ordered catalogue of phases
//! - `RegistryFile`, the on-disk `registry.json` format
//! - The built-in reference registry used when no file is configured

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::RegistryError;
use crate::token::{COMPLETED, FAILED};

/// Number of nested sub-stages owned by the reference `interpreting` phase.
pub const INTERPRETATION_STAGES: u32 = 12;

/// Describes a single pipeline phase.
///
/// The order of a phase is implicit: it is the descriptor's position in the
/// registry that owns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseDescriptor {
    /// Stable identifier (e.g. "extracting"), unique within a registry
    pub id: String,
    /// Human-readable name of the phase
    pub label: String,
    /// Compact name for narrow displays
    #[serde(default)]
    pub short_label: String,
    /// What the phase does (display only)
    #[serde(default)]
    pub description: String,
    /// Number of nested sub-stages this phase reports while running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_stages: Option<u32>,
}

impl PhaseDescriptor {
    /// Create a new descriptor without sub-stages.
    pub fn new(id: &str, label: &str, short_label: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            short_label: short_label.to_string(),
            description: description.to_string(),
            sub_stages: None,
        }
    }

    /// Attach a fixed number of nested sub-stages to this phase.
    pub fn with_sub_stages(mut self, total: u32) -> Self {
        self.sub_stages = Some(total);
        self
    }

    /// Short label, falling back to the full label when none was given.
    pub fn display_short_label(&self) -> &str {
        if self.short_label.is_empty() {
            &self.label
        } else {
            &self.short_label
        }
    }
}

/// Immutable, ordered catalogue of the pipeline's phases.
///
/// Built once at startup and shared read-only afterwards. Construction
/// enforces the invariants: non-empty, unique ids, no id colliding with a
/// terminal sentinel, and at most one phase owning sub-stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseRegistry {
    phases: Vec<PhaseDescriptor>,
}

impl PhaseRegistry {
    /// Build a registry from an ordered list of descriptors.
    pub fn new(phases: Vec<PhaseDescriptor>) -> Result<Self, RegistryError> {
        if phases.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        let mut sub_staged: Option<&str> = None;
        for (position, phase) in phases.iter().enumerate() {
            if phase.id.trim().is_empty() {
                return Err(RegistryError::BlankId { position });
            }
            if phase.id == COMPLETED || phase.id == FAILED {
                return Err(RegistryError::ReservedId {
                    id: phase.id.clone(),
                });
            }
            if !seen.insert(phase.id.as_str()) {
                return Err(RegistryError::DuplicateId {
                    id: phase.id.clone(),
                });
            }
            match phase.sub_stages {
                Some(0) => {
                    return Err(RegistryError::ZeroSubStages {
                        id: phase.id.clone(),
                    });
                }
                Some(_) => {
                    if let Some(first) = sub_staged {
                        return Err(RegistryError::MultipleSubStaged {
                            first: first.to_string(),
                            second: phase.id.clone(),
                        });
                    }
                    sub_staged = Some(phase.id.as_str());
                }
                None => {}
            }
        }

        Ok(Self { phases })
    }

    /// The reference extraction pipeline:
    /// `detecting_pages`, `extracting`, `analyzing_merges`, `interpreting`.
    pub fn reference() -> Self {
        Self {
            phases: vec![
                PhaseDescriptor::new(
                    "detecting_pages",
                    "Detecting pages",
                    "Pages",
                    "Locate the pages that contain tables",
                ),
                PhaseDescriptor::new(
                    "extracting",
                    "Extracting tables",
                    "Extract",
                    "Pull raw table content out of each detected page",
                ),
                PhaseDescriptor::new(
                    "analyzing_merges",
                    "Analyzing merges",
                    "Merges",
                    "Find tables that continue across page breaks",
                ),
                PhaseDescriptor::new(
                    "interpreting",
                    "Interpreting",
                    "Interpret",
                    "Interpret extracted tables into structured data",
                )
                .with_sub_stages(INTERPRETATION_STAGES),
            ],
        }
    }

    /// Load and validate a registry from a `registry.json` file.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let file = RegistryFile::load(path)?;
        let registry = Self::new(file.phases)?;
        debug!(path = %path.display(), phases = registry.len(), "loaded phase registry");
        Ok(registry)
    }

    /// All phases in execution order.
    pub fn phases(&self) -> &[PhaseDescriptor] {
        &self.phases
    }

    /// Number of phases (always at least one).
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Always `false`; a registry cannot be built empty.
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Phase ids in execution order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.phases.iter().map(|p| p.id.as_str())
    }

    /// Position of a phase id, or `None` when the id is not registered.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.id == id)
    }

    /// Descriptor for a phase id.
    pub fn get(&self, id: &str) -> Option<&PhaseDescriptor> {
        self.phases.iter().find(|p| p.id == id)
    }

    /// The single phase that owns nested sub-stages, with its position.
    pub fn sub_staged_phase(&self) -> Option<(usize, &PhaseDescriptor)> {
        self.phases
            .iter()
            .enumerate()
            .find(|(_, p)| p.sub_stages.is_some())
    }

    /// Convert back into the on-disk representation.
    pub fn to_file(&self) -> RegistryFile {
        RegistryFile {
            phases: self.phases.clone(),
        }
    }
}

/// The `registry.json` file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryFile {
    pub phases: Vec<PhaseDescriptor>,
}

impl RegistryFile {
    /// Read a registry file without validating it.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| RegistryError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;

        serde_json::from_str(&content).map_err(|source| RegistryError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the registry as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize registry to JSON")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write registry file: {}", path.display()))?;

        Ok(())
    }
}

/// Load the registry from `path` when it exists, otherwise use the reference registry.
pub fn load_registry_or_default(path: Option<&Path>) -> Result<PhaseRegistry, RegistryError> {
    match path {
        Some(path) if path.exists() => PhaseRegistry::load(path),
        Some(path) => {
            debug!(path = %path.display(), "registry file not found, using reference registry");
            Ok(PhaseRegistry::reference())
        }
        None => Ok(PhaseRegistry::reference()),
    }
}
