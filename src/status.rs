//! Per-phase status derivation.
//!
//! Statuses are never stored. Every call recomputes them from the registry
//! and the latest token, so the result only depends on the current snapshot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::registry::PhaseRegistry;
use crate::token::{PhaseToken, TokenPosition};

/// Status of one phase, derived from the current token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// Phase has not started yet
    #[default]
    Pending,
    /// Phase is executing
    Running,
    /// Phase finished
    Completed,
    /// Phase stopped the pipeline
    Failed,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Check if the phase is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid phase status: {}", s)),
        }
    }
}

/// A phase id paired with its derived status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStatusEntry {
    pub id: String,
    pub status: PhaseStatus,
}

/// Status of the phase at `index` given where the token landed.
fn status_at(index: usize, position: TokenPosition) -> PhaseStatus {
    let (current, at_current) = match position {
        TokenPosition::Completed => return PhaseStatus::Completed,
        TokenPosition::Unrecognized | TokenPosition::Failed(None) => return PhaseStatus::Pending,
        TokenPosition::At(current) => (current, PhaseStatus::Running),
        TokenPosition::Failed(Some(current)) => (current, PhaseStatus::Failed),
    };

    match index.cmp(&current) {
        std::cmp::Ordering::Less => PhaseStatus::Completed,
        std::cmp::Ordering::Equal => at_current,
        std::cmp::Ordering::Greater => PhaseStatus::Pending,
    }
}

/// Status of a single phase, or `None` when `phase_id` is not registered.
pub fn resolve_status(
    registry: &PhaseRegistry,
    token: &PhaseToken,
    phase_id: &str,
) -> Option<PhaseStatus> {
    let index = registry.index_of(phase_id)?;
    Some(status_at(index, token.locate(registry)))
}

/// Statuses for every phase, in registry order.
///
/// All entries come from a single token position, so at most one phase is
/// `running` or `failed` and no `completed` phase follows a non-completed one.
pub fn resolve_all(registry: &PhaseRegistry, token: &PhaseToken) -> Vec<PhaseStatusEntry> {
    let position = token.locate(registry);
    registry
        .ids()
        .enumerate()
        .map(|(index, id)| PhaseStatusEntry {
            id: id.to_string(),
            status: status_at(index, position),
        })
        .collect()
}
