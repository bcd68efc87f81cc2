//! Overall completion percentage across all phases.
//!
//! Each phase owns an equal `100 / N` slice of the bar. The running phase
//! contributes its completed predecessors plus its own intra-phase fraction.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::registry::PhaseRegistry;
use crate::token::{PhaseToken, TokenPosition};

/// How a `failed` token is reflected in the overall percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailedProgress {
    /// A failed job reports 0%
    #[default]
    Reset,
    /// A failed job reports the share of phases that finished before the failure
    Hold,
}

impl std::fmt::Display for FailedProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailedProgress::Reset => write!(f, "reset"),
            FailedProgress::Hold => write!(f, "hold"),
        }
    }
}

impl std::str::FromStr for FailedProgress {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reset" => Ok(FailedProgress::Reset),
            "hold" => Ok(FailedProgress::Hold),
            _ => anyhow::bail!(
                "Invalid failed_progress '{}'. Valid values: reset, hold",
                s
            ),
        }
    }
}

/// Overall completion in `[0, 100]` using the default `reset` policy for failures.
///
/// `fraction` is the running phase's own progress. It is used as supplied;
/// only the final result is clamped.
pub fn overall_percent(registry: &PhaseRegistry, token: &PhaseToken, fraction: Option<f64>) -> f64 {
    overall_percent_with(registry, token, fraction, FailedProgress::Reset)
}

/// Overall completion in `[0, 100]` with an explicit failure policy.
pub fn overall_percent_with(
    registry: &PhaseRegistry,
    token: &PhaseToken,
    fraction: Option<f64>,
    on_failed: FailedProgress,
) -> f64 {
    let total = registry.len() as f64;
    let slice = 100.0 / total;

    let percent = match token.locate(registry) {
        TokenPosition::Completed => return 100.0,
        TokenPosition::At(index) => {
            // NaN would otherwise survive min() as 100.
            let fraction = fraction.filter(|f| f.is_finite()).unwrap_or(0.0);
            index as f64 * slice + fraction * slice
        }
        TokenPosition::Failed(Some(index)) if on_failed == FailedProgress::Hold => {
            index as f64 * slice
        }
        TokenPosition::Failed(_) | TokenPosition::Unrecognized => 0.0,
    };

    let clamped = percent.clamp(0.0, 100.0);
    trace!(%token, raw = percent, clamped, "computed overall progress");
    clamped
}
