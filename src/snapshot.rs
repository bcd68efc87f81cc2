//! Snapshot evaluation.
//!
//! A [`Snapshot`] is the latest state reported by the external pipeline. The
//! [`Tracker`] turns it into a [`ProgressReport`] for the presentation layer.
//! Nothing carries over between snapshots: duplicates and out-of-order
//! snapshots only cause redundant recomputation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::SnapshotError;
use crate::progress::{FailedProgress, overall_percent_with};
use crate::registry::PhaseRegistry;
use crate::status::{PhaseStatusEntry, resolve_all};
use crate::substage::SubStageProgress;
use crate::token::{PhaseToken, TokenPosition};

/// Fractional progress within the running phase.
///
/// `phase` is informational only; the fraction always applies to the
/// snapshot's `current_phase`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseProgress {
    #[serde(default)]
    pub phase: String,
    pub progress: f64,
}

/// Point-in-time pipeline state as supplied by the producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// A phase id, `completed`, `failed`, or anything else
    pub current_phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_progress: Option<PhaseProgress>,
    /// Counter for the sub-staged phase, expected in `1..=total`.
    /// Whole-number floats such as `6.0` are accepted.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_stage"
    )]
    pub interpretation_stage: Option<i64>,
    /// Phase that was running when `current_phase` became `failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_phase: Option<String>,
}

fn deserialize_stage<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(stage) = number.as_i64() {
        return Ok(Some(stage));
    }
    match number.as_f64() {
        Some(stage) if stage.fract() == 0.0 && stage.abs() < i64::MAX as f64 => {
            Ok(Some(stage as i64))
        }
        _ => Err(serde::de::Error::custom(format!(
            "interpretationStage must be a whole number, got {}",
            number
        ))),
    }
}

impl Snapshot {
    pub fn new(current_phase: impl Into<String>) -> Self {
        Self {
            current_phase: current_phase.into(),
            phase_progress: None,
            interpretation_stage: None,
            failed_phase: None,
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.phase_progress = Some(PhaseProgress {
            phase: self.current_phase.clone(),
            progress,
        });
        self
    }

    pub fn with_stage(mut self, stage: i64) -> Self {
        self.interpretation_stage = Some(stage);
        self
    }

    pub fn with_failed_phase(mut self, phase: impl Into<String>) -> Self {
        self.failed_phase = Some(phase.into());
        self
    }

    /// The current-phase token, with the failing phase attached when known.
    pub fn token(&self) -> PhaseToken {
        PhaseToken::parse(&self.current_phase).with_failed_phase(self.failed_phase.clone())
    }

    /// Parse one JSON-lines record. `line` is 1-based and only used for errors.
    pub fn parse_line(raw: &str, line: usize) -> Result<Self, SnapshotError> {
        serde_json::from_str(raw).map_err(|source| SnapshotError::Malformed { line, source })
    }
}

/// Everything the presentation layer needs for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub current_phase: String,
    /// Per-phase statuses in registry order
    pub statuses: Vec<PhaseStatusEntry>,
    /// Overall completion in `[0, 100]`
    pub overall_percent: f64,
    /// Present only while the sub-staged phase is running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<SubStageProgress>,
}

impl ProgressReport {
    /// Whether the pipeline reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.current_phase == crate::token::COMPLETED || self.current_phase == crate::token::FAILED
    }
}

/// Evaluates snapshots against a fixed registry.
#[derive(Debug, Clone)]
pub struct Tracker {
    registry: Arc<PhaseRegistry>,
    failed_progress: FailedProgress,
}

impl Tracker {
    pub fn new(registry: Arc<PhaseRegistry>) -> Self {
        Self {
            registry,
            failed_progress: FailedProgress::default(),
        }
    }

    pub fn with_failed_progress(mut self, failed_progress: FailedProgress) -> Self {
        self.failed_progress = failed_progress;
        self
    }

    pub fn registry(&self) -> &PhaseRegistry {
        &self.registry
    }

    /// Derive statuses, overall percentage, and sub-stage progress.
    pub fn evaluate(&self, snapshot: &Snapshot) -> ProgressReport {
        let registry = self.registry.as_ref();
        let token = snapshot.token();
        let position = token.locate(registry);

        match position {
            TokenPosition::Unrecognized => {
                debug!(token = %token, "unrecognized current phase; reporting all phases pending");
            }
            TokenPosition::Failed(None) => {
                warn!(
                    failed_phase = snapshot.failed_phase.as_deref().unwrap_or("<none>"),
                    "pipeline failed but the failing phase is unknown; no phase is marked failed"
                );
            }
            _ => {}
        }

        let fraction = snapshot.phase_progress.as_ref().map(|p| p.progress);
        let overall_percent = overall_percent_with(registry, &token, fraction, self.failed_progress);

        let sub_stage = match (registry.sub_staged_phase(), position) {
            (Some((owner, phase)), TokenPosition::At(current)) if owner == current => {
                let total = phase.sub_stages.unwrap_or_default();
                let progress = SubStageProgress::new(snapshot.interpretation_stage, total);
                if progress.is_out_of_range() {
                    debug!(
                        stage = snapshot.interpretation_stage,
                        total, "sub-stage counter out of range; clamping for display"
                    );
                }
                Some(progress)
            }
            _ => None,
        };

        ProgressReport {
            current_phase: snapshot.current_phase.clone(),
            statuses: resolve_all(registry, &token),
            overall_percent,
            sub_stage,
        }
    }
}

/// Evaluate a snapshot with the default failure policy.
pub fn evaluate(registry: &PhaseRegistry, snapshot: &Snapshot) -> ProgressReport {
    Tracker::new(Arc::new(registry.clone())).evaluate(snapshot)
}
