//! Progress through the nested sub-stages of a single phase.
//!
//! The arithmetic is a plain ratio and is not range-checked. Clamping happens
//! only on the display value carried by [`SubStageProgress`].

use serde::{Deserialize, Serialize};

/// Raw sub-stage percentage: `stage / total * 100`.
///
/// An absent stage counts as 0. Out-of-range stages produce values outside
/// `[0, 100]`.
pub fn stage_percent(stage: Option<i64>, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    stage.unwrap_or(0) as f64 / f64::from(total) * 100.0
}

/// Display-ready sub-stage progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubStageProgress {
    /// Stage counter as reported, if any
    pub stage: Option<i64>,
    pub total: u32,
    /// Percentage clamped to `[0, 100]`
    pub percent: f64,
    /// Unclamped ratio
    pub raw_percent: f64,
    pub label: String,
}

impl SubStageProgress {
    pub fn new(stage: Option<i64>, total: u32) -> Self {
        let raw_percent = stage_percent(stage, total);
        let label = match stage {
            Some(stage) => format!("Stage {} of {}", stage, total),
            None => format!("Waiting for stage 1 of {}", total),
        };
        Self {
            stage,
            total,
            percent: raw_percent.clamp(0.0, 100.0),
            raw_percent,
            label,
        }
    }

    /// Whether the reported counter lies outside `1..=total`.
    pub fn is_out_of_range(&self) -> bool {
        match self.stage {
            Some(stage) => stage < 1 || stage > i64::from(self.total),
            None => false,
        }
    }
}
