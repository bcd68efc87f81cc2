//! Terminal presentation of progress reports.
//!
//! Three output modes are supported:
//! - `full`: live `indicatif` bars, one line per phase plus the sub-stage bar
//! - `minimal`: one plain line per report
//! - `json`: one JSON object per report, for machine consumption

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use console::{StyledObject, Term, style};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::registry::PhaseRegistry;
use crate::snapshot::ProgressReport;
use crate::status::PhaseStatus;
use crate::ui::icons::{CHECK, CROSS, PENDING, PROGRESS, RUNNING, SPARKLE, STAGE};

/// Resolution of the overall bar (tenths of a percent).
const OVERALL_BAR_LEN: u64 = 1000;

/// Output mode for the tracker UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiMode {
    /// Live progress bars
    #[default]
    Full,
    /// Single-line status updates
    Minimal,
    /// JSON-formatted reports
    Json,
}

impl std::str::FromStr for UiMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "minimal" => Self::Minimal,
            _ => Self::Full,
        })
    }
}

impl UiMode {
    /// Parse UI mode from string; unknown values fall back to `Full`.
    pub fn parse(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

/// Percentage with one decimal, dropping a trailing `.0`.
pub fn format_percent(percent: f64) -> String {
    if (percent - percent.round()).abs() < 0.05 {
        format!("{:.0}%", percent)
    } else {
        format!("{:.1}%", percent)
    }
}

fn status_icon(status: PhaseStatus) -> String {
    match status {
        PhaseStatus::Completed => CHECK.to_string(),
        PhaseStatus::Failed => CROSS.to_string(),
        PhaseStatus::Running => RUNNING.to_string(),
        PhaseStatus::Pending => PENDING.to_string(),
    }
}

fn styled_status(status: PhaseStatus) -> StyledObject<&'static str> {
    let text = status.as_str();
    match status {
        PhaseStatus::Completed => style(text).green(),
        PhaseStatus::Failed => style(text).red().bold(),
        PhaseStatus::Running => style(text).cyan().bold(),
        PhaseStatus::Pending => style(text).dim(),
    }
}

/// One plain-text line describing a report.
///
/// Example: `37.5% extracting | detecting_pages=completed extracting=running ...`
pub fn format_minimal(report: &ProgressReport) -> String {
    let statuses = report
        .statuses
        .iter()
        .map(|e| format!("{}={}", e.id, e.status))
        .collect::<Vec<_>>()
        .join(" ");

    let mut line = format!(
        "{} {} | {}",
        format_percent(report.overall_percent),
        report.current_phase,
        statuses
    );
    if let Some(sub_stage) = &report.sub_stage {
        line.push_str(&format!(
            " | {} ({})",
            sub_stage.label,
            format_percent(sub_stage.percent)
        ));
    }
    line
}

/// Multi-line summary: overall percentage, then one line per phase.
///
/// The sub-stage line is printed beneath the running sub-staged phase.
pub fn format_summary(registry: &PhaseRegistry, report: &ProgressReport) -> Vec<String> {
    let width = registry
        .phases()
        .iter()
        .map(|p| p.label.chars().count())
        .max()
        .unwrap_or(0);

    let mut lines = vec![format!(
        "{}Overall: {}",
        PROGRESS,
        style(format_percent(report.overall_percent)).cyan().bold()
    )];

    for (phase, entry) in registry.phases().iter().zip(&report.statuses) {
        lines.push(format!(
            "  {}{:<width$}  {}",
            status_icon(entry.status),
            phase.label,
            styled_status(entry.status),
            width = width
        ));
        if entry.status == PhaseStatus::Running
            && let Some(sub_stage) = &report.sub_stage
        {
            lines.push(format!(
                "      {}{} ({})",
                STAGE,
                sub_stage.label,
                style(format_percent(sub_stage.percent)).cyan()
            ));
        }
    }

    lines
}

#[derive(Serialize)]
struct JsonReport<'a> {
    at: DateTime<Utc>,
    #[serde(flatten)]
    report: &'a ProgressReport,
}

/// One JSON object for a report, stamped with the render time.
pub fn format_json(report: &ProgressReport) -> Result<String> {
    serde_json::to_string(&JsonReport {
        at: Utc::now(),
        report,
    })
    .context("Failed to serialize progress report")
}

/// Renders a stream of reports for one registry.
///
/// Bars are only drawn in `full` mode; the other modes write lines to stdout.
/// Every report is rendered on its own, nothing is carried between reports.
pub struct TrackerUI {
    mode: UiMode,
    registry: Arc<PhaseRegistry>,
    multi: MultiProgress,
    overall_bar: ProgressBar,
    phase_bars: Vec<ProgressBar>,
    sub_stage_bar: ProgressBar,
    stage_style: ProgressStyle,
    idle_style: ProgressStyle,
    term: Term,
}

impl TrackerUI {
    /// Create the UI. In `full` mode this adds one bar per registered phase.
    pub fn new(registry: Arc<PhaseRegistry>, mode: UiMode) -> Result<Self> {
        let multi = MultiProgress::new();

        let overall_style =
            ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {msg}")
                .context("Invalid overall bar template")?
                .progress_chars("█▓▒░");
        let line_style = ProgressStyle::with_template("  {prefix:.bold} {msg}")
            .context("Invalid phase line template")?;
        let stage_style =
            ProgressStyle::with_template("    {prefix:.dim} [{bar:30.green/white}] {pos}/{len} {msg}")
                .context("Invalid sub-stage bar template")?
                .progress_chars("█▓░");
        let idle_style = ProgressStyle::with_template("    {prefix:.dim} {msg}")
            .context("Invalid sub-stage idle template")?;

        let mut overall_bar = ProgressBar::hidden();
        let mut phase_bars = Vec::new();
        let mut sub_stage_bar = ProgressBar::hidden();

        if mode == UiMode::Full {
            overall_bar = multi.add(ProgressBar::new(OVERALL_BAR_LEN));
            overall_bar.set_style(overall_style);
            overall_bar.set_prefix("Overall");
            overall_bar.set_message("waiting for first snapshot");

            for phase in registry.phases() {
                let bar = multi.add(ProgressBar::new(1));
                bar.set_style(line_style.clone());
                bar.set_prefix(format!("{:<10}", phase.display_short_label()));
                bar.set_message(format!("{}{}", PENDING, styled_status(PhaseStatus::Pending)));
                phase_bars.push(bar);
            }

            if let Some((_, phase)) = registry.sub_staged_phase() {
                sub_stage_bar = multi.add(ProgressBar::new(u64::from(
                    phase.sub_stages.unwrap_or_default(),
                )));
                sub_stage_bar.set_style(idle_style.clone());
                sub_stage_bar.set_prefix("Stages");
                sub_stage_bar.set_message("-");
            }
        }

        Ok(Self {
            mode,
            registry,
            multi,
            overall_bar,
            phase_bars,
            sub_stage_bar,
            stage_style,
            idle_style,
            term: Term::stdout(),
        })
    }

    pub fn mode(&self) -> UiMode {
        self.mode
    }

    /// Render one report.
    pub fn handle_report(&self, report: &ProgressReport) -> Result<()> {
        match self.mode {
            UiMode::Json => {
                let line = format_json(report)?;
                writeln!(&self.term, "{}", line).context("Failed to write report")?;
            }
            UiMode::Minimal => {
                writeln!(&self.term, "{}", format_minimal(report))
                    .context("Failed to write report")?;
            }
            UiMode::Full => self.update_bars(report),
        }
        Ok(())
    }

    fn update_bars(&self, report: &ProgressReport) {
        self.overall_bar
            .set_position((report.overall_percent * 10.0).round() as u64);
        self.overall_bar
            .set_message(format_percent(report.overall_percent));

        for (bar, entry) in self.phase_bars.iter().zip(&report.statuses) {
            bar.set_message(format!(
                "{}{}",
                status_icon(entry.status),
                styled_status(entry.status)
            ));
        }

        match &report.sub_stage {
            Some(sub_stage) => {
                self.sub_stage_bar.set_style(self.stage_style.clone());
                let position = sub_stage
                    .stage
                    .unwrap_or(0)
                    .clamp(0, i64::from(sub_stage.total));
                self.sub_stage_bar.set_length(u64::from(sub_stage.total));
                self.sub_stage_bar.set_position(position as u64);
                self.sub_stage_bar
                    .set_message(format_percent(sub_stage.percent));
            }
            None => {
                self.sub_stage_bar.set_style(self.idle_style.clone());
                self.sub_stage_bar.set_message("-");
            }
        }
    }

    /// Stop all bars. In `full` mode the last report is printed as a summary.
    pub fn finish(&self, last: Option<&ProgressReport>) -> Result<()> {
        if self.mode != UiMode::Full {
            return Ok(());
        }

        self.overall_bar.finish_and_clear();
        for bar in &self.phase_bars {
            bar.finish_and_clear();
        }
        self.sub_stage_bar.finish_and_clear();
        self.multi.clear().ok();

        if let Some(report) = last {
            print_summary(&self.term, &self.registry, report)?;
        }
        Ok(())
    }
}

/// Write a full summary of one report, followed by a banner for terminal states.
pub fn print_summary(term: &Term, registry: &PhaseRegistry, report: &ProgressReport) -> Result<()> {
    for line in format_summary(registry, report) {
        term.write_line(&line).context("Failed to write summary")?;
    }
    if report.current_phase == crate::token::COMPLETED {
        term.write_line(&format!("{}Pipeline {}", SPARKLE, style("complete").green().bold()))
            .context("Failed to write summary")?;
    } else if report.current_phase == crate::token::FAILED {
        term.write_line(&format!("{}Pipeline {}", CROSS, style("failed").red().bold()))
            .context("Failed to write summary")?;
    }
    Ok(())
}

/// Render a single report in the given mode without live bars.
pub fn print_report(registry: &PhaseRegistry, report: &ProgressReport, mode: UiMode) -> Result<()> {
    let term = Term::stdout();
    match mode {
        UiMode::Json => {
            let line = format_json(report)?;
            term.write_line(&line).context("Failed to write report")?;
        }
        UiMode::Minimal => {
            term.write_line(&format_minimal(report))
                .context("Failed to write report")?;
        }
        UiMode::Full => print_summary(&term, registry, report)?,
    }
    Ok(())
}
