//! Report generation
//!
//! Generates TXT and JSON reports from a scenario run.

use crate::config::OutputFormat;
use crate::runner::{RunOutcome, Scenario, StepOutcome};
use crate::state::{Reading, Tally};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub scenario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub generated_at: String,
    pub library_version: &'static str,
    pub steps: Vec<StepEntry>,
    pub tallies: Vec<TallyEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepEntry {
    pub index: usize,
    pub action: String,
    pub registered: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchEntry {
    pub reading: Reading,
    pub invoked: usize,
    pub skipped: usize,
    pub invocations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TallyEntry {
    #[serde(flatten)]
    pub tally: Tally,
    pub mean: Option<f64>,
}

impl Report {
    /// Build a report; without `show_registry` only trigger steps are kept
    pub fn new(scenario: &Scenario, outcome: RunOutcome, show_registry: bool) -> Self {
        let steps = outcome
            .steps
            .into_iter()
            .filter(|step| show_registry || step.trigger.is_some())
            .map(StepEntry::from)
            .collect();

        let tallies = outcome
            .tallies
            .into_iter()
            .map(|tally| TallyEntry {
                mean: tally.mean(),
                tally,
            })
            .collect();

        Self {
            scenario: scenario.name.clone(),
            description: scenario.description.clone(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            library_version: event_channel::VERSION,
            steps,
            tallies,
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Txt => Ok(self.render_txt()),
            OutputFormat::Json => {
                serde_json::to_string_pretty(self).context("Failed to serialize report")
            }
        }
    }

    fn render_txt(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);

        // Writing into a String cannot fail
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "  Scenario: {}", self.scenario);
        if let Some(description) = &self.description {
            let _ = writeln!(out, "  {}", description);
        }
        let _ = writeln!(out, "  Generated: {}", self.generated_at);
        let _ = writeln!(out, "{}", rule);

        let _ = writeln!(out, "\nSteps");
        let _ = writeln!(out, "{}", "-".repeat(60));
        if self.steps.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for step in &self.steps {
            let _ = writeln!(
                out,
                "  #{:<4} {:<36} listeners: {}",
                step.index, step.action, step.registered
            );
            if let Some(dispatch) = &step.dispatch {
                let _ = writeln!(
                    out,
                    "        {} invoked, {} skipped",
                    dispatch.invoked, dispatch.skipped
                );
                for (order, call) in dispatch.invocations.iter().enumerate() {
                    let _ = writeln!(out, "        {}. {}", order + 1, call);
                }
            }
        }

        let _ = writeln!(out, "\nTallies");
        let _ = writeln!(out, "{}", "-".repeat(60));
        if self.tallies.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        let _ = writeln!(
            out,
            "  {:<12} {:>6} {:>10} {:>8} {:>8} {:>10} {:>6}",
            "owner", "count", "total", "min", "max", "mean", "bumps"
        );
        for entry in &self.tallies {
            let tally = &entry.tally;
            let _ = writeln!(
                out,
                "  {:<12} {:>6} {:>10} {:>8} {:>8} {:>10} {:>6}",
                tally.name,
                tally.count,
                tally.total,
                optional(tally.min),
                optional(tally.max),
                entry
                    .mean
                    .map(|mean| format!("{:.2}", mean))
                    .unwrap_or_else(|| "-".to_string()),
                tally.bumps
            );
        }

        out
    }
}

impl From<StepOutcome> for StepEntry {
    fn from(step: StepOutcome) -> Self {
        Self {
            index: step.index,
            action: step.summary,
            registered: step.registered,
            dispatch: step.trigger.map(|trigger| DispatchEntry {
                reading: trigger.reading,
                invoked: trigger.invoked,
                skipped: trigger.skipped,
                invocations: trigger.invocations.iter().map(ToString::to_string).collect(),
            }),
        }
    }
}

fn optional(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
