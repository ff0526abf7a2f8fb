//! Output formatting for multiple formats
//!
//! Every command result can be printed as JSON, YAML or human-readable text.
//!
//! # Example
//!
//! ```ignore
//! use liftbox::cli::output::{OutputFormat, OutputFormatter};
//!
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! let output = formatter.format_descriptor(&descriptor)?;
//! println!("{}", output);
//! ```

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;

use crate::checkpoint::{Checkpoint, Stage, Status};
use crate::dependencies::DependencyReport;
use crate::pipeline::MigrationSummary;
use crate::scanner::ProjectDescriptor;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Status view of a checkpoint, without the decision bodies
#[derive(Debug, Serialize)]
pub struct CheckpointStatus<'a> {
    pub stage: Stage,
    pub status: Status,
    pub next_stage: Option<Stage>,
    pub source_path: &'a std::path::Path,
    pub output_path: &'a std::path::Path,
    pub updated: String,
    pub completed_stages: Vec<Stage>,
    pub decisions: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub estimated_cost: f64,
    pub errors: &'a [String],
    pub snapshots: &'a [Stage],
}

impl<'a> CheckpointStatus<'a> {
    pub fn new(checkpoint: &'a Checkpoint, snapshots: &'a [Stage]) -> Self {
        Self {
            stage: checkpoint.stage,
            status: checkpoint.status,
            next_stage: checkpoint.next_stage(),
            source_path: &checkpoint.source_path,
            output_path: &checkpoint.output_path,
            updated: checkpoint.timestamp.to_rfc3339(),
            completed_stages: checkpoint.data.keys().copied().collect(),
            decisions: checkpoint.decisions.len(),
            input_tokens: checkpoint.usage.input_tokens,
            output_tokens: checkpoint.usage.output_tokens,
            estimated_cost: checkpoint.estimated_cost,
            errors: &checkpoint.errors,
            snapshots,
        }
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_descriptor(&self, descriptor: &ProjectDescriptor) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(descriptor, "project descriptor"),
            OutputFormat::Yaml => to_yaml(descriptor, "project descriptor"),
            OutputFormat::Human => Ok(self.format_descriptor_human(descriptor)),
        }
    }

    pub fn format_dependencies(&self, report: &DependencyReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(report, "dependency report"),
            OutputFormat::Yaml => to_yaml(report, "dependency report"),
            OutputFormat::Human => Ok(format!("Dependency Report\n{}\n\n{}", RULE, report.render())),
        }
    }

    pub fn format_summary(&self, summary: &MigrationSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(summary, "migration summary"),
            OutputFormat::Yaml => to_yaml(summary, "migration summary"),
            OutputFormat::Human => Ok(self.format_summary_human(summary)),
        }
    }

    pub fn format_checkpoint(&self, status: &CheckpointStatus<'_>) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(status, "checkpoint status"),
            OutputFormat::Yaml => to_yaml(status, "checkpoint status"),
            OutputFormat::Human => Ok(self.format_checkpoint_human(status)),
        }
    }

    // Human-readable formatting methods

    fn format_descriptor_human(&self, descriptor: &ProjectDescriptor) -> String {
        let mut output = String::new();
        output.push_str("Project Scan Result\n");
        output.push_str(RULE);
        output.push_str("\n\n");
        output.push_str(&descriptor.summary());

        let _ = writeln!(output, "\nDependencies ({}):", descriptor.dependencies.len());
        for (i, dep) in descriptor.dependencies.iter().enumerate() {
            let is_last = i + 1 == descriptor.dependencies.len();
            let connector = if is_last { "\u{2514}" } else { "\u{251C}" };
            let _ = writeln!(output, "{}\u{2500} {}", connector, dep.key());
        }
        output
    }

    fn format_summary_human(&self, summary: &MigrationSummary) -> String {
        if let Some(text) = &summary.dry_run {
            let mut output = String::from("Dry Run\n");
            output.push_str(RULE);
            output.push_str("\n\n");
            output.push_str(text);
            return output;
        }

        let mut output = String::new();
        output.push_str("\u{2713} Migration Complete\n");
        output.push_str(RULE);
        output.push_str("\n\n");

        if let Some(stage) = summary.resumed_from {
            let _ = writeln!(output, "Resumed from: {}\n", stage.name());
        }

        output.push_str("Stages:\n");
        for (i, report) in summary.stages.iter().enumerate() {
            let is_last = i + 1 == summary.stages.len();
            let connector = if is_last { "\u{2514}" } else { "\u{251C}" };
            let detail = if report.status == Status::Skipped {
                "skipped".to_string()
            } else if report.stage.category().is_some() {
                format!(
                    "{} converted, {} skipped, {} dropped of {}",
                    report.converted, report.skipped, report.dropped, report.total
                )
            } else {
                format!("{} item(s)", report.total)
            };
            let _ = writeln!(
                output,
                "{}\u{2500} {:<14} {} ({}ms)",
                connector,
                report.stage.name(),
                detail,
                report.duration_ms
            );
        }

        let _ = writeln!(
            output,
            "\nUnits: {} converted, {} skipped",
            summary.converted(),
            summary.skipped()
        );
        let _ = writeln!(
            output,
            "Tokens: {} in / {} out",
            summary.usage.input_tokens, summary.usage.output_tokens
        );
        let _ = writeln!(output, "Estimated cost: ${:.4}", summary.estimated_cost);
        let _ = writeln!(output, "\nProcessed in {}ms", summary.total_time_ms);
        output
    }

    fn format_checkpoint_human(&self, status: &CheckpointStatus<'_>) -> String {
        let mut output = String::new();
        output.push_str("Checkpoint Status\n");
        output.push_str(RULE);
        output.push_str("\n\n");

        let _ = writeln!(output, "Source:   {}", status.source_path.display());
        let _ = writeln!(output, "Output:   {}", status.output_path.display());
        let _ = writeln!(output, "Updated:  {}", status.updated);
        let _ = writeln!(
            output,
            "Stage:    {} ({})",
            status.stage.name(),
            status.status.name()
        );
        let _ = writeln!(
            output,
            "Next:     {}",
            status
                .next_stage
                .map(|s| s.name())
                .unwrap_or("(finished)")
        );

        output.push_str("\nStages:\n");
        for stage in Stage::ALL {
            let marker = if status.completed_stages.contains(stage) {
                "\u{2713}"
            } else if *stage == status.stage {
                match status.status {
                    Status::Failed => "\u{2717}",
                    Status::Skipped => "-",
                    _ => "\u{2026}",
                }
            } else {
                " "
            };
            let snapshot = if status.snapshots.contains(stage) {
                "  [snapshot]"
            } else {
                ""
            };
            let _ = writeln!(output, "  {} {}{}", marker, stage.name(), snapshot);
        }

        let _ = writeln!(
            output,
            "\nProvider calls: {} ({} in / {} out tokens, ${:.4})",
            status.decisions, status.input_tokens, status.output_tokens, status.estimated_cost
        );

        if !status.errors.is_empty() {
            output.push_str("\n\u{26A0} Errors:\n");
            for error in status.errors {
                let _ = writeln!(output, "  - {}", error);
            }
        }
        output
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string_pretty(value).with_context(|| format!("Failed to serialize {} to JSON", what))
}

fn to_yaml<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_yaml::to_string(value).with_context(|| format!("Failed to serialize {} to YAML", what))
}
