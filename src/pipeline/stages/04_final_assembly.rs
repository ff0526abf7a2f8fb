use super::MigrationStage;
use crate::checkpoint::{Checkpoint, Stage, StageOutput};
use crate::pipeline::context::MigrationContext;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use tracing::info;

pub const REPORT_FILE: &str = "MIGRATION_REPORT.md";
pub const MANIFEST_FILE: &str = "migration-manifest.json";

/// Machine-readable list of everything the run generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationManifest {
    pub project: String,
    pub target_module: String,
    pub target_language: String,
    pub generated_at: DateTime<Utc>,
    pub files: BTreeMap<Stage, Vec<String>>,
    pub review_required: Vec<String>,
}

/// Writes the migration report and manifest into the output root.
///
/// Works from the checkpoint's stage outputs, so units converted before a
/// resume are included.
pub struct FinalAssemblyStage;

#[async_trait]
impl MigrationStage for FinalAssemblyStage {
    fn stage(&self) -> Stage {
        Stage::FinalAssembly
    }

    async fn execute(&self, context: &mut MigrationContext<'_>) -> Result<StageOutput> {
        let checkpoint = context
            .store
            .checkpoint()
            .ok_or_else(|| anyhow!("Final assembly requires an active checkpoint"))?;
        let descriptor = context.descriptor()?;
        let root = context.layout.root();

        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create output directory {}", root.display()))?;

        let manifest = build_manifest(context, checkpoint, &descriptor.name);
        let manifest_json =
            serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
        let manifest_path = root.join(MANIFEST_FILE);
        fs::write(&manifest_path, manifest_json + "\n")
            .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

        let report = render_report(context, checkpoint, &manifest)?;
        let report_path = root.join(REPORT_FILE);
        fs::write(&report_path, report)
            .with_context(|| format!("Failed to write {}", report_path.display()))?;

        info!(
            report = %report_path.display(),
            manifest = %manifest_path.display(),
            "Migration report written"
        );

        Ok(StageOutput::Assembly {
            files: vec![REPORT_FILE.to_string(), MANIFEST_FILE.to_string()],
        })
    }
}

fn build_manifest(
    context: &MigrationContext<'_>,
    checkpoint: &Checkpoint,
    project: &str,
) -> MigrationManifest {
    let mut files = BTreeMap::new();
    let mut review_required = Vec::new();
    for (stage, output) in &checkpoint.data {
        if let StageOutput::Conversion {
            files: stage_files,
            review_required: review,
            ..
        } = output
        {
            files.insert(*stage, stage_files.clone());
            review_required.extend(review.iter().cloned());
        }
    }

    MigrationManifest {
        project: project.to_string(),
        target_module: context.config.target_module.clone(),
        target_language: context.config.target_language.clone(),
        generated_at: Utc::now(),
        files,
        review_required,
    }
}

fn render_report(
    context: &MigrationContext<'_>,
    checkpoint: &Checkpoint,
    manifest: &MigrationManifest,
) -> Result<String> {
    let descriptor = context.descriptor()?;
    let mut out = String::new();

    writeln!(out, "# Migration report: {}\n", descriptor.name)?;
    writeln!(out, "- Source: `{}`", checkpoint.source_path.display())?;
    writeln!(
        out,
        "- Target: {} module `{}`",
        manifest.target_language, manifest.target_module
    )?;
    if let Some(framework) = &descriptor.framework {
        writeln!(
            out,
            "- Framework: {} {}",
            framework.name,
            framework.version.as_deref().unwrap_or("")
        )?;
    }
    writeln!(out, "- Generated: {}\n", manifest.generated_at.to_rfc3339())?;

    writeln!(out, "## Stages\n")?;
    writeln!(out, "| Stage | Total | Converted | Skipped | Dropped |")?;
    writeln!(out, "|---|---|---|---|---|")?;
    for stage in Stage::ALL.iter().filter(|s| s.category().is_some()) {
        match checkpoint.data.get(stage) {
            Some(StageOutput::Conversion {
                total,
                converted,
                skipped,
                dropped,
                ..
            }) => writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                stage.name(),
                total,
                converted,
                skipped,
                dropped
            )?,
            _ => writeln!(out, "| {} | - | - | - | - |", stage.name())?,
        }
    }
    out.push('\n');

    if !manifest.review_required.is_empty() {
        writeln!(out, "## Requires review\n")?;
        for item in &manifest.review_required {
            writeln!(out, "- {}", item)?;
        }
        out.push('\n');
    }

    if !descriptor.ambiguous_units.is_empty() {
        writeln!(out, "## Ambiguous units\n")?;
        for unit in &descriptor.ambiguous_units {
            let others: Vec<_> = unit.also_matched.iter().map(|c| c.name()).collect();
            writeln!(
                out,
                "- {} converted as {} (also matched {})",
                unit.name,
                unit.chosen.name(),
                others.join(", ")
            )?;
        }
        out.push('\n');
    }

    if let Some(report) = &context.dependency_report {
        writeln!(out, "## Dependencies\n")?;
        out.push_str(&report.render());
        out.push('\n');
    }

    writeln!(out, "## Provider usage\n")?;
    writeln!(out, "- Calls: {}", checkpoint.decisions.len())?;
    writeln!(out, "- Input tokens: {}", checkpoint.usage.input_tokens)?;
    writeln!(out, "- Output tokens: {}", checkpoint.usage.output_tokens)?;
    writeln!(out, "- Estimated cost: ${:.4}", checkpoint.estimated_cost)?;

    Ok(out)
}
