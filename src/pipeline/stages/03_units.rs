use super::MigrationStage;
use crate::checkpoint::{AIDecision, Stage, StageOutput};
use crate::convert::{
    convert_unit, converter_for, Conversion, ConvertError, ConvertedUnit, Converter,
};
use crate::pipeline::context::MigrationContext;
use crate::progress::ProgressEvent;
use crate::convert::snake_case;
use crate::scanner::{SourceUnit, UnitCategory};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Converts every unit of one category, one at a time.
///
/// A failing unit is logged and skipped. Only a failure to prepare the
/// target directory fails the stage.
pub struct UnitStage {
    category: UnitCategory,
}

#[derive(Debug, Default)]
struct Tally {
    converted: usize,
    skipped: usize,
    dropped: usize,
    files: Vec<String>,
    review_required: Vec<String>,
    /// Paths written by earlier units of this stage
    written: HashSet<PathBuf>,
}

impl UnitStage {
    pub fn new(category: UnitCategory) -> Self {
        Self { category }
    }

    pub fn category(&self) -> UnitCategory {
        self.category
    }
}

#[async_trait]
impl MigrationStage for UnitStage {
    fn stage(&self) -> Stage {
        Stage::for_category(self.category)
    }

    async fn execute(&self, context: &mut MigrationContext<'_>) -> Result<StageOutput> {
        let stage = self.stage();
        let units = context.descriptor()?.units(self.category).to_vec();
        let conversion_context = context.conversion_context()?;
        let converter = converter_for(self.category);
        let client = Arc::clone(&context.client);

        let dir = context.layout.ensure_skeleton(self.category).with_context(|| {
            format!(
                "Failed to create target directory {}",
                context.layout.category_dir(self.category).display()
            )
        })?;

        let total = units.len();
        let mut tally = Tally::default();

        for (index, unit) in units.iter().enumerate() {
            if context.cancel.is_cancelled() {
                warn!(stage = %stage, remaining = total - index, "Cancelled, leaving remaining units");
                break;
            }

            context.emit(ProgressEvent::UnitStarted {
                stage,
                unit: unit.name.clone(),
                index,
                total,
            });

            let attempt = convert_unit(
                client.as_ref(),
                converter.as_ref(),
                unit,
                &conversion_context,
                context.config.budget,
                &context.cancel,
            )
            .await;

            for call in &attempt.calls {
                let cost = context.config.pricing.cost(call.usage);
                let decision = AIDecision::new(
                    stage,
                    unit.relative_path.clone(),
                    converter.action(),
                    call.usage,
                )
                .with_digest(unit.digest())
                .with_prompt(&call.prompt)
                .with_response(&call.response);

                context.store.add_decision(decision)?;
                context.store.update_cost(cost)?;
                context.emit(ProgressEvent::ProviderCall {
                    stage,
                    unit: unit.name.clone(),
                    usage: call.usage,
                    cost,
                    truncated: call.truncated,
                });
            }

            let outcome = match attempt.outcome {
                Ok(Conversion::Converted(converted)) => {
                    write_unit(context, &dir, unit, &converted, &mut tally.written)
                        .map(|files| (converted, files))
                }
                Ok(Conversion::Dropped { reason }) => {
                    debug!(unit = %unit.name, reason = %reason, "Unit dropped");
                    tally.dropped += 1;
                    context.emit(ProgressEvent::UnitDropped {
                        stage,
                        unit: unit.name.clone(),
                        reason,
                    });
                    continue;
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok((converted, files)) => {
                    tally.converted += 1;
                    if converted.requires_review {
                        tally.review_required.push(review_line(unit, &converted));
                    }
                    context.emit(ProgressEvent::UnitConverted {
                        stage,
                        unit: unit.name.clone(),
                        files: files.len(),
                        requires_review: converted.requires_review,
                    });
                    tally.files.extend(files);
                }
                Err(e) => {
                    warn!(stage = %stage, unit = %unit.name, error = %e, "Skipping unit");
                    tally.skipped += 1;
                    context.emit(ProgressEvent::UnitSkipped {
                        stage,
                        unit: unit.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            stage = %stage,
            total,
            converted = tally.converted,
            skipped = tally.skipped,
            dropped = tally.dropped,
            "Stage units processed"
        );

        Ok(StageOutput::Conversion {
            total,
            converted: tally.converted,
            skipped: tally.skipped,
            dropped: tally.dropped,
            files: tally.files,
            review_required: tally.review_required,
        })
    }
}

/// Writes the unit's files and returns their display paths.
///
/// Files left by an earlier run are overwritten. A name already used by
/// another unit of this stage gets the last package segment as a prefix
/// (`billing.Order` -> `billing_order`); if that is taken too the unit fails.
fn write_unit(
    context: &MigrationContext<'_>,
    dir: &Path,
    unit: &SourceUnit,
    converted: &ConvertedUnit,
    written: &mut HashSet<PathBuf>,
) -> Result<Vec<String>, ConvertError> {
    let extension = &context.config.file_extension;
    let paths_for = |prefix: &str| -> Vec<PathBuf> {
        converted
            .files
            .iter()
            .map(|file| dir.join(format!("{}{}.{}", prefix, file.stem, extension)))
            .collect()
    };

    let mut paths = paths_for("");
    if paths.iter().any(|p| written.contains(p)) {
        let segment = unit
            .package
            .rsplit('.')
            .next()
            .map(snake_case)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| snake_case(&unit.name));
        paths = paths_for(&format!("{}_", segment));
        if let Some(taken) = paths.iter().find(|p| written.contains(*p)) {
            return Err(ConvertError::Conflict {
                path: taken.clone(),
            });
        }
        debug!(unit = %unit.name, prefix = %segment, "Output name taken, using package prefix");
    }

    let mut display = Vec::with_capacity(paths.len());
    for (file, path) in converted.files.iter().zip(paths) {
        fs::write(&path, &file.content).map_err(|source| ConvertError::Io {
            path: path.clone(),
            source,
        })?;
        display.push(context.layout.display_path(&path));
        written.insert(path);
    }
    Ok(display)
}

fn review_line(unit: &SourceUnit, converted: &ConvertedUnit) -> String {
    if converted.review_reason.trim().is_empty() {
        unit.relative_path.clone()
    } else {
        format!("{}: {}", unit.relative_path, converted.review_reason.trim())
    }
}
