//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::RunStarted {
                source,
                output,
                resume,
                dry_run,
            } => {
                info!(
                    source = %source.display(),
                    output = %output.display(),
                    resume,
                    dry_run,
                    "Starting migration"
                );
            }
            ProgressEvent::StaleCheckpoint { path } => {
                warn!(
                    checkpoint = %path.display(),
                    "Found checkpoint from a previous run; pass --resume to continue it"
                );
            }
            ProgressEvent::Resumed { from } => {
                info!(stage = %from, "Resuming from checkpoint");
            }
            ProgressEvent::StageStarted { stage } => {
                info!(stage = %stage, "Starting stage");
            }
            ProgressEvent::StageSkipped { stage, reason } => {
                info!(stage = %stage, reason = %reason, "Skipping stage");
            }
            ProgressEvent::StageCompleted {
                stage,
                total,
                converted,
                skipped,
                dropped,
                duration,
            } => {
                info!(
                    stage = %stage,
                    total,
                    converted,
                    skipped,
                    dropped,
                    duration_ms = duration.as_millis() as u64,
                    "Stage complete"
                );
            }
            ProgressEvent::StageFailed { stage, error } => {
                warn!(stage = %stage, error = %error, "Stage failed");
            }
            ProgressEvent::UnitStarted {
                stage,
                unit,
                index,
                total,
            } => {
                debug!(
                    stage = %stage,
                    unit = %unit,
                    progress = format!("{}/{}", index, total),
                    "Converting unit"
                );
            }
            ProgressEvent::UnitConverted {
                stage,
                unit,
                files,
                requires_review,
            } => {
                if *requires_review {
                    info!(stage = %stage, unit = %unit, files, "Converted unit, needs review");
                } else {
                    debug!(stage = %stage, unit = %unit, files, "Converted unit");
                }
            }
            ProgressEvent::UnitSkipped { stage, unit, error } => {
                warn!(stage = %stage, unit = %unit, error = %error, "Skipping unit");
            }
            ProgressEvent::UnitDropped {
                stage,
                unit,
                reason,
            } => {
                info!(stage = %stage, unit = %unit, reason = %reason, "Dropped unit");
            }
            ProgressEvent::ProviderCall {
                stage,
                unit,
                usage,
                cost,
                truncated,
            } => {
                debug!(
                    stage = %stage,
                    unit = %unit,
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    cost_usd = cost,
                    truncated,
                    "Provider call"
                );
            }
            ProgressEvent::Blockers { keys } => {
                warn!(
                    count = keys.len(),
                    dependencies = %keys.join(", "),
                    "Unresolved high-complexity dependency replacements"
                );
            }
            ProgressEvent::DryRunComplete { .. } => {
                info!("Dry run complete, no files written");
            }
            ProgressEvent::RunCompleted {
                total_time,
                usage,
                cost,
            } => {
                info!(
                    total_time_ms = total_time.as_millis() as u64,
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    cost_usd = cost,
                    "Migration complete"
                );
            }
            ProgressEvent::RunFailed { error, resumable } => {
                if *resumable {
                    warn!(error = %error, "Migration halted; fix the cause and rerun with --resume");
                } else {
                    warn!(error = %error, "Migration failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::{Stage, TokenUsage};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_logging_all_events() {
        let handler = LoggingHandler;

        let events = vec![
            ProgressEvent::RunStarted {
                source: PathBuf::from("/src"),
                output: PathBuf::from("/out"),
                resume: true,
                dry_run: false,
            },
            ProgressEvent::StaleCheckpoint {
                path: PathBuf::from("/src/.liftbox/checkpoint.json"),
            },
            ProgressEvent::Resumed {
                from: Stage::Services,
            },
            ProgressEvent::StageStarted {
                stage: Stage::Entities,
            },
            ProgressEvent::StageSkipped {
                stage: Stage::Jobs,
                reason: "no units".to_string(),
            },
            ProgressEvent::StageCompleted {
                stage: Stage::Entities,
                total: 3,
                converted: 2,
                skipped: 1,
                dropped: 0,
                duration: Duration::from_millis(10),
            },
            ProgressEvent::StageFailed {
                stage: Stage::Services,
                error: "disk full".to_string(),
            },
            ProgressEvent::UnitStarted {
                stage: Stage::Entities,
                unit: "User".to_string(),
                index: 1,
                total: 3,
            },
            ProgressEvent::UnitConverted {
                stage: Stage::Entities,
                unit: "User".to_string(),
                files: 1,
                requires_review: true,
            },
            ProgressEvent::UnitSkipped {
                stage: Stage::Entities,
                unit: "Order".to_string(),
                error: "parse error".to_string(),
            },
            ProgressEvent::UnitDropped {
                stage: Stage::Entities,
                unit: "Dto".to_string(),
                reason: "not persisted".to_string(),
            },
            ProgressEvent::ProviderCall {
                stage: Stage::Entities,
                unit: "User".to_string(),
                usage: TokenUsage::new(10, 20),
                cost: 0.001,
                truncated: false,
            },
            ProgressEvent::Blockers {
                keys: vec!["a:b".to_string()],
            },
            ProgressEvent::DryRunComplete {
                summary: String::new(),
            },
            ProgressEvent::RunCompleted {
                total_time: Duration::from_secs(5),
                usage: TokenUsage::default(),
                cost: 0.0,
            },
            ProgressEvent::RunFailed {
                error: "Test error".to_string(),
                resumable: true,
            },
        ];

        for event in events {
            handler.on_progress(&event);
        }
    }
}
