//! Stage orchestrator
//!
//! Drives the fixed stage sequence against one checkpoint store:
//!
//! 1. Resume loads the checkpoint (a missing one is an error); a fresh run
//!    only warns about a stale checkpoint and replaces it.
//! 2. Discovery and dependency analysis always run, in memory. They are
//!    recorded in the checkpoint only when they are at or past the resume
//!    point, and never on a dry run.
//! 3. A dry run stops here with a human-readable summary.
//! 4. Unit stages run in order; Jobs and Events are skipped when they have
//!    no units. Final assembly writes the report and manifest.
//! 5. Success deletes the checkpoint. A stage failure marks it Failed and
//!    keeps it for resume or rollback.

use super::config::MigrationConfig;
use super::context::MigrationContext;
use super::stages::stage_for;
use crate::checkpoint::{CheckpointError, CheckpointStore, Stage, StageOutput, Status, TokenUsage};
use crate::dependencies::{DependencyClassifier, DependencyReport};
use crate::llm::LLMClient;
use crate::progress::{LoggingHandler, ProgressEvent, ProgressHandler};
use crate::scanner::{ProjectDescriptor, ScanError, Scanner};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("No checkpoint to resume in {}", .0.display())]
    NoCheckpoint(PathBuf),

    #[error("Stage {stage} failed: {message}")]
    Stage { stage: Stage, message: String },

    #[error("Migration blocked by unaccepted replacements: {}", .keys.join(", "))]
    Blocked { keys: Vec<String> },

    #[error("Migration cancelled during stage {stage}")]
    Cancelled { stage: Stage },
}

impl MigrationError {
    /// True when a checkpoint was kept and the run can be resumed
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            MigrationError::Stage { .. }
                | MigrationError::Blocked { .. }
                | MigrationError::Cancelled { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub status: Status,
    pub total: usize,
    pub converted: usize,
    pub skipped: usize,
    pub dropped: usize,
    pub files: Vec<String>,
    pub duration_ms: u64,
}

impl StageReport {
    fn from_output(stage: Stage, output: &StageOutput, duration: Duration) -> Self {
        let (total, converted, skipped, dropped) = counts(output);
        let files = match output {
            StageOutput::Conversion { files, .. } | StageOutput::Assembly { files } => {
                files.clone()
            }
            _ => Vec::new(),
        };
        Self {
            stage,
            status: Status::Completed,
            total,
            converted,
            skipped,
            dropped,
            files,
            duration_ms: duration.as_millis() as u64,
        }
    }

    fn skipped(stage: Stage) -> Self {
        Self {
            stage,
            status: Status::Skipped,
            total: 0,
            converted: 0,
            skipped: 0,
            dropped: 0,
            files: Vec::new(),
            duration_ms: 0,
        }
    }
}

/// (total, converted, skipped, dropped) for the progress stream
fn counts(output: &StageOutput) -> (usize, usize, usize, usize) {
    match output {
        StageOutput::Discovery { units, .. } => (units.values().sum(), 0, 0, 0),
        StageOutput::Dependencies {
            compatible,
            replaceable,
            unsupported,
            ..
        } => (compatible + replaceable + unsupported, 0, 0, 0),
        StageOutput::Conversion {
            total,
            converted,
            skipped,
            dropped,
            ..
        } => (*total, *converted, *skipped, *dropped),
        StageOutput::Assembly { files } => (files.len(), files.len(), 0, 0),
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationSummary {
    /// Stages executed by this run, in order
    pub stages: Vec<StageReport>,
    /// Cumulative over every run of this checkpoint
    pub usage: TokenUsage,
    pub estimated_cost: f64,
    pub resumed_from: Option<Stage>,
    /// Set for dry runs
    pub dry_run: Option<String>,
    pub descriptor: Option<ProjectDescriptor>,
    pub dependency_report: Option<DependencyReport>,
    pub total_time_ms: u64,
}

impl MigrationSummary {
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    pub fn converted(&self) -> usize {
        self.stages
            .iter()
            .filter(|r| r.stage.category().is_some())
            .map(|r| r.converted)
            .sum()
    }

    pub fn skipped(&self) -> usize {
        self.stages.iter().map(|r| r.skipped).sum()
    }
}

pub struct Migrator {
    config: MigrationConfig,
    client: Arc<dyn LLMClient>,
    progress: Arc<dyn ProgressHandler>,
    scanner: Scanner,
    classifier: DependencyClassifier,
    cancel: CancellationToken,
}

impl Migrator {
    pub fn new(config: MigrationConfig, client: Arc<dyn LLMClient>) -> Self {
        let scanner = Scanner::new().with_include_tests(config.include_tests);
        Self {
            config,
            client,
            progress: Arc::new(LoggingHandler),
            scanner,
            classifier: DependencyClassifier::with_defaults(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_progress_handler(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress = handler;
        self
    }

    pub fn with_scanner(mut self, scanner: Scanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn with_classifier(mut self, classifier: DependencyClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Token that cancels this migration when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(&self) -> Result<MigrationSummary, MigrationError> {
        let result = self.execute().await;
        if let Err(e) = &result {
            self.progress.on_progress(&ProgressEvent::RunFailed {
                error: e.to_string(),
                resumable: e.is_resumable(),
            });
        }
        result
    }

    async fn execute(&self) -> Result<MigrationSummary, MigrationError> {
        let start = Instant::now();
        let config = &self.config;
        config.validate().map_err(MigrationError::Config)?;

        self.progress.on_progress(&ProgressEvent::RunStarted {
            source: config.source_path.clone(),
            output: config.output_path.clone(),
            resume: config.resume,
            dry_run: config.dry_run,
        });

        let mut store = CheckpointStore::new(config.checkpoint_dir());
        let resume_from = if config.resume {
            let checkpoint = store
                .load()?
                .ok_or_else(|| MigrationError::NoCheckpoint(store.dir().to_path_buf()))?;
            if checkpoint.output_path != config.output_path {
                warn!(
                    recorded = %checkpoint.output_path.display(),
                    requested = %config.output_path.display(),
                    "Output path differs from the checkpointed run"
                );
            }
            checkpoint.next_stage()
        } else {
            if store.exists() {
                self.progress.on_progress(&ProgressEvent::StaleCheckpoint {
                    path: store.primary_path(),
                });
            }
            Some(Stage::first())
        };

        let mut summary = MigrationSummary::default();

        let Some(resume_from) = resume_from else {
            info!("Checkpointed run already finished, nothing to resume");
            if !config.dry_run {
                store.cleanup()?;
            }
            summary.total_time_ms = start.elapsed().as_millis() as u64;
            return Ok(summary);
        };
        if config.resume {
            summary.resumed_from = Some(resume_from);
            self.progress
                .on_progress(&ProgressEvent::Resumed { from: resume_from });
        }

        let persist = !config.dry_run;
        let mut context = MigrationContext::new(
            config,
            &self.scanner,
            &self.classifier,
            Arc::clone(&self.client),
            Arc::clone(&self.progress),
            self.cancel.clone(),
            store,
        );

        for stage in [Stage::Discovery, Stage::Dependencies] {
            let record = persist && stage >= resume_from;
            self.run_analysis_stage(&mut context, stage, record, &mut summary)
                .await?;
        }

        let blockers: Vec<String> = context
            .dependency_report
            .as_ref()
            .map(|r| r.blockers().iter().map(|b| b.key()).collect())
            .unwrap_or_default();
        if !blockers.is_empty() {
            context.emit(ProgressEvent::Blockers {
                keys: blockers.clone(),
            });
            if config.fail_on_blockers && persist {
                if Stage::Dependencies >= resume_from {
                    context.store.fail_stage(
                        Stage::Dependencies,
                        format!("Unaccepted replacements: {}", blockers.join(", ")),
                    )?;
                }
                return Err(MigrationError::Blocked { keys: blockers });
            }
        }

        if config.dry_run {
            let text = dry_run_summary(&context);
            context.emit(ProgressEvent::DryRunComplete {
                summary: text.clone(),
            });
            summary.dry_run = Some(text);
            summary.descriptor = context.descriptor.take();
            summary.dependency_report = context.dependency_report.take();
            summary.total_time_ms = start.elapsed().as_millis() as u64;
            return Ok(summary);
        }

        for stage in Stage::ALL
            .iter()
            .copied()
            .filter(|s| *s > Stage::Dependencies)
        {
            if stage < resume_from {
                context.emit(ProgressEvent::StageSkipped {
                    stage,
                    reason: "completed in an earlier run".to_string(),
                });
                continue;
            }

            if self.cancel.is_cancelled() {
                context.store.save()?;
                return Err(MigrationError::Cancelled { stage });
            }

            if let Some(category) = stage.category() {
                let has_units = context
                    .descriptor
                    .as_ref()
                    .is_some_and(|d| !d.units(category).is_empty());
                if is_conditional(stage) && !has_units {
                    context.store.skip_stage(stage)?;
                    context.emit(ProgressEvent::StageSkipped {
                        stage,
                        reason: format!("no {} units", category.as_str()),
                    });
                    summary.stages.push(StageReport::skipped(stage));
                    continue;
                }
            }

            self.run_recorded_stage(&mut context, stage, &mut summary)
                .await?;
        }

        if let Some(checkpoint) = context.store.checkpoint() {
            summary.usage = checkpoint.usage;
            summary.estimated_cost = checkpoint.estimated_cost;
        }
        context.store.cleanup()?;

        let total_time = start.elapsed();
        context.emit(ProgressEvent::RunCompleted {
            total_time,
            usage: summary.usage,
            cost: summary.estimated_cost,
        });

        summary.descriptor = context.descriptor.take();
        summary.dependency_report = context.dependency_report.take();
        summary.total_time_ms = total_time.as_millis() as u64;
        Ok(summary)
    }

    /// Discovery and dependency analysis: computed every run, recorded when
    /// `record` is set. Scan errors surface as configuration errors with no
    /// checkpoint side effects.
    async fn run_analysis_stage(
        &self,
        context: &mut MigrationContext<'_>,
        stage: Stage,
        record: bool,
        summary: &mut MigrationSummary,
    ) -> Result<(), MigrationError> {
        let started = Instant::now();
        context.emit(ProgressEvent::StageStarted { stage });

        let output = match stage_for(stage).execute(context).await {
            Ok(output) => output,
            Err(e) => {
                let e = match e.downcast::<ScanError>() {
                    Ok(scan) => return Err(MigrationError::Scan(scan)),
                    Err(e) => e,
                };
                let message = format!("{:#}", e);
                if record && context.store.checkpoint().is_some() {
                    context.store.fail_stage(stage, message.clone())?;
                }
                context.emit(ProgressEvent::StageFailed {
                    stage,
                    error: message.clone(),
                });
                return Err(MigrationError::Stage { stage, message });
            }
        };

        if record {
            if context.store.checkpoint().is_none() {
                // fresh run: drop snapshots of any earlier run first
                context.store.cleanup()?;
                context
                    .store
                    .initialize(&self.config.source_path, &self.config.output_path)?;
            }
            context.store.start_stage(stage)?;
            context.store.complete_stage(stage, Some(output.clone()))?;
        }

        self.stage_completed(context, stage, &output, started.elapsed(), summary);
        Ok(())
    }

    async fn run_recorded_stage(
        &self,
        context: &mut MigrationContext<'_>,
        stage: Stage,
        summary: &mut MigrationSummary,
    ) -> Result<(), MigrationError> {
        let started = Instant::now();
        context.store.start_stage(stage)?;
        context.emit(ProgressEvent::StageStarted { stage });

        match stage_for(stage).execute(context).await {
            Ok(output) => {
                if self.cancel.is_cancelled() {
                    // leave the stage InProgress so resume re-runs it
                    context.store.save()?;
                    warn!(stage = %stage, "Stage interrupted by cancellation");
                    return Err(MigrationError::Cancelled { stage });
                }
                context.store.complete_stage(stage, Some(output.clone()))?;
                self.stage_completed(context, stage, &output, started.elapsed(), summary);
                Ok(())
            }
            Err(e) => {
                let message = format!("{:#}", e);
                context.store.fail_stage(stage, message.clone())?;
                context.emit(ProgressEvent::StageFailed {
                    stage,
                    error: message.clone(),
                });
                Err(MigrationError::Stage { stage, message })
            }
        }
    }

    fn stage_completed(
        &self,
        context: &MigrationContext<'_>,
        stage: Stage,
        output: &StageOutput,
        duration: Duration,
        summary: &mut MigrationSummary,
    ) {
        let (total, converted, skipped, dropped) = counts(output);
        context.emit(ProgressEvent::StageCompleted {
            stage,
            total,
            converted,
            skipped,
            dropped,
            duration,
        });
        summary
            .stages
            .push(StageReport::from_output(stage, output, duration));
    }
}

/// Stages that only run when the project has units of their category
fn is_conditional(stage: Stage) -> bool {
    matches!(stage, Stage::Jobs | Stage::Events)
}

fn dry_run_summary(context: &MigrationContext<'_>) -> String {
    let mut out = String::new();
    if let Some(descriptor) = &context.descriptor {
        out.push_str(&descriptor.summary());
    }
    if let Some(report) = &context.dependency_report {
        out.push('\n');
        out.push_str(&report.render());
    }
    if let Some(descriptor) = &context.descriptor {
        let _ = writeln!(
            out,
            "\nWould convert {} unit(s) into {} module '{}' at {}",
            descriptor.total_units(),
            context.config.target_language,
            context.config.target_module,
            context.config.output_path.display()
        );
    }
    out
}
