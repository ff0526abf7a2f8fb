//! State shared by the stages of one migration run

use super::config::MigrationConfig;
use super::layout::TargetLayout;
use crate::checkpoint::CheckpointStore;
use crate::convert::ConversionContext;
use crate::dependencies::{DependencyClassifier, DependencyReport};
use crate::llm::LLMClient;
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::scanner::{ProjectDescriptor, Scanner};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct MigrationContext<'a> {
    pub config: &'a MigrationConfig,
    pub scanner: &'a Scanner,
    pub classifier: &'a DependencyClassifier,
    pub client: Arc<dyn LLMClient>,
    pub progress: Arc<dyn ProgressHandler>,
    pub cancel: CancellationToken,
    pub layout: TargetLayout,
    /// Only unit stages and final assembly write through the store
    pub store: CheckpointStore,

    // Stage results
    pub descriptor: Option<ProjectDescriptor>,
    pub dependency_report: Option<DependencyReport>,
}

impl<'a> MigrationContext<'a> {
    pub fn new(
        config: &'a MigrationConfig,
        scanner: &'a Scanner,
        classifier: &'a DependencyClassifier,
        client: Arc<dyn LLMClient>,
        progress: Arc<dyn ProgressHandler>,
        cancel: CancellationToken,
        store: CheckpointStore,
    ) -> Self {
        Self {
            layout: TargetLayout::new(&config.output_path, &config.target_module),
            config,
            scanner,
            classifier,
            client,
            progress,
            cancel,
            store,
            descriptor: None,
            dependency_report: None,
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        self.progress.on_progress(&event);
    }

    pub fn descriptor(&self) -> Result<&ProjectDescriptor> {
        self.descriptor
            .as_ref()
            .ok_or_else(|| anyhow!("Discovery must complete before this stage"))
    }

    pub fn dependency_report(&self) -> Result<&DependencyReport> {
        self.dependency_report
            .as_ref()
            .ok_or_else(|| anyhow!("Dependency analysis must complete before this stage"))
    }

    /// Project facts handed to every converter prompt
    pub fn conversion_context(&self) -> Result<ConversionContext> {
        let descriptor = self.descriptor()?;

        let mut notes = Vec::new();
        if let Some(db) = descriptor.primary_database {
            notes.push(format!("primary database: {}", db.name()));
        }
        if let Some(broker) = descriptor.message_broker {
            notes.push(format!("message broker: {}", broker.name()));
        }
        if descriptor.uses_cache {
            notes.push("the project uses a cache abstraction".to_string());
        }
        if let Some(report) = &self.dependency_report {
            for replacement in &report.replaceable {
                notes.push(format!(
                    "replace {} with {}",
                    replacement.dependency.artifact_id, replacement.alternative
                ));
            }
        }

        Ok(ConversionContext {
            project_name: descriptor.name.clone(),
            base_package: descriptor.base_package.clone(),
            source_framework: descriptor
                .framework
                .as_ref()
                .map(|f| f.name.clone())
                .unwrap_or_else(|| "Java".to_string()),
            target_language: self.config.target_language.clone(),
            target_module: self.config.target_module.clone(),
            notes,
        })
    }
}
