use super::MigrationStage;
use crate::checkpoint::{Stage, StageOutput};
use crate::pipeline::context::MigrationContext;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Scans the source project, or adopts a descriptor supplied by the caller
pub struct DiscoveryStage;

#[async_trait]
impl MigrationStage for DiscoveryStage {
    fn stage(&self) -> Stage {
        Stage::Discovery
    }

    async fn execute(&self, context: &mut MigrationContext<'_>) -> Result<StageOutput> {
        let start = Instant::now();

        let descriptor = match &context.config.descriptor {
            Some(descriptor) => {
                debug!(project = %descriptor.name, "Using pre-computed project descriptor");
                descriptor.clone()
            }
            // ScanError is returned bare so the caller can tell configuration
            // errors apart from stage failures.
            None => context.scanner.scan(&context.config.source_path)?,
        };

        for ambiguous in &descriptor.ambiguous_units {
            warn!(
                unit = %ambiguous.name,
                chosen = %ambiguous.chosen,
                also_matched = ?ambiguous.also_matched,
                "Unit matched several categories"
            );
        }

        info!(
            project = %descriptor.name,
            units = descriptor.total_units(),
            dependencies = descriptor.dependencies.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Discovery complete"
        );

        let output = StageOutput::Discovery {
            project_name: descriptor.name.clone(),
            base_package: descriptor.base_package.clone(),
            modules: descriptor.modules.clone(),
            dependency_count: descriptor.dependencies.len(),
            units: descriptor.unit_counts(),
        };
        context.descriptor = Some(descriptor);
        Ok(output)
    }
}
