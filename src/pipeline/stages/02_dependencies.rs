use super::MigrationStage;
use crate::checkpoint::{Stage, StageOutput};
use crate::pipeline::context::MigrationContext;
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

/// Classifies the declared dependencies. Blockers are reported here; whether
/// they halt the run is decided by the migrator.
pub struct DependencyStage;

#[async_trait]
impl MigrationStage for DependencyStage {
    fn stage(&self) -> Stage {
        Stage::Dependencies
    }

    async fn execute(&self, context: &mut MigrationContext<'_>) -> Result<StageOutput> {
        let accepted = &context.config.accepted_replacements;

        let report = match &context.config.dependency_report {
            Some(report) => {
                debug!("Using pre-computed dependency report");
                let mut report = report.clone();
                for key in accepted {
                    report.accept(key);
                }
                report
            }
            None => {
                let descriptor = context.descriptor()?;
                context
                    .classifier
                    .analyze_with_accepted(&descriptor.dependencies, accepted)
            }
        };

        info!(summary = %report.summary(), "Dependency analysis complete");

        let output = StageOutput::Dependencies {
            compatible: report.compatible.len(),
            replaceable: report.replaceable.len(),
            unsupported: report.unsupported.len(),
            has_blockers: report.has_blockers(),
        };
        context.dependency_report = Some(report);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependencies::DependencyReport;
    use crate::llm::MockLLMClient;
    use crate::pipeline::context::fixture::Fixture;
    use crate::scanner::{BuildTool, Dependency, ProjectDescriptor};
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::Arc;

    fn descriptor(dependencies: Vec<Dependency>) -> ProjectDescriptor {
        ProjectDescriptor {
            name: "shop".into(),
            build_tool: BuildTool::Maven,
            framework: None,
            language_version: "17".into(),
            base_package: "com.acme".into(),
            group_id: "com.acme".into(),
            artifact_id: "shop".into(),
            modules: vec![],
            is_multi_module: false,
            dependencies,
            units: BTreeMap::new(),
            ambiguous_units: vec![],
            uses_document_store: false,
            message_broker: None,
            uses_cache: false,
            primary_database: None,
        }
    }

    #[tokio::test]
    async fn test_requires_discovery() {
        let fixture = Fixture::new(Path::new("/src"), Path::new("/out"));
        let mut context = fixture.context(Arc::new(MockLLMClient::new()));
        assert!(DependencyStage.execute(&mut context).await.is_err());
    }

    #[tokio::test]
    async fn test_accepted_replacements_clear_blockers() {
        let security = Dependency::new("org.springframework.boot", "spring-boot-starter-security");
        let mut fixture = Fixture::new(Path::new("/src"), Path::new("/out"));

        let mut context = fixture.context(Arc::new(MockLLMClient::new()));
        context.descriptor = Some(descriptor(vec![security.clone()]));
        let output = DependencyStage.execute(&mut context).await.unwrap();
        assert!(matches!(
            output,
            StageOutput::Dependencies { has_blockers: true, replaceable: 1, .. }
        ));

        fixture.config.accepted_replacements = vec![security.key()];
        let mut context = fixture.context(Arc::new(MockLLMClient::new()));
        context.descriptor = Some(descriptor(vec![security]));
        let output = DependencyStage.execute(&mut context).await.unwrap();
        assert!(matches!(
            output,
            StageOutput::Dependencies { has_blockers: false, .. }
        ));
    }

    #[tokio::test]
    async fn test_precomputed_report_is_used() {
        let mut fixture = Fixture::new(Path::new("/src"), Path::new("/out"));
        fixture.config.dependency_report = Some(DependencyReport {
            unsupported: vec!["com.ibm.websphere:was".into()],
            ..Default::default()
        });

        let mut context = fixture.context(Arc::new(MockLLMClient::new()));
        let output = DependencyStage.execute(&mut context).await.unwrap();
        assert!(matches!(
            output,
            StageOutput::Dependencies { unsupported: 1, .. }
        ));
    }
}
