use crate::checkpoint::{Pricing, CHECKPOINT_DIR_NAME};
use crate::convert::GenerationBudget;
use crate::dependencies::DependencyReport;
use crate::scanner::ProjectDescriptor;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_TOKENS: u32 = 8192;
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_TARGET_MODULE: &str = "app";
pub const DEFAULT_TARGET_LANGUAGE: &str = "Go";
pub const DEFAULT_FILE_EXTENSION: &str = "go";

/// Configuration for one migration run
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub dry_run: bool,
    pub resume: bool,
    pub include_tests: bool,
    /// Treat unaccepted high-complexity replacements as a hard stop
    pub fail_on_blockers: bool,
    /// `group:artifact` keys of replacements the operator accepted
    pub accepted_replacements: Vec<String>,
    pub target_module: String,
    pub target_language: String,
    /// Extension of generated files, without the dot
    pub file_extension: String,
    pub budget: GenerationBudget,
    pub pricing: Pricing,
    /// Checkpoint directory; `<source>/.liftbox` when unset
    pub checkpoint_dir: Option<PathBuf>,
    /// Pre-computed scan result, skips the scanner
    pub descriptor: Option<ProjectDescriptor>,
    /// Pre-computed dependency report, skips the classifier
    pub dependency_report: Option<DependencyReport>,
}

impl MigrationConfig {
    pub fn new(source_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            output_path: output_path.into(),
            dry_run: false,
            resume: false,
            include_tests: false,
            fail_on_blockers: false,
            accepted_replacements: Vec::new(),
            target_module: DEFAULT_TARGET_MODULE.to_string(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            budget: GenerationBudget::new(DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE),
            pricing: Pricing::default(),
            checkpoint_dir: None,
            descriptor: None,
            dependency_report: None,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_include_tests(mut self, include_tests: bool) -> Self {
        self.include_tests = include_tests;
        self
    }

    pub fn with_fail_on_blockers(mut self, fail_on_blockers: bool) -> Self {
        self.fail_on_blockers = fail_on_blockers;
        self
    }

    pub fn with_accepted_replacements(mut self, keys: Vec<String>) -> Self {
        self.accepted_replacements = keys;
        self
    }

    pub fn with_target_module(mut self, module: impl Into<String>) -> Self {
        self.target_module = module.into();
        self
    }

    pub fn with_target_language(
        mut self,
        language: impl Into<String>,
        file_extension: impl Into<String>,
    ) -> Self {
        self.target_language = language.into();
        self.file_extension = file_extension.into();
        self
    }

    pub fn with_budget(mut self, budget: GenerationBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self
    }

    pub fn with_descriptor(mut self, descriptor: ProjectDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    pub fn with_dependency_report(mut self, report: DependencyReport) -> Self {
        self.dependency_report = Some(report);
        self
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        self.checkpoint_dir
            .clone()
            .unwrap_or_else(|| self.source_path.join(CHECKPOINT_DIR_NAME))
    }

    /// Checks the paths before anything touches the filesystem
    pub fn validate(&self) -> Result<(), String> {
        if !self.source_path.is_dir() {
            return Err(format!(
                "Source path {} is not a directory",
                self.source_path.display()
            ));
        }
        if same_path(&self.source_path, &self.output_path) {
            return Err("Output path must differ from the source path".to_string());
        }
        if self.output_path.is_file() {
            return Err(format!(
                "Output path {} is a file",
                self.output_path.display()
            ));
        }
        if self.budget.baseline_tokens == 0 {
            return Err("Generation budget must be greater than zero".to_string());
        }
        if self.target_module.trim().is_empty() {
            return Err("Target module name must not be empty".to_string());
        }
        if self.file_extension.trim().is_empty() || self.file_extension.contains('.') {
            return Err(format!(
                "Invalid file extension '{}' (expected e.g. \"go\")",
                self.file_extension
            ));
        }
        Ok(())
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = MigrationConfig::new("/src", "/out");
        assert!(!config.dry_run);
        assert!(!config.resume);
        assert_eq!(config.budget.baseline_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.file_extension, "go");
        assert_eq!(config.checkpoint_dir(), PathBuf::from("/src/.liftbox"));
    }

    #[test]
    fn test_builder_pattern() {
        let config = MigrationConfig::new("/src", "/out")
            .with_dry_run(true)
            .with_resume(true)
            .with_fail_on_blockers(true)
            .with_accepted_replacements(vec!["a:b".into()])
            .with_target_module("orders")
            .with_budget(GenerationBudget::new(4000, 0.0))
            .with_checkpoint_dir("/tmp/cp");

        assert!(config.dry_run && config.resume && config.fail_on_blockers);
        assert_eq!(config.accepted_replacements, vec!["a:b".to_string()]);
        assert_eq!(config.target_module, "orders");
        assert_eq!(config.budget.escalated_tokens(), 8000);
        assert_eq!(config.checkpoint_dir(), PathBuf::from("/tmp/cp"));
    }

    #[test]
    fn test_validate() {
        let source = TempDir::new().unwrap();
        let out = source.path().join("out");

        assert!(MigrationConfig::new(source.path(), &out).validate().is_ok());
        assert!(MigrationConfig::new(source.path(), source.path())
            .validate()
            .is_err());
        assert!(MigrationConfig::new(source.path().join("missing"), &out)
            .validate()
            .is_err());
        assert!(MigrationConfig::new(source.path(), &out)
            .with_target_language("Go", ".go")
            .validate()
            .is_err());
    }
}
