//! liftbox - stage-based Spring Boot to Go migration
//!
//! This library scans a Spring Boot project, classifies its dependencies and
//! converts it unit by unit into a Go module through a pluggable code-analysis
//! provider. Every stage is checkpointed so long runs survive failures,
//! cancellation and restarts.
//!
//! # Core Concepts
//!
//! - **Project descriptor**: build tool, framework, modules, dependencies and
//!   source units grouped by category, produced by [`scanner::Scanner`]
//! - **Dependency report**: compatible, replaceable and unsupported
//!   dependencies; unaccepted high-complexity replacements are blockers
//! - **Stages**: a fixed sequence (discovery, dependencies, one stage per unit
//!   category, final assembly) driven by [`pipeline::Migrator`]
//! - **Checkpoints**: full snapshots after every stage for resume and
//!   rollback, with every provider call recorded as an [`checkpoint::AIDecision`]
//!
//! # Example Usage
//!
//! ```ignore
//! use liftbox::{LiftboxConfig, MigrationConfig, Migrator};
//!
//! async fn migrate() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = LiftboxConfig::default();
//!     let client = settings.create_client()?;
//!
//!     let config = MigrationConfig::new("./shop", "./shop-go")
//!         .with_budget(settings.budget())
//!         .with_pricing(settings.pricing);
//!     let summary = Migrator::new(config, client).run().await?;
//!
//!     println!("Converted {} units", summary.converted());
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`scanner`]: build descriptor parsing and unit categorization
//! - [`dependencies`]: dependency classification
//! - [`convert`]: per-category converters and the truncation-retry driver
//! - [`llm`]: provider clients
//! - [`checkpoint`]: durable run state
//! - [`pipeline`]: run configuration, stages and the orchestrator
//! - [`progress`]: progress events and sinks

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod convert;
pub mod dependencies;
pub mod llm;
pub mod pipeline;
pub mod progress;
pub mod scanner;
pub mod util;

// Re-export key types for convenient access
pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore, Stage, Status, TokenUsage};
pub use config::{ConfigError, LiftboxConfig, ProviderKind};
pub use dependencies::{DependencyClassifier, DependencyReport};
pub use llm::{BackendError, LLMClient};
pub use pipeline::{MigrationConfig, MigrationError, MigrationSummary, Migrator};
pub use progress::{LoggingHandler, NoOpHandler, ProgressEvent, ProgressHandler};
pub use scanner::{ProjectDescriptor, ScanError, Scanner};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_liftbox() {
        assert_eq!(NAME, "liftbox");
    }
}
