//! Staged, checkpointed migration pipeline

pub mod config;
pub mod context;
pub mod layout;
pub mod orchestrator;
pub mod stages;

pub use config::MigrationConfig;
pub use context::MigrationContext;
pub use layout::TargetLayout;
pub use orchestrator::{MigrationError, MigrationSummary, Migrator, StageReport};
pub use stages::{MigrationManifest, MigrationStage, MANIFEST_FILE, REPORT_FILE};
