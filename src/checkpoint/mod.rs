//! Durable checkpoint/resume/rollback for migration runs

mod error;
mod store;
mod types;

pub use error::CheckpointError;
pub use store::{CheckpointStore, CHECKPOINT_DIR_NAME, CHECKPOINT_FILE_NAME};
pub use types::{
    summarize, AIDecision, Checkpoint, Pricing, Stage, StageOutput, Status, TokenUsage,
    UnknownStage, CHECKPOINT_SCHEMA_VERSION, SUMMARY_LIMIT,
};
