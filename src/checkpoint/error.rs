use super::types::Stage;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint at {} could not be (de)serialized: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "Checkpoint at {} uses schema version {found}, newer than supported version {supported}",
        .path.display()
    )]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    #[error("No snapshot for stage '{stage}' in {}", .dir.display())]
    SnapshotNotFound { stage: Stage, dir: PathBuf },

    #[error("No checkpoint found in {}", .0.display())]
    NotFound(PathBuf),

    #[error(
        "Refusing to delete {}: it contains the source project or checkpoint directory",
        .0.display()
    )]
    UnsafeOutputPath(PathBuf),

    #[error("Checkpoint store has not been initialized or loaded")]
    NotInitialized,
}

impl CheckpointError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}
