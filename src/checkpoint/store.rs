//! File-backed checkpoint store
//!
//! Layout inside the checkpoint directory:
//!
//! ```text
//! <source>/.liftbox/
//!   checkpoint.json        primary checkpoint, read on resume
//!   discovery.json         full snapshot taken whenever the current stage was Discovery
//!   services.json          ... one per stage ever attempted
//! ```
//!
//! Every file is written to a temporary sibling, synced and then renamed over
//! the target, so a crash mid-write leaves the previous version intact.

use super::error::CheckpointError;
use super::types::{AIDecision, Checkpoint, Stage, StageOutput, Status, CHECKPOINT_SCHEMA_VERSION};
use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Directory created under the source project root
pub const CHECKPOINT_DIR_NAME: &str = ".liftbox";

/// Primary checkpoint file name
pub const CHECKPOINT_FILE_NAME: &str = "checkpoint.json";

pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Owns all checkpoint file I/O for one checkpoint directory.
///
/// Stage transitions persist immediately. Decisions and cost updates only
/// mutate memory; they reach disk with the next transition or explicit
/// [`save`](Self::save).
#[derive(Debug)]
pub struct CheckpointStore {
    dir: PathBuf,
    checkpoint: Option<Checkpoint>,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            checkpoint: None,
        }
    }

    /// Store rooted at `<source>/.liftbox`
    pub fn for_source(source_path: &Path) -> Self {
        Self::new(source_path.join(CHECKPOINT_DIR_NAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn primary_path(&self) -> PathBuf {
        self.dir.join(CHECKPOINT_FILE_NAME)
    }

    /// True if a primary checkpoint file exists on disk
    pub fn exists(&self) -> bool {
        self.primary_path().is_file()
    }

    pub fn checkpoint(&self) -> Option<&Checkpoint> {
        self.checkpoint.as_ref()
    }

    fn checkpoint_mut(&mut self) -> Result<&mut Checkpoint> {
        self.checkpoint.as_mut().ok_or(CheckpointError::NotInitialized)
    }

    /// Creates the checkpoint directory and writes a fresh checkpoint at
    /// Discovery/Pending, replacing any previous primary checkpoint.
    pub fn initialize(&mut self, source_path: &Path, output_path: &Path) -> Result<&Checkpoint> {
        fs::create_dir_all(&self.dir).map_err(|e| CheckpointError::storage(&self.dir, e))?;

        self.checkpoint = Some(Checkpoint::new(
            source_path.to_path_buf(),
            output_path.to_path_buf(),
        ));
        self.save()?;

        info!(dir = %self.dir.display(), "Checkpoint initialized");
        self.checkpoint.as_ref().ok_or(CheckpointError::NotInitialized)
    }

    /// Loads the primary checkpoint. A missing file is `Ok(None)`, not an error.
    pub fn load(&mut self) -> Result<Option<Checkpoint>> {
        let path = self.primary_path();
        if !path.is_file() {
            debug!(path = %path.display(), "No checkpoint on disk");
            return Ok(None);
        }

        let checkpoint = read_checkpoint(&path)?;
        debug!(
            stage = %checkpoint.stage,
            status = %checkpoint.status,
            decisions = checkpoint.decisions.len(),
            "Checkpoint loaded"
        );
        self.checkpoint = Some(checkpoint.clone());
        Ok(Some(checkpoint))
    }

    /// Writes the in-memory checkpoint to the primary file and to the
    /// snapshot of its current stage.
    pub fn save(&self) -> Result<()> {
        let checkpoint = self
            .checkpoint
            .as_ref()
            .ok_or(CheckpointError::NotInitialized)?;

        fs::create_dir_all(&self.dir).map_err(|e| CheckpointError::storage(&self.dir, e))?;

        let primary = self.primary_path();
        let bytes = serde_json::to_vec_pretty(checkpoint).map_err(|source| {
            CheckpointError::Serialization {
                path: primary.clone(),
                source,
            }
        })?;

        write_atomic(&self.dir, &primary, &bytes)?;
        write_atomic(
            &self.dir,
            &self.dir.join(checkpoint.stage.snapshot_file_name()),
            &bytes,
        )?;

        debug!(
            stage = %checkpoint.stage,
            status = %checkpoint.status,
            "Checkpoint saved"
        );
        Ok(())
    }

    pub fn start_stage(&mut self, stage: Stage) -> Result<()> {
        let checkpoint = self.checkpoint_mut()?;
        checkpoint.stage = stage;
        checkpoint.status = Status::InProgress;
        checkpoint.errors.clear();
        checkpoint.timestamp = Utc::now();
        self.save()
    }

    /// Marks `stage` completed and merges its output into the data bag,
    /// replacing any earlier output for the same stage.
    pub fn complete_stage(&mut self, stage: Stage, output: Option<StageOutput>) -> Result<()> {
        let checkpoint = self.checkpoint_mut()?;
        checkpoint.stage = stage;
        checkpoint.status = Status::Completed;
        checkpoint.timestamp = Utc::now();
        if let Some(output) = output {
            checkpoint.data.insert(stage, output);
        }
        self.save()
    }

    /// Records a stage failure. Halting the run is the caller's decision.
    pub fn fail_stage(&mut self, stage: Stage, error: impl Into<String>) -> Result<()> {
        let checkpoint = self.checkpoint_mut()?;
        checkpoint.stage = stage;
        checkpoint.status = Status::Failed;
        checkpoint.errors.push(error.into());
        checkpoint.timestamp = Utc::now();
        self.save()
    }

    /// Marks a conditional stage as skipped so resume moves past it
    pub fn skip_stage(&mut self, stage: Stage) -> Result<()> {
        let checkpoint = self.checkpoint_mut()?;
        checkpoint.stage = stage;
        checkpoint.status = Status::Skipped;
        checkpoint.errors.clear();
        checkpoint.timestamp = Utc::now();
        self.save()
    }

    /// Appends a provider-call record and folds its usage into the totals.
    /// Not persisted until the next save.
    pub fn add_decision(&mut self, decision: AIDecision) -> Result<()> {
        let checkpoint = self.checkpoint_mut()?;
        checkpoint.usage += decision.usage;
        checkpoint.decisions.push(decision);
        Ok(())
    }

    /// Adds `delta` USD to the cumulative estimate. Negative or non-finite
    /// deltas are ignored so the total never decreases.
    pub fn update_cost(&mut self, delta: f64) -> Result<()> {
        let checkpoint = self.checkpoint_mut()?;
        if delta.is_finite() && delta > 0.0 {
            checkpoint.estimated_cost += delta;
        } else if delta != 0.0 {
            warn!(delta, "Ignoring invalid cost delta");
        }
        Ok(())
    }

    /// Stage to run next; the first stage when nothing is loaded
    pub fn next_stage(&self) -> Option<Stage> {
        match &self.checkpoint {
            Some(checkpoint) => checkpoint.next_stage(),
            None => Some(Stage::first()),
        }
    }

    /// Replaces the primary checkpoint in `dir` with the snapshot of `stage`
    pub fn rollback_to_stage(dir: &Path, stage: Stage) -> Result<Checkpoint> {
        let snapshot = dir.join(stage.snapshot_file_name());
        if !snapshot.is_file() {
            return Err(CheckpointError::SnapshotNotFound {
                stage,
                dir: dir.to_path_buf(),
            });
        }

        let checkpoint = read_checkpoint(&snapshot)?;
        let bytes = fs::read(&snapshot).map_err(|e| CheckpointError::storage(&snapshot, e))?;
        write_atomic(dir, &dir.join(CHECKPOINT_FILE_NAME), &bytes)?;

        info!(stage = %stage, dir = %dir.display(), "Rolled back checkpoint");
        Ok(checkpoint)
    }

    /// Deletes the output directory recorded in the checkpoint and the
    /// checkpoint directory itself. Irreversible.
    pub fn rollback_all(dir: &Path) -> Result<()> {
        let primary = dir.join(CHECKPOINT_FILE_NAME);
        if !dir.exists() {
            return Err(CheckpointError::NotFound(dir.to_path_buf()));
        }

        if primary.is_file() {
            let checkpoint = read_checkpoint(&primary)?;
            let output = &checkpoint.output_path;
            if dir.starts_with(output) || checkpoint.source_path.starts_with(output) {
                return Err(CheckpointError::UnsafeOutputPath(output.clone()));
            }
            if output.exists() {
                fs::remove_dir_all(output).map_err(|e| CheckpointError::storage(output, e))?;
                info!(output = %output.display(), "Removed migration output");
            }
        } else {
            warn!(dir = %dir.display(), "No primary checkpoint, removing checkpoint directory only");
        }

        fs::remove_dir_all(dir).map_err(|e| CheckpointError::storage(dir, e))?;
        info!(dir = %dir.display(), "Removed checkpoint directory");
        Ok(())
    }

    /// Deletes the checkpoint directory after a successful run
    pub fn cleanup(&mut self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir).map_err(|e| CheckpointError::storage(&self.dir, e))?;
            debug!(dir = %self.dir.display(), "Checkpoint directory removed");
        }
        self.checkpoint = None;
        Ok(())
    }

    /// Stages that have a snapshot in `dir`, in pipeline order
    pub fn list_snapshots(dir: &Path) -> Result<Vec<Stage>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        Ok(Stage::ALL
            .iter()
            .copied()
            .filter(|stage| dir.join(stage.snapshot_file_name()).is_file())
            .collect())
    }
}

fn read_checkpoint(path: &Path) -> Result<Checkpoint> {
    let bytes = fs::read(path).map_err(|e| CheckpointError::storage(path, e))?;

    // Check the version before the full parse so newer files fail clearly.
    let version = serde_json::from_slice::<serde_json::Value>(&bytes)
        .ok()
        .and_then(|value| value.get("schema_version").and_then(|v| v.as_u64()));
    if let Some(found) = version {
        if found > u64::from(CHECKPOINT_SCHEMA_VERSION) {
            return Err(CheckpointError::UnsupportedVersion {
                path: path.to_path_buf(),
                found: found as u32,
                supported: CHECKPOINT_SCHEMA_VERSION,
            });
        }
    }

    serde_json::from_slice(&bytes).map_err(|source| CheckpointError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CheckpointError::storage(dir, e))?;
    tmp.write_all(bytes)
        .map_err(|e| CheckpointError::storage(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| CheckpointError::storage(tmp.path(), e))?;
    tmp.persist(target)
        .map_err(|e| CheckpointError::storage(target, e.error))?;
    Ok(())
}
