//! Checkpoint data model
//!
//! A [`Checkpoint`] is the complete, self-contained record of a migration run:
//! where it is, what each stage produced, every provider call made and what it
//! cost. Snapshots on disk always hold the full structure, never a diff.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

use crate::scanner::UnitCategory;

/// Current on-disk schema version for [`Checkpoint`]
pub const CHECKPOINT_SCHEMA_VERSION: u32 = 1;

/// Maximum characters kept for prompt/response summaries in an [`AIDecision`]
pub const SUMMARY_LIMIT: usize = 500;

crate::define_id_enum! {
    /// A phase of the fixed migration sequence; declaration order is run order
    Stage {
        Discovery => "discovery" : "Discovery",
        Dependencies => "dependencies" : "Dependencies",
        Entities => "entities" : "Entities",
        Repositories => "repositories" : "Repositories",
        Services => "services" : "Services",
        Controllers => "controllers" : "Controllers",
        Jobs => "jobs" : "Jobs",
        Events => "events" : "Events",
        Configuration => "configuration" : "Configuration",
        FinalAssembly => "final_assembly" : "Final Assembly" | "final-assembly" | "assembly",
    }
}

impl Stage {
    pub fn first() -> Stage {
        Stage::Discovery
    }

    pub fn last() -> Stage {
        Stage::FinalAssembly
    }

    /// The stage that runs after this one, or `None` after the last stage
    pub fn next(&self) -> Option<Stage> {
        Stage::ALL.get(self.index() + 1).copied()
    }

    /// Unit category converted by this stage, if it is a unit-producing stage
    pub fn category(&self) -> Option<UnitCategory> {
        match self {
            Stage::Entities => Some(UnitCategory::Entity),
            Stage::Repositories => Some(UnitCategory::Repository),
            Stage::Services => Some(UnitCategory::Service),
            Stage::Controllers => Some(UnitCategory::Controller),
            Stage::Jobs => Some(UnitCategory::Job),
            Stage::Events => Some(UnitCategory::Listener),
            Stage::Configuration => Some(UnitCategory::Configuration),
            Stage::Discovery | Stage::Dependencies | Stage::FinalAssembly => None,
        }
    }

    /// The unit-producing stage that converts `category`
    pub fn for_category(category: UnitCategory) -> Stage {
        match category {
            UnitCategory::Entity => Stage::Entities,
            UnitCategory::Repository => Stage::Repositories,
            UnitCategory::Service => Stage::Services,
            UnitCategory::Controller => Stage::Controllers,
            UnitCategory::Job => Stage::Jobs,
            UnitCategory::Listener => Stage::Events,
            UnitCategory::Configuration => Stage::Configuration,
        }
    }

    /// File name of this stage's snapshot inside the checkpoint directory
    pub fn snapshot_file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

/// Error returned when a stage name cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStage {
    pub input: String,
    pub suggestion: Option<Stage>,
}

impl fmt::Display for UnknownStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown stage '{}'", self.input)?;
        if let Some(stage) = self.suggestion {
            write!(f, " (did you mean '{}'?)", stage.as_str())?;
        }
        Ok(())
    }
}

impl std::error::Error for UnknownStage {}

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(stage) = Stage::from_name(s) {
            return Ok(stage);
        }

        let lowered = s.trim().to_lowercase();
        let suggestion = Stage::ALL
            .iter()
            .map(|stage| (*stage, strsim::jaro_winkler(&lowered, stage.as_str())))
            .filter(|(_, score)| *score >= 0.8)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(stage, _)| stage);

        Err(UnknownStage {
            input: s.to_string(),
            suggestion,
        })
    }
}

crate::define_id_enum! {
    /// Status of the checkpoint's current stage
    Status {
        Pending => "pending" : "Pending",
        InProgress => "in_progress" : "In Progress" | "in-progress",
        Completed => "completed" : "Completed",
        Failed => "failed" : "Failed",
        Skipped => "skipped" : "Skipped",
    }
}

impl Status {
    /// True once the stage needs no further work
    pub fn is_done(&self) -> bool {
        matches!(self, Status::Completed | Status::Skipped)
    }
}

/// Token counts reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.add(rhs);
    }
}

/// Provider pricing in USD per million tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            input_per_million: 3.0,
            output_per_million: 15.0,
        }
    }
}

impl Pricing {
    pub fn cost(&self, usage: TokenUsage) -> f64 {
        (usage.input_tokens as f64 * self.input_per_million
            + usage.output_tokens as f64 * self.output_per_million)
            / 1_000_000.0
    }
}

/// Audit record of a single provider call. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AIDecision {
    pub id: Uuid,
    pub stage: Stage,
    pub timestamp: DateTime<Utc>,
    /// Source unit identifier (path relative to the source root)
    pub source_file: String,
    /// SHA-256 of the unit content at the time of the call
    pub source_digest: String,
    pub action: String,
    pub prompt_summary: String,
    pub response_summary: String,
    pub usage: TokenUsage,
}

impl AIDecision {
    pub fn new(
        stage: Stage,
        source_file: impl Into<String>,
        action: impl Into<String>,
        usage: TokenUsage,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage,
            timestamp: Utc::now(),
            source_file: source_file.into(),
            source_digest: String::new(),
            action: action.into(),
            prompt_summary: String::new(),
            response_summary: String::new(),
            usage,
        }
    }

    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.source_digest = digest.into();
        self
    }

    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt_summary = summarize(prompt, SUMMARY_LIMIT);
        self
    }

    pub fn with_response(mut self, response: &str) -> Self {
        self.response_summary = summarize(response, SUMMARY_LIMIT);
        self
    }
}

/// Truncates `text` to at most `limit` characters, appending an ellipsis
pub fn summarize(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}…", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Typed per-stage output stored in the checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageOutput {
    Discovery {
        project_name: String,
        base_package: String,
        modules: Vec<String>,
        dependency_count: usize,
        units: BTreeMap<UnitCategory, usize>,
    },
    Dependencies {
        compatible: usize,
        replaceable: usize,
        unsupported: usize,
        has_blockers: bool,
    },
    Conversion {
        total: usize,
        converted: usize,
        skipped: usize,
        dropped: usize,
        files: Vec<String>,
        review_required: Vec<String>,
    },
    Assembly {
        files: Vec<String>,
    },
}

/// Durable snapshot of pipeline progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub schema_version: u32,
    pub stage: Stage,
    pub status: Status,
    pub timestamp: DateTime<Utc>,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    #[serde(default)]
    pub data: BTreeMap<Stage, StageOutput>,
    #[serde(default)]
    pub decisions: Vec<AIDecision>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub usage: TokenUsage,
    #[serde(default)]
    pub estimated_cost: f64,
}

impl Checkpoint {
    pub fn new(source_path: PathBuf, output_path: PathBuf) -> Self {
        Self {
            schema_version: CHECKPOINT_SCHEMA_VERSION,
            stage: Stage::first(),
            status: Status::Pending,
            timestamp: Utc::now(),
            source_path,
            output_path,
            data: BTreeMap::new(),
            decisions: Vec::new(),
            errors: Vec::new(),
            usage: TokenUsage::default(),
            estimated_cost: 0.0,
        }
    }

    /// Stage a resumed run should start from, or `None` when the run is finished
    pub fn next_stage(&self) -> Option<Stage> {
        if self.status.is_done() {
            self.stage.next()
        } else {
            Some(self.stage)
        }
    }

    pub fn decisions_for(&self, stage: Stage) -> impl Iterator<Item = &AIDecision> {
        self.decisions.iter().filter(move |d| d.stage == stage)
    }
}
