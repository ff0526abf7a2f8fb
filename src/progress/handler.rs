//! Progress handler trait and events

use crate::checkpoint::{Stage, TokenUsage};
use std::path::PathBuf;
use std::time::Duration;

/// Events emitted while a migration runs
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    RunStarted {
        source: PathBuf,
        output: PathBuf,
        resume: bool,
        dry_run: bool,
    },

    /// A checkpoint from an earlier run exists but resume was not requested
    StaleCheckpoint { path: PathBuf },

    /// Resuming a checkpointed run at `from`
    Resumed { from: Stage },

    StageStarted { stage: Stage },

    StageSkipped { stage: Stage, reason: String },

    StageCompleted {
        stage: Stage,
        total: usize,
        converted: usize,
        skipped: usize,
        dropped: usize,
        duration: Duration,
    },

    StageFailed { stage: Stage, error: String },

    UnitStarted {
        stage: Stage,
        unit: String,
        index: usize,
        total: usize,
    },

    UnitConverted {
        stage: Stage,
        unit: String,
        files: usize,
        requires_review: bool,
    },

    /// Per-unit failure; the stage continues
    UnitSkipped {
        stage: Stage,
        unit: String,
        error: String,
    },

    /// The provider reported the unit does not belong to the category
    UnitDropped {
        stage: Stage,
        unit: String,
        reason: String,
    },

    /// One provider call was accounted into the checkpoint
    ProviderCall {
        stage: Stage,
        unit: String,
        usage: TokenUsage,
        cost: f64,
        truncated: bool,
    },

    /// Unaccepted high-complexity dependency replacements
    Blockers { keys: Vec<String> },

    DryRunComplete { summary: String },

    RunCompleted {
        total_time: Duration,
        usage: TokenUsage,
        cost: f64,
    },

    RunFailed { error: String, resumable: bool },
}

/// Receives progress events from the migrator
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        let handler = NoOpHandler;
        handler.on_progress(&ProgressEvent::StageStarted {
            stage: Stage::Discovery,
        });
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::RunStarted {
            source: PathBuf::from("/src"),
            output: PathBuf::from("/out"),
            resume: false,
            dry_run: false,
        });
        handler.on_progress(&ProgressEvent::StageStarted {
            stage: Stage::Entities,
        });
        handler.on_progress(&ProgressEvent::RunCompleted {
            total_time: Duration::from_secs(5),
            usage: TokenUsage::default(),
            cost: 0.0,
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_event_debug() {
        let event = ProgressEvent::Resumed {
            from: Stage::Services,
        };
        let debug_str = format!("{:?}", event);
        assert!(debug_str.contains("Resumed"));
        assert!(debug_str.contains("Services"));
    }
}
