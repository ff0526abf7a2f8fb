//! Checkpoint persistence across store instances, as seen by a resumed process

use liftbox::checkpoint::{AIDecision, StageOutput, CHECKPOINT_FILE_NAME};
use liftbox::{CheckpointError, CheckpointStore, Stage, Status, TokenUsage};
use std::fs;
use tempfile::TempDir;

fn conversion(files: &[&str]) -> StageOutput {
    StageOutput::Conversion {
        total: files.len(),
        converted: files.len(),
        skipped: 0,
        dropped: 0,
        files: files.iter().map(|f| f.to_string()).collect(),
        review_required: vec![],
    }
}

#[test]
fn test_progress_survives_a_new_store() {
    let source = TempDir::new().unwrap();
    let output = source.path().join("out");

    {
        let mut store = CheckpointStore::for_source(source.path());
        store.initialize(source.path(), &output).unwrap();
        store.start_stage(Stage::Discovery).unwrap();
        store.complete_stage(Stage::Discovery, None).unwrap();
        store.start_stage(Stage::Dependencies).unwrap();
        store.complete_stage(Stage::Dependencies, None).unwrap();
        store.start_stage(Stage::Entities).unwrap();
        store
            .add_decision(
                AIDecision::new(
                    Stage::Entities,
                    "src/main/java/com/acme/Order.java",
                    "convert",
                    TokenUsage::new(120, 80),
                )
                .with_prompt("Convert Order")
                .with_response("{\"name\":\"order.go\"}"),
            )
            .unwrap();
        store.update_cost(0.25).unwrap();
        store.update_cost(-1.0).unwrap();
        store
            .complete_stage(Stage::Entities, Some(conversion(&["internal/domain/order.go"])))
            .unwrap();
    }

    let mut resumed = CheckpointStore::for_source(source.path());
    let checkpoint = resumed.load().unwrap().unwrap();

    assert_eq!(checkpoint.stage, Stage::Entities);
    assert_eq!(checkpoint.status, Status::Completed);
    assert_eq!(checkpoint.next_stage(), Some(Stage::Repositories));
    assert_eq!(checkpoint.output_path, output);
    assert_eq!(checkpoint.decisions.len(), 1);
    assert_eq!(checkpoint.decisions_for(Stage::Entities).count(), 1);
    assert_eq!(checkpoint.usage, TokenUsage::new(120, 80));
    assert!((checkpoint.estimated_cost - 0.25).abs() < f64::EPSILON);
    assert_eq!(
        checkpoint.data.get(&Stage::Entities),
        Some(&conversion(&["internal/domain/order.go"]))
    );

    assert_eq!(
        CheckpointStore::list_snapshots(resumed.dir()).unwrap(),
        vec![Stage::Discovery, Stage::Dependencies, Stage::Entities]
    );
}

#[test]
fn test_failed_stage_is_retried_on_resume() {
    let source = TempDir::new().unwrap();
    let mut store = CheckpointStore::for_source(source.path());
    store.initialize(source.path(), &source.path().join("out")).unwrap();
    store.start_stage(Stage::Services).unwrap();
    store.fail_stage(Stage::Services, "provider unavailable").unwrap();

    let checkpoint = CheckpointStore::for_source(source.path())
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(checkpoint.status, Status::Failed);
    assert_eq!(checkpoint.errors, vec!["provider unavailable".to_string()]);
    assert_eq!(checkpoint.next_stage(), Some(Stage::Services));

    // starting the stage again clears the recorded errors
    store.start_stage(Stage::Services).unwrap();
    assert!(store.checkpoint().unwrap().errors.is_empty());
}

#[test]
fn test_skipped_stage_moves_resume_forward() {
    let source = TempDir::new().unwrap();
    let mut store = CheckpointStore::for_source(source.path());
    store.initialize(source.path(), &source.path().join("out")).unwrap();
    store.skip_stage(Stage::Jobs).unwrap();

    assert_eq!(store.next_stage(), Some(Stage::Events));
}

#[test]
fn test_finished_run_has_no_next_stage() {
    let source = TempDir::new().unwrap();
    let mut store = CheckpointStore::for_source(source.path());
    assert_eq!(store.next_stage(), Some(Stage::Discovery));

    store.initialize(source.path(), &source.path().join("out")).unwrap();
    store.start_stage(Stage::FinalAssembly).unwrap();
    store.complete_stage(Stage::FinalAssembly, None).unwrap();
    assert_eq!(store.next_stage(), None);
}

#[test]
fn test_rollback_restores_earlier_stage() {
    let source = TempDir::new().unwrap();
    let mut store = CheckpointStore::for_source(source.path());
    store.initialize(source.path(), &source.path().join("out")).unwrap();
    for stage in [Stage::Discovery, Stage::Dependencies, Stage::Entities] {
        store.start_stage(stage).unwrap();
        store.complete_stage(stage, None).unwrap();
    }

    let restored = CheckpointStore::rollback_to_stage(store.dir(), Stage::Dependencies).unwrap();
    assert_eq!(restored.stage, Stage::Dependencies);
    assert_eq!(restored.status, Status::Completed);

    let reloaded = CheckpointStore::for_source(source.path())
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.next_stage(), Some(Stage::Entities));

    let err = CheckpointStore::rollback_to_stage(store.dir(), Stage::Controllers).unwrap_err();
    assert!(matches!(
        err,
        CheckpointError::SnapshotNotFound {
            stage: Stage::Controllers,
            ..
        }
    ));
}

#[test]
fn test_rollback_all_removes_output_and_checkpoint() {
    let source = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let output_path = output.path().join("shop-go");
    fs::create_dir_all(output_path.join("internal")).unwrap();
    fs::write(output_path.join("go.mod"), "module shop\n").unwrap();

    let mut store = CheckpointStore::for_source(source.path());
    store.initialize(source.path(), &output_path).unwrap();

    CheckpointStore::rollback_all(store.dir()).unwrap();
    assert!(!output_path.exists());
    assert!(!store.dir().exists());
    assert!(source.path().exists());

    let err = CheckpointStore::rollback_all(store.dir()).unwrap_err();
    assert!(matches!(err, CheckpointError::NotFound(_)));
}

#[test]
fn test_rollback_all_refuses_output_containing_source() {
    let parent = TempDir::new().unwrap();
    let source = parent.path().join("shop");
    fs::create_dir_all(&source).unwrap();

    let mut store = CheckpointStore::for_source(&source);
    store.initialize(&source, parent.path()).unwrap();

    let err = CheckpointStore::rollback_all(store.dir()).unwrap_err();
    assert!(matches!(err, CheckpointError::UnsafeOutputPath(_)));
    assert!(source.exists());
    assert!(store.exists());
}

#[test]
fn test_newer_schema_version_is_rejected() {
    let source = TempDir::new().unwrap();
    let mut store = CheckpointStore::for_source(source.path());
    store.initialize(source.path(), &source.path().join("out")).unwrap();

    let path = store.dir().join(CHECKPOINT_FILE_NAME);
    let mut value: serde_json::Value =
        serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    value["schema_version"] = serde_json::json!(99);
    fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

    let err = CheckpointStore::for_source(source.path()).load().unwrap_err();
    assert!(matches!(
        err,
        CheckpointError::UnsupportedVersion { found: 99, .. }
    ));
}

#[test]
fn test_corrupt_checkpoint_is_a_serialization_error() {
    let source = TempDir::new().unwrap();
    let mut store = CheckpointStore::for_source(source.path());
    store.initialize(source.path(), &source.path().join("out")).unwrap();
    fs::write(store.primary_path(), "{ not json").unwrap();

    let err = CheckpointStore::for_source(source.path()).load().unwrap_err();
    assert!(matches!(err, CheckpointError::Serialization { .. }));
}

#[test]
fn test_cleanup_removes_directory() {
    let source = TempDir::new().unwrap();
    let mut store = CheckpointStore::for_source(source.path());
    store.initialize(source.path(), &source.path().join("out")).unwrap();

    store.cleanup().unwrap();
    assert!(!store.dir().exists());
    assert!(store.checkpoint().is_none());
    assert!(CheckpointStore::for_source(source.path())
        .load()
        .unwrap()
        .is_none());
}
