//! Command handlers
//!
//! Each handler returns the process exit code; the binary only dispatches.

use super::commands::{
    CheckpointCommand, CheckpointResetArgs, CheckpointRollbackArgs, CheckpointStatusArgs,
    DepsArgs, MigrateArgs, ScanArgs,
};
use super::output::{CheckpointStatus, OutputFormatter};
use crate::checkpoint::CheckpointStore;
use crate::config::{LiftboxConfig, ProviderKind};
use crate::dependencies::DependencyClassifier;
use crate::pipeline::{MigrationConfig, MigrationError, Migrator};
use crate::scanner::Scanner;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
/// The run stopped but left a checkpoint that `--resume` can continue
pub const EXIT_RESUMABLE: i32 = 2;
pub const EXIT_CANCELLED: i32 = 130;

pub fn handle_scan(args: &ScanArgs) -> i32 {
    info!(source = %args.source.display(), "Scanning project");

    let scanner = Scanner::new().with_include_tests(args.include_tests);
    let descriptor = match scanner.scan(&args.source) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            error!("Scan failed: {}", e);
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };

    let formatter = OutputFormatter::new(args.format.into());
    print_or_fail(formatter.format_descriptor(&descriptor))
}

pub fn handle_deps(args: &DepsArgs) -> i32 {
    info!(source = %args.source.display(), "Classifying dependencies");

    let descriptor = match Scanner::new().scan(&args.source) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            error!("Scan failed: {}", e);
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };
    let report = DependencyClassifier::with_defaults().analyze(&descriptor.dependencies);

    let formatter = OutputFormatter::new(args.format.into());
    let code = print_or_fail(formatter.format_dependencies(&report));
    if code == EXIT_SUCCESS && report.has_blockers() {
        warn!(
            blockers = report.blockers().len(),
            "High-complexity replacements need --accept before migrating with --fail-on-blockers"
        );
    }
    code
}

pub async fn handle_migrate(args: &MigrateArgs, quiet: bool) -> i32 {
    let mut liftbox_config = LiftboxConfig::default();
    if let Some(backend) = &args.backend {
        match ProviderKind::parse(backend) {
            Ok(provider) => {
                liftbox_config = liftbox_config.with_provider(provider, args.model.clone());
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return EXIT_FAILURE;
            }
        }
    } else if let Some(model) = &args.model {
        liftbox_config.model = model.clone();
    }

    if let Err(e) = liftbox_config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("Error: {}", e);
        return EXIT_FAILURE;
    }
    debug!("{}", liftbox_config);

    let client = match liftbox_config.create_client() {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create provider client: {}", e);
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };

    let mut config = MigrationConfig::new(&args.source, &args.output)
        .with_dry_run(args.dry_run)
        .with_resume(args.resume)
        .with_include_tests(args.include_tests)
        .with_fail_on_blockers(args.fail_on_blockers)
        .with_accepted_replacements(args.accept.clone())
        .with_budget(liftbox_config.budget())
        .with_pricing(liftbox_config.pricing);
    if let Some(module) = &args.module {
        config = config.with_target_module(module.clone());
    }

    info!(
        provider = %liftbox_config.provider,
        model = %liftbox_config.model,
        "Starting migration"
    );

    let cancel = CancellationToken::new();
    let watcher = spawn_interrupt_watcher(cancel.clone());
    let migrator = Migrator::new(config, client).with_cancellation(cancel);
    let result = migrator.run().await;
    watcher.abort();

    match result {
        Ok(summary) => {
            if quiet {
                return EXIT_SUCCESS;
            }
            let formatter = OutputFormatter::new(args.format.into());
            print_or_fail(formatter.format_summary(&summary))
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_code_for(&e)
        }
    }
}

pub fn handle_checkpoint(command: &CheckpointCommand) -> i32 {
    match command {
        CheckpointCommand::Status(args) => checkpoint_status(args),
        CheckpointCommand::Rollback(args) => checkpoint_rollback(args),
        CheckpointCommand::Reset(args) => checkpoint_reset(args),
    }
}

fn checkpoint_status(args: &CheckpointStatusArgs) -> i32 {
    let mut store = CheckpointStore::for_source(&args.source);
    let checkpoint = match store.load() {
        Ok(Some(checkpoint)) => checkpoint,
        Ok(None) => {
            eprintln!("No checkpoint found in {}", store.dir().display());
            return EXIT_FAILURE;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };

    let snapshots = match CheckpointStore::list_snapshots(store.dir()) {
        Ok(snapshots) => snapshots,
        Err(e) => {
            warn!("Failed to list snapshots: {}", e);
            Vec::new()
        }
    };

    let formatter = OutputFormatter::new(args.format.into());
    print_or_fail(formatter.format_checkpoint(&CheckpointStatus::new(&checkpoint, &snapshots)))
}

fn checkpoint_rollback(args: &CheckpointRollbackArgs) -> i32 {
    let dir = checkpoint_dir(&args.source);
    match CheckpointStore::rollback_to_stage(&dir, args.stage) {
        Ok(checkpoint) => {
            let next = checkpoint
                .next_stage()
                .map(|s| s.name())
                .unwrap_or("(finished)");
            println!(
                "Rolled back to {}; --resume continues with {}",
                args.stage.name(),
                next
            );
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    }
}

fn checkpoint_reset(args: &CheckpointResetArgs) -> i32 {
    let dir = checkpoint_dir(&args.source);
    if !args.yes {
        eprintln!("Refusing to delete {} without --yes", dir.display());
        return EXIT_FAILURE;
    }
    match CheckpointStore::rollback_all(&dir) {
        Ok(()) => {
            println!("Removed checkpoint data in {}", dir.display());
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    }
}

fn checkpoint_dir(source: &Path) -> std::path::PathBuf {
    CheckpointStore::for_source(source).dir().to_path_buf()
}

/// Cancels the token on Ctrl-C so the current stage can stop between units
fn spawn_interrupt_watcher(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => {
                        warn!("Interrupt received, stopping after the current unit");
                        cancel.cancel();
                    }
                    Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
                }
            }
            _ = cancel.cancelled() => {}
        }
    })
}

pub fn exit_code_for(error: &MigrationError) -> i32 {
    match error {
        MigrationError::Cancelled { .. } => EXIT_CANCELLED,
        e if e.is_resumable() => EXIT_RESUMABLE,
        _ => EXIT_FAILURE,
    }
}

fn print_or_fail(output: anyhow::Result<String>) -> i32 {
    match output {
        Ok(text) => {
            println!("{}", text.trim_end());
            EXIT_SUCCESS
        }
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    }
}
