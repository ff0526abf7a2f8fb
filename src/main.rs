use liftbox::cli::commands::{CliArgs, Commands};
use liftbox::cli::handlers::{handle_checkpoint, handle_deps, handle_migrate, handle_scan};
use liftbox::util::logging::{init_logging, parse_level, LoggingConfig};
use liftbox::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("liftbox v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Scan(scan_args) => handle_scan(scan_args),
        Commands::Deps(deps_args) => handle_deps(deps_args),
        Commands::Migrate(migrate_args) => handle_migrate(migrate_args, args.quiet).await,
        Commands::Checkpoint(command) => handle_checkpoint(command),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("LIFTBOX_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    };

    let use_json = env::var("LIFTBOX_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    init_logging(LoggingConfig {
        level,
        use_json,
        ..LoggingConfig::default()
    });
}
