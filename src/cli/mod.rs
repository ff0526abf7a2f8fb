pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CheckpointCommand, CliArgs, Commands, DepsArgs, MigrateArgs, ScanArgs};
pub use output::{OutputFormat, OutputFormatter};
