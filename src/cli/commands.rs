use crate::checkpoint::Stage;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Stage-based Spring Boot to Go migration with checkpoints
#[derive(Parser, Debug)]
#[command(
    name = "liftbox",
    about = "Stage-based Spring Boot to Go migration with checkpoints",
    version,
    author,
    long_about = "liftbox scans a Spring Boot project, classifies its dependencies and \
                  converts it unit by unit into a Go module through an AI provider. \
                  Progress is checkpointed per stage so an interrupted run can be resumed \
                  or rolled back."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Increase verbosity (can be used multiple times)"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Scan a project and print its descriptor",
        long_about = "Parses the build descriptor and source tree and prints the project \
                      descriptor: build tool, framework, modules, dependencies and the \
                      categorized units.\n\n\
                      Examples:\n  \
                      liftbox scan ./shop\n  \
                      liftbox scan ./shop --format json"
    )]
    Scan(ScanArgs),

    #[command(
        about = "Classify a project's dependencies",
        long_about = "Scans the project and reports which dependencies carry over, which \
                      need a replacement and which are unsupported.\n\n\
                      Examples:\n  \
                      liftbox deps ./shop\n  \
                      liftbox deps ./shop --format yaml"
    )]
    Deps(DepsArgs),

    #[command(
        about = "Migrate a project",
        long_about = "Runs every migration stage, checkpointing after each one.\n\n\
                      Examples:\n  \
                      liftbox migrate ./shop ./shop-go\n  \
                      liftbox migrate ./shop ./shop-go --dry-run\n  \
                      liftbox migrate ./shop ./shop-go --resume\n  \
                      liftbox migrate ./shop ./shop-go --backend ollama --model qwen2.5-coder:14b"
    )]
    Migrate(MigrateArgs),

    #[command(subcommand, about = "Inspect or roll back a checkpointed run")]
    Checkpoint(CheckpointCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    #[arg(value_name = "PATH", help = "Path to the project root")]
    pub source: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long, help = "Also scan src/test/java")]
    pub include_tests: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DepsArgs {
    #[arg(value_name = "PATH", help = "Path to the project root")]
    pub source: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct MigrateArgs {
    #[arg(value_name = "SOURCE", help = "Path to the Spring Boot project")]
    pub source: PathBuf,

    #[arg(value_name = "OUTPUT", help = "Directory for the generated module")]
    pub output: PathBuf,

    #[arg(long, help = "Scan and analyze only; write nothing")]
    pub dry_run: bool,

    #[arg(long, help = "Continue from the last checkpoint")]
    pub resume: bool,

    #[arg(long, help = "Also convert units under src/test/java")]
    pub include_tests: bool,

    #[arg(
        long,
        help = "Stop before converting when high-complexity replacements are not accepted"
    )]
    pub fail_on_blockers: bool,

    #[arg(
        long = "accept",
        value_name = "GROUP:ARTIFACT",
        help = "Accept a high-complexity replacement (repeatable)"
    )]
    pub accept: Vec<String>,

    #[arg(
        short = 'b',
        long,
        value_name = "PROVIDER",
        help = "Provider to use (genai adapter name or openai-compatible); overrides LIFTBOX_PROVIDER"
    )]
    pub backend: Option<String>,

    #[arg(
        short = 'm',
        long,
        value_name = "MODEL",
        help = "Model name to use (provider-specific); overrides LIFTBOX_MODEL"
    )]
    pub model: Option<String>,

    #[arg(
        long = "module",
        value_name = "NAME",
        help = "Go module name for the generated code"
    )]
    pub module: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format for the run summary"
    )]
    pub format: OutputFormatArg,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CheckpointCommand {
    #[command(about = "Show the checkpointed state of a run")]
    Status(CheckpointStatusArgs),

    #[command(about = "Restore the checkpoint to the state after a completed stage")]
    Rollback(CheckpointRollbackArgs),

    #[command(about = "Delete the generated output, the checkpoint and every stage snapshot")]
    Reset(CheckpointResetArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct CheckpointStatusArgs {
    #[arg(value_name = "SOURCE", help = "Path to the migrated project")]
    pub source: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckpointRollbackArgs {
    #[arg(value_name = "SOURCE", help = "Path to the migrated project")]
    pub source: PathBuf,

    #[arg(value_name = "STAGE", help = "Stage to roll back to (e.g. services)")]
    pub stage: Stage,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckpointResetArgs {
    #[arg(value_name = "SOURCE", help = "Path to the migrated project")]
    pub source: PathBuf,

    #[arg(long, help = "Confirm deletion")]
    pub yes: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
