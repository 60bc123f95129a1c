use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tv_organizer_core::analysis::DeletionMode;
use tv_organizer_core::resolver::ConfidenceLevel;

#[derive(Debug, Parser)]
#[command(name = "tv-organizer")]
#[command(about = "Find duplicate TV episodes and put loose ones where they belong", long_about = None)]
pub struct Cli {
    /// TV directories to use instead of the configured list
    #[arg(long, num_args = 1.., global = true)]
    pub directories: Option<Vec<String>>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan for duplicate episodes and report them
    Duplicates(DuplicatesArgs),
    /// Remove duplicate episodes behind safety checks and confirmation
    Delete(DeleteArgs),
    /// Work out where loose episodes should live, optionally moving them
    Resolve(ResolveArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct DuplicatesArgs {
    /// Skip the false-positive filter and report every identity collision
    #[arg(long)]
    pub basic: bool,

    /// Minimum confidence (0.0 - 1.0) for enhanced groups
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Only report shows whose name contains this text
    #[arg(long)]
    pub show: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[arg(long, value_enum, default_value_t = ModeArg::DryRun)]
    pub mode: ModeArg,

    /// Skip interactive confirmation
    #[arg(long)]
    pub force: bool,

    /// Ask before every file
    #[arg(long)]
    pub confirm_each: bool,

    /// Minimum confidence (0.0 - 1.0) for groups to delete from
    #[arg(long)]
    pub min_confidence: Option<f64>,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Lowest confidence level to include when executing moves
    #[arg(long, value_enum, default_value_t = LevelArg::Medium)]
    pub min_confidence: LevelArg,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Move the files after confirmation
    #[arg(long)]
    pub execute: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    DryRun,
    Trash,
    Permanent,
}

impl From<ModeArg> for DeletionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::DryRun => DeletionMode::DryRun,
            ModeArg::Trash => DeletionMode::Trash,
            ModeArg::Permanent => DeletionMode::Permanent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    High,
    Medium,
    Low,
    Uncertain,
}

impl From<LevelArg> for ConfidenceLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::High => ConfidenceLevel::High,
            LevelArg::Medium => ConfidenceLevel::Medium,
            LevelArg::Low => ConfidenceLevel::Low,
            LevelArg::Uncertain => ConfidenceLevel::Uncertain,
        }
    }
}
