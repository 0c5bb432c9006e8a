use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "modfence")]
#[command(about = "Verify module boundaries in hierarchical codebases")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Project path (defaults to current directory)
    /// Used when no subcommand is specified for backward compatibility
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run boundary verification and emit the report (default behavior)
    Verify(VerifyArgs),

    /// Print the detected module tree with interfaces and grants
    Tree(TreeArgs),

    /// Generate a starter .modfence.toml configuration file
    Init(InitArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct VerifyArgs {
    /// Project path (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Snapshot file produced by the indexer (defaults to modfence.units.json)
    #[arg(short, long)]
    pub snapshot: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "markdown")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Detection strategy (direct-children, explicitly-annotated, or a custom id)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Suppress the report; print only the summary line
    #[arg(short, long)]
    pub quiet: bool,
}

impl Default for VerifyArgs {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            snapshot: None,
            format: OutputFormat::Markdown,
            output: None,
            strategy: None,
            quiet: false,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct TreeArgs {
    /// Project path (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Snapshot file produced by the indexer (defaults to modfence.units.json)
    #[arg(short, long)]
    pub snapshot: Option<PathBuf>,

    /// Detection strategy (direct-children, explicitly-annotated, or a custom id)
    #[arg(long)]
    pub strategy: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Path where to create .modfence.toml (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}
