use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::winner::TieBreak;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "cannibal")]
#[command(
    about = "Find search terms that convert in more than one ad group and decide which placement keeps them"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without executing
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Log debug details to stderr (overridden by CANNIBAL_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a search term report for cannibalized terms
    Analyze(AnalyzeArgs),

    /// Initialize a cannibal.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Grouped, human-readable listing
    Text,
    /// Boxed table
    Table,
    /// Single JSON document with params, summary and decisions
    Json,
    /// One CSV line per decision
    Csv,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Search term report (CSV, tab-separated for .tsv/.txt, or an .xlsx/.xls/.ods workbook)
    #[arg(value_name = "REPORT")]
    pub report: PathBuf,

    /// ROAS improvement (%) a ROAS leader needs to beat the sales leader
    #[arg(long, value_parser = clap::value_parser!(u32).range(30..=200))]
    pub threshold: Option<u32>,

    /// Orders a ROAS leader needs before it can win on efficiency
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub min_orders: Option<u32>,

    /// How ties on sales or ROAS are broken
    #[arg(long, value_enum)]
    pub tie_break: Option<TieBreak>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write output to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file (defaults to cannibal.toml in the working directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Include every aggregated row in JSON output
    #[arg(long)]
    pub all_rows: bool,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
