//! **cannibal** - Search term cannibalization analyzer for advertising reports
//!
//! Finds search terms that convert in more than one campaign / ad group and
//! decides, per term, which placement keeps it and which ones should negate it.
//! The decision trades sales volume against ROAS with two tunable knobs.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Core pipeline - normalize, aggregate, detect, decide
pub mod core {
    /// Error taxonomy (schema and parameter errors)
    pub mod error;
    pub use error::{ParamError, SchemaError};

    /// Metric coercion and match type classification
    pub mod normalize;
    pub use normalize::{MatchType, PerformanceRecord};

    /// Per-placement metric sums and derived ratios
    pub mod aggregate;
    pub use aggregate::{AggregatedRow, Totals};

    /// Search terms converting in more than one placement
    pub mod detect;
    pub use detect::CannibalGroup;

    /// Keep/negate decision rule
    pub mod winner;
    pub use winner::{Action, Decision, Reason, SelectionParams, TieBreak};

    /// End-to-end run and account summary
    pub mod analyze;
    pub use analyze::{Analysis, AnalysisSummary, run as analyze_run};
}

/// Infrastructure - Configuration, report I/O, column discovery and rendering
pub mod infra {
    /// Layered configuration (file + environment)
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Header substring matching into canonical columns
    pub mod columns;
    pub use columns::{ColumnMap, ColumnPatterns};

    /// Report reading (memory-mapped above 1 MiB) and output writing
    pub mod io;
    pub use io::{Report, read_report};

    /// Text, table, JSON and CSV renderers
    pub mod render;
    pub use render::{RenderOptions, render};
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands, OutputFormat};
pub use core::{Analysis, SelectionParams, analyze_run};
pub use infra::{Config, load_config};
