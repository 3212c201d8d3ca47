use std::process::ExitCode;

use cannibal::cli::{AppContext, Cli, Commands};
use cannibal::core::error::SchemaError;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_logging(cli: &Cli) {
    let default = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("CANNIBAL_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    let result = match cli.command {
        Commands::Analyze(args) => cannibal::core::analyze_run(args, &ctx),
        Commands::Init(args) => cannibal::infra::config::init(args, &ctx),
        Commands::Completions(args) => cannibal::completion::run(args, &ctx),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast::<SchemaError>() {
            // Schema problems get the labelled miette rendering
            Ok(schema) => {
                eprintln!("{:?}", miette::Report::new(schema));
                ExitCode::from(2)
            }
            Err(err) => {
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}
