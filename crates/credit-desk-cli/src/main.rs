mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::analysis::AnalysisArgs;
use commands::decide::DecideArgs;
use commands::import::ImportArgs;
use commands::search::SearchArgs;
use commands::serve::ServeArgs;
use commands::simulate::SimulateArgs;
use commands::suggestion::SuggestionArgs;
use credit_desk_core::config::{DeskConfig, CONFIG_ENV};

const DEFAULT_LOG_FILTER: &str = "credit_desk=info,tower_http=info";

/// Credit analysis desk: company analyses, credit suggestions and decisions
#[derive(Parser)]
#[command(
    name = "credesk",
    version,
    about = "Credit analysis desk",
    long_about = "Serve the credit analysis dashboard API, or work with the same \
                  store from the command line: import companies, search, fetch or \
                  regenerate analyses and suggestions, record decisions and run \
                  loan simulations."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// YAML configuration file
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dashboard HTTP API
    Serve(ServeArgs),
    /// Simulate a fixed-installment loan
    Simulate(SimulateArgs),
    /// Import or update companies from CSV or JSON
    Import(ImportArgs),
    /// Search companies by name or id
    Search(SearchArgs),
    /// Show a company's credit analysis (generated on first use)
    Analysis(AnalysisArgs),
    /// Show a company's credit suggestion (generated on first use)
    Suggestion(SuggestionArgs),
    /// Record an approval or rejection
    Decide(DecideArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("credesk {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    init_tracing();

    let config = match DeskConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Serve(args) => commands::serve::run_serve(args, config).await,
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Import(args) => commands::import::run_import(args, &config).await,
        Commands::Search(args) => commands::search::run_search(args, &config).await,
        Commands::Analysis(args) => commands::analysis::run_analysis(args, &config).await,
        Commands::Suggestion(args) => commands::suggestion::run_suggestion(args, &config).await,
        Commands::Decide(args) => commands::decide::run_decide(args, &config).await,
        Commands::Version => Ok(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })),
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
