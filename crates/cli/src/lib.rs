pub mod commands;
pub mod presentation;
pub mod terminal;

use std::process::ExitCode;

use carfinder_core::config::{LogFormat, LoggingConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::search::SearchArgs;

#[derive(Debug, Parser)]
#[command(
    name = "carfinder",
    about = "Carfinder used-car assistant",
    long_about = "Chat your way to a used car, or operate the catalog behind it.",
    after_help = "Examples:\n  carfinder migrate\n  carfinder seed --count 200\n  \
                  carfinder chat\n  carfinder search --make honda --price-max 30000"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive conversation that ends in a catalog search")]
    Chat,
    #[command(about = "Run one catalog query from flags and print the listing")]
    Search(SearchArgs),
    #[command(about = "Insert randomly generated vehicles into the catalog")]
    Seed {
        #[arg(long, default_value_t = carfinder_db::fixtures::DEFAULT_SEED_COUNT)]
        count: usize,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Chat => commands::chat::run(),
        Command::Search(args) => commands::search::run(args),
        Command::Seed { count } => commands::seed::run(count),
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber. Events go to stderr so they never mix with
/// the conversation or the JSON command payloads on stdout.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // A second install (tests, repeated commands) keeps the first subscriber.
    let _ = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
