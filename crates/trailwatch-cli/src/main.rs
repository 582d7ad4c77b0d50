mod cmd;
mod output;
mod settings;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::num::NonZeroU32;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "trailwatch",
    about = "Scheduled CloudTrail threat detection: query Athena, alert via SNS",
    version,
    propagate_version = true
)]
struct Cli {
    /// YAML configuration file (environment variables override its values)
    #[arg(long, global = true, env = "TRAILWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one detection: query, wait, alert on findings
    Run {
        /// Trailing window to search, in minutes
        #[arg(long)]
        lookback_minutes: Option<NonZeroU32>,
    },

    /// Print the detection query without submitting it
    Query {
        /// Trailing window to search, in minutes
        #[arg(long)]
        lookback_minutes: Option<NonZeroU32>,
    },

    /// List the suspicious actions and their ATT&CK techniques
    Catalogue,

    /// Inspect the resolved configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run { lookback_minutes } => cmd::run::run(config_path, lookback_minutes),
        Commands::Query { lookback_minutes } => {
            cmd::query::run(config_path, lookback_minutes, cli.json)
        }
        Commands::Catalogue => cmd::catalogue::run(config_path, cli.json),
        Commands::Config { subcommand } => cmd::config::run(config_path, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
