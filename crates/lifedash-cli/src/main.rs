//! lifedash CLI - Life expectancy dashboard in the terminal

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Explore life expectancy by income group, region and year.
#[derive(Parser)]
#[command(name = "lifedash")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter (e.g. info, debug, lifedash=trace)
    #[arg(long, global = true, default_value = "info", env = "LIFEDASH_LOG")]
    log_level: String,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print dataset statistics and narrative insights
    Summary {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Run one recompute pass and write all views as JSON
    Snapshot {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        filters: commands::FilterArgs,

        /// Output JSON file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the missing-data table
    Missing {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Year bucket (all years if omitted)
        #[arg(long)]
        year: Option<i32>,
    },

    /// Play through every year, one line per tick
    Play {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Tick period in milliseconds (overrides the config)
        #[arg(long)]
        period_ms: Option<u64>,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Summary { input } => commands::summary::run(input, config).await,
        Commands::Snapshot { input, filters, output } => {
            commands::snapshot::run(input, config, filters, output).await
        }
        Commands::Missing { input, year } => commands::missing::run(input, config, year).await,
        Commands::Play { input, period_ms } => commands::play::run(input, config, period_ms).await,
    }
}
