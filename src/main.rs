use anyhow::Result;
use clap::{Parser, Subcommand};
use seedfar::cli::{self, SearchArgs};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seedfar")]
#[command(version = "0.1.0")]
#[command(about = "Ambiguity- and indel-tolerant seed search of short reads against references", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash reads and report candidate seed positions on references
    Search(SearchArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let Commands::Search(args) = cli.command;
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::run(args)
}
