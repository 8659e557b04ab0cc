mod cli;
mod commands;
mod logging;

use cli::{Cli, Commands};
use commands::{cache, fetch, merge};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    logging::init(cli.verbose);
    match &cli.command {
        Commands::Fetch(args) => fetch::run(&cli, args).await,
        Commands::Merge(args) => merge::run(&cli, args).await,
        Commands::Cache(command) => cache::run(&cli, command),
    }
}
