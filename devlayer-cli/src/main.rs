//! ## devlayer-cli
//! **Host frontend for the device layer**
//! Replays scenario files through the dispatch pipeline, runs the host
//! event loop and prints the effective configuration.

use clap::Parser;
use devlayer_telemetry::EventLogger;

mod commands;
mod scenario;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    EventLogger::init_with_level(&config.telemetry.log_level);

    commands::run_command(cli.command, config).await
}
