//! CDM CLI - Command line tool for the Valparaíso drought monitor data.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "cdm-cli",
    version,
    about = "Chile drought monitor data fusion toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: cdm_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    cdm_cmd::run(cli.command).await
}
