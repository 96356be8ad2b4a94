//! Command implementations for the drought monitor CLI.
//!
//! Builds the dashboard bundle, shows the reporting window for a date
//! and syncs monthly index files into the data directory.

use cdm_utils::dates::{format_date, parse_date, reporting_month};
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use log::info;
use std::path::{Path, PathBuf};

pub mod config;
pub mod report;
pub mod sync;

use config::{Config, DEFAULT_CONFIG_PATH};

#[derive(Subcommand)]
pub enum Command {
    /// Fetch, merge and aggregate drought data into the dashboard bundle
    Bundle {
        /// Path to the TOML configuration
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Output path for the bundle JSON (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reporting date as YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Print the bulletin month reported on a date
    Window {
        /// Date as YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Copy new or updated index files into the data directory
    SyncIndices {
        /// Path to the TOML configuration
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

fn resolve_date(date: Option<&str>) -> anyhow::Result<NaiveDate> {
    match date {
        Some(s) => parse_date(s),
        None => Ok(Local::now().naive_local().date()),
    }
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Bundle {
            config,
            output,
            date,
        } => {
            let config = Config::load(&config)?;
            let today = resolve_date(date.as_deref())?;
            let bundle = report::build_bundle(&config, &today).await;
            write_json(&bundle, output.as_deref())?;
            if !bundle.is_success() {
                anyhow::bail!("bundle build failed");
            }
            Ok(())
        }
        Command::Window { date } => {
            let today = resolve_date(date.as_deref())?;
            println!("{} -> {}", format_date(&today), reporting_month(&today));
            Ok(())
        }
        Command::SyncIndices { config } => {
            let config = Config::load(&config)?;
            sync::run_sync(&config.sync.families)?;
            Ok(())
        }
    }
}

fn write_json<T: serde::Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
