pub mod cleaning;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod predictor;
pub mod server;
pub mod training;
pub mod utils;

use std::process::ExitCode;

use clap::Parser;

use cli::Cli;
use config::{PipelineConfig, CONFIG_FILE_NAME};

fn execute(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.root.join(CONFIG_FILE_NAME));
    let config = PipelineConfig::load(Some(&config_path), &cli.root)?;
    cli::commands::dispatch(cli.command, config, &config_path)
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    utils::logging::init(cli.verbose);

    log::debug!("quaketrend starting with root {}", cli.root.display());

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
