mod args;
mod backend;
mod driver;
mod generation;
mod logging;
mod model;
mod oracle;

use std::process::ExitCode;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::Level;

use crate::args::{Args, SimConfig};
use crate::logging::LogWriter;

fn init_tracing(config: &SimConfig) -> std::io::Result<()> {
    let writer = LogWriter::new(config.log.as_deref())?;
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(false)
        .with_max_level(Level::INFO)
        .init();
    Ok(())
}

fn main() -> ExitCode {
    let config = SimConfig::from_args(Args::parse());
    if let Err(err) = init_tracing(&config) {
        eprintln!("failed to open log file: {err}");
        return ExitCode::FAILURE;
    }

    match serde_json::to_string(&config) {
        Ok(json) => tracing::info!("config: {json}"),
        Err(err) => tracing::warn!("config not serializable: {err}"),
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    match driver::run(&config, &mut rng) {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => {
            tracing::error!("reproduce with --seed {}", config.seed);
            ExitCode::FAILURE
        }
    }
}
