use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_ITERATIONS: u64 = 1_000;

#[derive(Parser, Debug)]
#[command(author, version, about = "Deterministic sql-recordset batch simulator")]
pub(crate) struct Args {
    #[arg(long, value_parser = humantime::parse_duration)]
    pub(crate) duration: Option<Duration>,
    #[arg(long)]
    pub(crate) iterations: Option<u64>,
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    #[arg(long, default_value_t = 8)]
    pub(crate) batch_size: usize,
    #[arg(long, default_value_t = 0.05)]
    pub(crate) fault_rate: f64,
    #[arg(long, default_value_t = 0.10)]
    pub(crate) outer_tx_rate: f64,
    #[arg(long)]
    pub(crate) log: Option<PathBuf>,
    #[arg(long)]
    pub(crate) quick: bool,
    #[arg(long)]
    pub(crate) stress: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SimConfig {
    pub(crate) duration_ms: Option<u64>,
    pub(crate) iterations: Option<u64>,
    pub(crate) seed: u64,
    pub(crate) batch_size: usize,
    pub(crate) fault_rate: f64,
    pub(crate) outer_tx_rate: f64,
    pub(crate) log: Option<PathBuf>,
    pub(crate) preset: Option<String>,
    pub(crate) first_steps: usize,
    pub(crate) tail_steps: usize,
}

impl SimConfig {
    pub(crate) fn from_args(args: Args) -> Self {
        let duration_ms = args
            .duration
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        let iterations = match (args.iterations, duration_ms) {
            (None, None) => Some(DEFAULT_ITERATIONS),
            (iterations, _) => iterations,
        };
        let mut config = SimConfig {
            duration_ms,
            iterations,
            seed: args.seed.unwrap_or_else(random_seed),
            batch_size: args.batch_size.max(2),
            fault_rate: clamp_rate(args.fault_rate),
            outer_tx_rate: clamp_rate(args.outer_tx_rate),
            log: args.log,
            preset: None,
            first_steps: 30,
            tail_steps: 80,
        };

        if args.quick {
            config.apply_quick();
        }
        if args.stress {
            config.apply_stress();
        }

        config
    }

    fn apply_quick(&mut self) {
        self.preset = Some("quick".to_string());
        self.iterations = Some(500);
        self.duration_ms = None;
        self.batch_size = 4;
        self.fault_rate = 0.05;
        self.outer_tx_rate = 0.10;
    }

    fn apply_stress(&mut self) {
        self.preset = Some("stress".to_string());
        self.iterations = Some(50_000);
        self.duration_ms = None;
        self.batch_size = 32;
        self.fault_rate = 0.10;
        self.outer_tx_rate = 0.25;
    }
}

fn clamp_rate(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn random_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    now.as_secs() ^ u64::from(now.subsec_nanos())
}
