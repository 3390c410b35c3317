//! GEOKALMAN SIM: Replays recorded geolocation fixes through the geographic Kalman filter.
//!
//! The input is a CSV of location fixes (time, position, speed, bearing, and their accuracies,
//! as exported by phone sensor loggers). Each fix is fed to the filter in order; the final
//! estimate is printed and, optionally, every intermediate estimate is written to a CSV.
//!
//! You can configure a replay either by:
//!   1. Loading all parameters from a configuration file (TOML/JSON/YAML)
//!   2. Specifying parameters via command-line flags
//!
//! Synthetic Gaussian noise can be added to a clean track before replay to see how well the
//! filter recovers it.

mod common;

use clap::Parser;
use common::{ensure_parent_dir, init_logger, validate_input_path};
use geokalman::sim::{FixNoise, FixRecord, TrackConfig, degrade_fixes, run_track};
use log::{error, info};
use std::error::Error;
use std::path::PathBuf;

const LONG_ABOUT: &str =
    "GEOKALMAN SIM: Replays recorded geolocation fixes through the geographic Kalman filter.

Each fix in the input CSV is weighed by its reported accuracy and by the time elapsed since the
previous fix. The final position, altitude, speed, direction of travel and horizontal accuracy
are printed when the track is done.

You can configure a replay either by:
  1. Loading all parameters from a configuration file (TOML/JSON/YAML)
  2. Specifying parameters via command-line flags";

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Replays recorded geolocation fixes through a geographic Kalman filter.", long_about = LONG_ABOUT)]
struct Cli {
    /// Input CSV file of location fixes
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV file for the estimate after every fix
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Load the replay configuration from a file (TOML/JSON/YAML).
    /// Filter and noise flags are ignored when this is given.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Expected random walk distance per second (m)
    #[arg(long, default_value_t = 1.0)]
    distance_per_second: f64,

    /// Expected change of speed per second (m/s)
    #[arg(long, default_value_t = 0.1)]
    speed_per_second: f64,

    /// Latitude (deg) used to scale the process noise; defaults to the first fix
    #[arg(long, allow_negative_numbers = true)]
    base_latitude: Option<f64>,

    /// Standard deviation of synthetic horizontal noise added to each fix (m)
    #[arg(long)]
    noise_horizontal: Option<f64>,

    /// Standard deviation of synthetic vertical noise added to each fix (m)
    #[arg(long)]
    noise_vertical: Option<f64>,

    /// Seed for the synthetic noise
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log file path (if not specified, logs to stderr)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Replay configuration from the config file, or from the flags when none is given.
    fn track_config(&self) -> Result<TrackConfig, Box<dyn Error>> {
        if let Some(ref path) = self.config {
            info!("Loading configuration from {}", path.display());
            return Ok(TrackConfig::from_file(path)?);
        }
        let noise = match (self.noise_horizontal, self.noise_vertical) {
            (None, None) => None,
            (horizontal, vertical) => Some(FixNoise {
                horizontal_std_m: horizontal.unwrap_or(0.0),
                vertical_std_m: vertical.unwrap_or(0.0),
                seed: self.seed,
            }),
        };
        Ok(TrackConfig {
            distance_per_second: self.distance_per_second,
            speed_per_second: self.speed_per_second,
            base_latitude: self.base_latitude,
            noise,
            ..Default::default()
        })
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    validate_input_path(&cli.input)?;
    let config = cli.track_config()?;

    let mut records = FixRecord::from_csv(&cli.input)?;
    info!("Read {} fixes from {}", records.len(), cli.input.display());
    if let Some(ref noise) = config.noise {
        info!(
            "Adding synthetic noise: horizontal {} m, vertical {} m, seed {}",
            noise.horizontal_std_m, noise.vertical_std_m, noise.seed
        );
        records = degrade_fixes(&records, noise)?;
    }

    let result = run_track(&records, &config)?;
    if result.skipped > 0 {
        info!("{} fixes were skipped", result.skipped);
    }

    if let Some(ref output) = cli.output {
        ensure_parent_dir(output)?;
        result.to_csv(output)?;
        info!("Wrote {} estimates to {}", result.len(), output.display());
    }

    match result.last() {
        Some(estimate) => {
            println!("Latitude: {:.8}", estimate.latitude);
            println!("Longitude: {:.8}", estimate.longitude);
            println!("Altitude: {:.3}", estimate.altitude);
            println!("Speed: {:.3}", estimate.speed);
            println!("Direction: {:.2}", estimate.direction);
            println!("Horizontal accuracy: {:.3}", estimate.horizontal_accuracy);
        }
        None => println!("No fixes were accepted; no estimate available."),
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_logger(&cli.log_level, cli.log_file.as_ref()) {
        eprintln!("Failed to initialize logger: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}
