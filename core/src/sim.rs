//! Replay utilities for recorded and synthetic geolocation tracks.
//!
//! This module provides:
//! - A struct (`FixRecord`) for reading and writing location fixes to/from CSV files
//! - A replay configuration (`TrackConfig`) readable from JSON, YAML, or TOML
//! - `run_track` for feeding a recorded track through a [GeoKalmanFilter]
//! - `TrackResult` for storing and exporting the resulting estimates
//! - `degrade_fixes` for injecting seeded Gaussian noise into a clean track
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use chrono::DateTime;
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::NavigationFilter;
use crate::earth::{meters_per_degree_latitude, meters_per_degree_longitude};
use crate::error::{FilterError, Result};
use crate::geo::{GeoEstimate, GeoKalmanFilter, GeoObservation, GeoProcessNoise};

/// Timestamp format of the `time` column: YYYY-MM-DD hh:mm:ss+UTCTZ
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

/// Struct representing a single location fix from a CSV file.
///
/// Column names follow the location export of the [Sensor Logger](https://www.tszheichoi.com/sensorlogger)
/// app, so its recordings can be replayed directly.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FixRecord {
    /// Date-time string: YYYY-MM-DD hh:mm:ss+UTCTZ
    pub time: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude in meters
    pub altitude: f64,
    /// Speed in m/s
    pub speed: f64,
    /// Direction of travel in degrees clockwise from north
    pub bearing: f64,
    /// accuracy of the speed in m/s
    #[serde(rename = "speedAccuracy")]
    pub speed_accuracy: f64,
    /// accuracy of the bearing in degrees
    #[serde(rename = "bearingAccuracy")]
    pub bearing_accuracy: f64,
    /// accuracy of the horizontal position in meters
    #[serde(rename = "horizontalAccuracy")]
    pub horizontal_accuracy: f64,
    /// accuracy of the altitude in meters
    #[serde(rename = "verticalAccuracy")]
    pub vertical_accuracy: f64,
}

impl FixRecord {
    /// Reads a CSV file and returns a vector of `FixRecord` structs.
    ///
    /// # Example
    ///
    /// ```
    /// use geokalman::sim::FixRecord;
    ///
    /// let records = FixRecord::from_csv("./data/fixes.csv").expect("Failed to read fixes");
    /// assert_eq!(records.len(), 5);
    /// ```
    pub fn from_csv<P: AsRef<Path>>(path: P) -> std::result::Result<Vec<Self>, Box<dyn std::error::Error>> {
        let mut rdr = csv::Reader::from_path(path)?;
        let mut records = Vec::new();
        for result in rdr.deserialize() {
            let record: Self = result?;
            records.push(record);
        }
        Ok(records)
    }
    /// Writes a slice of `FixRecord` structs to a CSV file.
    pub fn to_csv<P: AsRef<Path>>(records: &[Self], path: P) -> io::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl From<&FixRecord> for GeoObservation {
    fn from(record: &FixRecord) -> Self {
        GeoObservation {
            latitude: record.latitude,
            longitude: record.longitude,
            altitude: record.altitude,
            speed: record.speed,
            speed_accuracy: record.speed_accuracy,
            direction: record.bearing,
            direction_accuracy: record.bearing_accuracy,
            horizontal_accuracy: record.horizontal_accuracy,
            vertical_accuracy: record.vertical_accuracy,
        }
    }
}

/// Seconds between two timestamps in [TIME_FORMAT], at millisecond resolution.
///
/// Returns `None` if either timestamp cannot be parsed.
pub fn elapsed_seconds(previous: &str, current: &str) -> Option<f64> {
    match (
        DateTime::parse_from_str(previous, TIME_FORMAT),
        DateTime::parse_from_str(current, TIME_FORMAT),
    ) {
        (Ok(prev), Ok(curr)) => Some((curr - prev).num_milliseconds() as f64 / 1000.0),
        _ => None,
    }
}

/// Synthetic degradation applied to a clean track before replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FixNoise {
    /// Standard deviation of the horizontal position noise, meters, drawn independently north
    /// and east
    pub horizontal_std_m: f64,
    /// Standard deviation of the altitude noise, meters
    pub vertical_std_m: f64,
    /// Seed for the random number generator
    #[serde(default)]
    pub seed: u64,
}

fn default_distance_per_second() -> f64 {
    1.0
}
fn default_speed_per_second() -> f64 {
    0.1
}
fn default_time_step() -> f64 {
    1.0
}

/// Configuration for replaying a track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    /// Expected random walk distance per second, meters
    #[serde(default = "default_distance_per_second")]
    pub distance_per_second: f64,
    /// Expected change of speed per second, meters per second
    #[serde(default = "default_speed_per_second")]
    pub speed_per_second: f64,
    /// Latitude used to convert the process noise to degrees; `None` uses the first fix
    #[serde(default)]
    pub base_latitude: Option<f64>,
    /// Time step, seconds, used when consecutive timestamps cannot be parsed
    #[serde(default = "default_time_step")]
    pub default_time_step: f64,
    /// Optional synthetic noise applied to the fixes before replay
    #[serde(default)]
    pub noise: Option<FixNoise>,
}

impl Default for TrackConfig {
    fn default() -> Self {
        TrackConfig {
            distance_per_second: default_distance_per_second(),
            speed_per_second: default_speed_per_second(),
            base_latitude: None,
            default_time_step: default_time_step(),
            noise: None,
        }
    }
}

impl TrackConfig {
    /// Process noise for a track whose first fix is at `first_latitude`.
    pub fn process_noise(&self, first_latitude: f64) -> GeoProcessNoise {
        GeoProcessNoise {
            base_latitude: self.base_latitude.unwrap_or(first_latitude),
            distance_per_second: self.distance_per_second,
            speed_per_second: self.speed_per_second,
        }
    }
    /// Write the configuration to a JSON file (pretty-printed).
    pub fn to_json<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self).map_err(io::Error::other)
    }
    /// Read the configuration from a JSON file.
    pub fn from_json<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        serde_json::from_reader(file).map_err(io::Error::other)
    }
    /// Write the configuration as YAML.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        let s = serde_yaml::to_string(self).map_err(io::Error::other)?;
        file.write_all(s.as_bytes())
    }
    /// Read the configuration from YAML.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        serde_yaml::from_reader(file).map_err(io::Error::other)
    }
    /// Write the configuration as TOML.
    pub fn to_toml<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        let s = toml::to_string(self).map_err(io::Error::other)?;
        file.write_all(s.as_bytes())
    }
    /// Read the configuration from TOML.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut s = String::new();
        let mut file = File::open(path)?;
        file.read_to_string(&mut s)?;
        toml::from_str(&s).map_err(io::Error::other)
    }
    /// Generic write: choose format by file extension (.json/.yaml/.yml/.toml)
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let p = path.as_ref();
        match extension(p).as_deref() {
            Some("json") => self.to_json(p),
            Some("yaml") | Some("yml") => self.to_yaml(p),
            Some("toml") => self.to_toml(p),
            _ => Err(unsupported_extension()),
        }
    }
    /// Generic read: choose format by file extension (.json/.yaml/.yml/.toml)
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let p = path.as_ref();
        match extension(p).as_deref() {
            Some("json") => Self::from_json(p),
            Some("yaml") | Some("yml") => Self::from_yaml(p),
            Some("toml") => Self::from_toml(p),
            _ => Err(unsupported_extension()),
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}
fn unsupported_extension() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "unsupported file extension")
}

/// Estimates produced by replaying a track, one per accepted fix.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackResult {
    /// Name or identifier for this solution
    pub name: String,
    /// Timestamp of each accepted fix
    pub timestamps: Vec<String>,
    /// Estimate after each accepted fix
    pub estimates: Vec<GeoEstimate>,
    /// Number of fixes rejected by the filter
    pub skipped: usize,
}

impl TrackResult {
    /// Creates a new, empty TrackResult.
    pub fn new(name: &str) -> Self {
        TrackResult {
            name: name.to_string(),
            ..Default::default()
        }
    }
    /// The estimate after the last accepted fix.
    pub fn last(&self) -> Option<&GeoEstimate> {
        self.estimates.last()
    }
    pub fn len(&self) -> usize {
        self.estimates.len()
    }
    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }
    /// Writes the estimates to a CSV file, one row per accepted fix.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        writeln!(
            file,
            "time,lat_deg,lon_deg,alt_m,speed_mps,direction_deg,horizontal_accuracy_m"
        )?;
        for (timestamp, estimate) in self.timestamps.iter().zip(&self.estimates) {
            writeln!(
                file,
                "{},{:.8},{:.8},{:.4},{:.6},{:.4},{:.4}",
                timestamp,
                estimate.latitude,
                estimate.longitude,
                estimate.altitude,
                estimate.speed,
                estimate.direction,
                estimate.horizontal_accuracy
            )?;
        }
        Ok(())
    }
}

/// Replay a track through a [GeoKalmanFilter].
///
/// The first fix is observed with a zero time step; every later fix with the time elapsed since
/// the last fix the filter accepted, or `config.default_time_step` when a timestamp does not
/// parse. Fixes the filter rejects as singular are skipped and counted.
///
/// # Errors
/// Only filter construction errors are returned.
pub fn run_track(records: &[FixRecord], config: &TrackConfig) -> Result<TrackResult> {
    let mut result = TrackResult::new("Geo Kalman Filter");
    let Some(first) = records.first() else {
        return Ok(result);
    };
    let mut filter = GeoKalmanFilter::new(&config.process_noise(first.latitude))?;
    result.timestamps.reserve(records.len());
    result.estimates.reserve(records.len());

    let mut last_accepted: Option<&str> = None;
    for (i, record) in records.iter().enumerate() {
        let dt = match last_accepted {
            None => 0.0,
            Some(prev) => {
                elapsed_seconds(prev, &record.time).unwrap_or(config.default_time_step)
            }
        };
        match filter.observe(dt, &GeoObservation::from(record)) {
            Ok(()) => {}
            Err(FilterError::SingularMatrix) => {
                warn!("skipping fix {} at {}: singular update", i, record.time);
                result.skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        }
        last_accepted = Some(record.time.as_str());
        if let Some(estimate) = filter.estimate() {
            result.timestamps.push(record.time.clone());
            result.estimates.push(estimate);
        }
    }
    info!(
        "replayed {} fixes: {} accepted, {} skipped",
        records.len(),
        result.len(),
        result.skipped
    );
    Ok(result)
}

/// Add seeded Gaussian noise to the positions of a track.
///
/// Horizontal noise is drawn in meters north and east and converted to degrees at the fix's
/// latitude; vertical noise is added to the altitude. The reported accuracies are inflated by
/// root-sum-square with the injected standard deviations. The same seed always produces the
/// same output.
pub fn degrade_fixes(records: &[FixRecord], noise: &FixNoise) -> io::Result<Vec<FixRecord>> {
    let horizontal = normal(noise.horizontal_std_m)?;
    let vertical = normal(noise.vertical_std_m)?;
    let mut rng = StdRng::seed_from_u64(noise.seed);
    let degraded = records
        .iter()
        .map(|record| {
            let north = horizontal.sample(&mut rng);
            let east = horizontal.sample(&mut rng);
            let up = vertical.sample(&mut rng);
            FixRecord {
                latitude: record.latitude + north / meters_per_degree_latitude(record.latitude),
                longitude: record.longitude + east / meters_per_degree_longitude(record.latitude),
                altitude: record.altitude + up,
                horizontal_accuracy: record.horizontal_accuracy.hypot(noise.horizontal_std_m),
                vertical_accuracy: record.vertical_accuracy.hypot(noise.vertical_std_m),
                ..record.clone()
            }
        })
        .collect();
    Ok(degraded)
}

fn normal(std_dev: f64) -> io::Result<Normal<f64>> {
    if std_dev.is_nan() || std_dev < 0.0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("noise standard deviation must be non-negative, got {std_dev}"),
        ));
    }
    Normal::new(0.0, std_dev).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}
