//! # terracov-cli
//!
//! Library side of the `terracov` binary: argument parsing, the scan driver
//! and the summary it prints.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use terracov_coverage::{
    CancelToken, CellCounts, CoverageConfig, CoverageError, ScanProgress, Scanner,
};
use terracov_metrics::{describe_metrics, InMemoryRecorder, MetricsSnapshot};
use terracov_terrain::{load_geotiff_with_water_value, TerrainError};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that abort a CLI run.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Coverage error: {0}")]
    Coverage(#[from] CoverageError),

    #[error("Terrain error: {0}")]
    Terrain(#[from] TerrainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Estimate radio coverage around a transmitter over GeoTIFF terrain.
#[derive(Parser, Debug, Clone)]
#[command(name = "terracov")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Web Mercator elevation GeoTIFF
    pub terrain: PathBuf,

    /// Transmitter longitude (degrees)
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Transmitter latitude (degrees)
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Output path for the coverage grid (JSON)
    #[arg(short, long, default_value = "coverage.json")]
    pub output: PathBuf,

    /// YAML scan configuration; defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the configured worker thread count
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Override the loss budget derived from the link budget (dB)
    #[arg(long)]
    pub max_attenuation_db: Option<f64>,

    /// Elevation value that marks water cells (defaults to the raster nodata value)
    #[arg(long, allow_hyphen_values = true)]
    pub water_value: Option<f32>,
}

impl Args {
    /// Configuration file merged with command-line overrides.
    pub fn coverage_config(&self) -> Result<CoverageConfig> {
        let mut config = match &self.config {
            Some(path) => CoverageConfig::load(path)?,
            None => CoverageConfig::default(),
        };
        if let Some(workers) = self.workers {
            config.scan.workers = Some(workers);
        }
        config.validate()?;
        Ok(config)
    }
}

/// What a run prints once the grid is written.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    /// Where the grid was written.
    pub output: PathBuf,
    /// Transmitter cell in terrain grid coordinates.
    pub transmitter: (i64, i64),
    /// Search radius in cells.
    pub radius_cells: usize,
    /// Loss budget used for classification (dB).
    pub max_attenuation_db: f64,
    /// True when the scan was interrupted.
    pub cancelled: bool,
    /// Cells per state.
    pub counts: CellCounts,
    /// Metrics recorded during the scan.
    pub metrics: MetricsSnapshot,
}

fn log_progress(progress: ScanProgress) {
    info!(
        completed = progress.completed,
        total = progress.total,
        covered = progress.covered,
        "Scan {:.0}% complete",
        progress.fraction() * 100.0
    );
}

/// Load terrain and configuration, scan, and write the grid to `args.output`.
///
/// A cancelled scan still writes the cells evaluated so far.
pub fn run(args: &Args, cancel: CancelToken) -> Result<ScanSummary> {
    let config = args.coverage_config()?;
    let max_attenuation_db = args
        .max_attenuation_db
        .unwrap_or_else(|| config.max_attenuation_db());

    let terrain = load_geotiff_with_water_value(&args.terrain, args.water_value)?;

    let recorder = InMemoryRecorder::new();
    let progress = log_progress;
    let grid = metrics::with_local_recorder(&recorder, || {
        describe_metrics();
        Scanner::new(&terrain, config.propagation_parameters())
            .with_options(config.scan)
            .with_cancel_token(cancel)
            .with_progress(&progress)
            .run((args.lon, args.lat), max_attenuation_db)
    })?;

    let mut writer = BufWriter::new(File::create(&args.output)?);
    serde_json::to_writer(&mut writer, &grid)?;
    writer.flush()?;
    info!(path = %args.output.display(), "Wrote coverage grid");

    if grid.is_cancelled() {
        warn!("Scan was cancelled; the grid is partial");
    }

    Ok(ScanSummary {
        output: args.output.clone(),
        transmitter: grid.transmitter(),
        radius_cells: grid.radius_cells(),
        max_attenuation_db,
        cancelled: grid.is_cancelled(),
        counts: grid.counts(),
        metrics: recorder.snapshot(),
    })
}

/// Cancel `token` on Ctrl-C. Can only be installed once per process.
pub fn cancel_on_ctrl_c(token: &CancelToken) -> Result<()> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, stopping scan");
        token.cancel();
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_negative_coordinates() {
        let args = Args::try_parse_from([
            "terracov",
            "dem.tif",
            "--lon",
            "-5.5",
            "--lat",
            "56.5",
            "--water-value",
            "-32768",
        ])
        .unwrap();
        assert_eq!(args.lon, -5.5);
        assert_eq!(args.lat, 56.5);
        assert_eq!(args.water_value, Some(-32768.0));
        assert_eq!(args.output, PathBuf::from("coverage.json"));
        assert!(args.config.is_none());
    }

    #[test]
    fn test_requires_transmitter() {
        assert!(Args::try_parse_from(["terracov", "dem.tif", "--lon", "1.0"]).is_err());
    }

    #[test]
    fn test_workers_override() {
        let args =
            Args::try_parse_from(["terracov", "dem.tif", "--lon", "0", "--lat", "0", "-w", "3"])
                .unwrap();
        let config = args.coverage_config().unwrap();
        assert_eq!(config.scan.workers, Some(3));

        let args =
            Args::try_parse_from(["terracov", "dem.tif", "--lon", "0", "--lat", "0", "-w", "0"])
                .unwrap();
        assert!(matches!(
            args.coverage_config(),
            Err(CliError::Coverage(err)) if err.is_configuration()
        ));
    }
}
