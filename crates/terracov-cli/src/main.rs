//! `terracov`: radio coverage around a transmitter over GeoTIFF terrain.
//!
//! ```bash
//! terracov dem.tif --lon -5.5 --lat 56.5 --config scan.yaml -o coverage.json
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`). Ctrl-C stops the scan
//! between cells; the partial grid is still written.

use std::process::ExitCode;

use clap::Parser;
use terracov_cli::{cancel_on_ctrl_c, run, Args};
use terracov_coverage::CancelToken;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let cancel = CancelToken::new();
    if let Err(e) = cancel_on_ctrl_c(&cancel) {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    match run(&args, cancel) {
        Ok(summary) => {
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{json}"),
                Err(e) => error!("Failed to format summary: {e}"),
            }
            if summary.cancelled {
                ExitCode::from(130)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
