//! # terracov-coverage
//!
//! Radio coverage around a transmitter over terrain.
//!
//! A scan bounds its search with the free-space distance at the link budget's
//! loss limit, then classifies every cell of the square window around the
//! transmitter:
//!
//! - cells within a short-range cutoff (4 cells by default) are covered
//!   without running the model
//! - every other cell gets a terrain profile from the transmitter, and the
//!   irregular terrain model decides whether its loss is within budget
//! - cells that cannot be evaluated are marked failed; the scan carries on
//!
//! Rows of the window are classified in parallel with `rayon`. Scans can be
//! cancelled between cells through a [`CancelToken`], and report progress
//! through an optional callback.
//!
//! ## Example
//!
//! ```
//! use terracov_coverage::{scan, CellState, LinkBudget};
//! use terracov_itm::PropagationParameters;
//! use terracov_terrain::{GridTransform, TerrainGrid};
//!
//! let transform = GridTransform::from_lon_lat(-5.5, 56.5, 100.0)?;
//! let terrain = TerrainGrid::new(21, 21, transform);
//! let transmitter = transform.cell_to_lon_lat(10, 10);
//!
//! let budget = LinkBudget::default();
//! let grid = scan(
//!     &terrain,
//!     transmitter,
//!     budget.max_attenuation_db(),
//!     &PropagationParameters::default(),
//!     600,
//! )?;
//! assert_eq!(grid.state(10, 11), Some(CellState::Covered));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod budget;
mod config;
mod error;
mod grid;
mod profile;
mod scan;

pub use budget::{search_radius_cells, search_radius_m, LinkBudget};
pub use config::CoverageConfig;
pub use error::CoverageError;
pub use grid::{CellCounts, CellState, CoverageCell, CoverageGrid};
pub use profile::{sample_count, ProfileSampler, PROFILE_STEP_M};
pub use scan::{scan, CancelToken, ProgressCallback, ScanOptions, ScanProgress, Scanner};

/// Result type for coverage operations.
pub type Result<T> = std::result::Result<T, CoverageError>;
