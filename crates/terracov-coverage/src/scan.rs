//! Coverage scan around a single transmitter.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use terracov_itm::{PathAnalysis, PropagationParameters};
use terracov_metrics::metric_defs;
use terracov_terrain::TerrainAccessor;
use tracing::{debug, info, trace, warn};

use crate::budget::{search_radius_cells, search_radius_m};
use crate::grid::{CellCounts, CoverageCell, CoverageGrid};
use crate::profile::ProfileSampler;
use crate::{CoverageError, Result};

/// Tunable parameters of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanOptions {
    /// Upper bound on profile samples per cell (the model accepts at most 600).
    pub max_profile_samples: usize,
    /// Cells within this Euclidean cell distance of the transmitter are
    /// covered without running the model.
    pub short_range_cells: f64,
    /// Time availability percentile for the model loss.
    pub reliability_pct: f64,
    /// Location/situation confidence percentile for the model loss.
    pub confidence_pct: f64,
    /// Worker threads; `None` uses the global rayon pool.
    pub workers: Option<usize>,
    /// Cells between progress callbacks.
    pub progress_interval: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_profile_samples: 600,
            short_range_cells: 4.0,
            reliability_pct: 50.0,
            confidence_pct: 50.0,
            workers: None,
            progress_interval: 1_000,
        }
    }
}

impl ScanOptions {
    /// Check every option against its documented range.
    pub fn validate(&self) -> Result<()> {
        if self.max_profile_samples < 2 {
            return Err(CoverageError::Configuration(format!(
                "max_profile_samples must be at least 2, got {}",
                self.max_profile_samples
            )));
        }
        if !(self.short_range_cells.is_finite() && self.short_range_cells >= 0.0) {
            return Err(CoverageError::Configuration(format!(
                "short_range_cells must be a finite value >= 0, got {}",
                self.short_range_cells
            )));
        }
        for (name, pct) in [
            ("reliability_pct", self.reliability_pct),
            ("confidence_pct", self.confidence_pct),
        ] {
            if !(pct > 0.0 && pct < 100.0) {
                return Err(CoverageError::Configuration(format!(
                    "{name} must satisfy 0 < {name} < 100, got {pct}"
                )));
            }
        }
        if self.workers == Some(0) {
            return Err(CoverageError::Configuration(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Cooperative cancellation flag shared between a scan and its controller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Scans stop before their next cell.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True once [`cancel`](Self::cancel) has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Snapshot passed to progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanProgress {
    /// Cells evaluated so far.
    pub completed: usize,
    /// Cells in the scan window.
    pub total: usize,
    /// Covered cells so far.
    pub covered: usize,
}

impl ScanProgress {
    /// Completed share of the window, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Progress callback invoked from worker threads.
pub type ProgressCallback<'a> = &'a (dyn Fn(ScanProgress) + Sync);

#[derive(Debug, Default)]
struct ScanCounters {
    completed: AtomicUsize,
    covered: AtomicUsize,
    out_of_range: AtomicUsize,
    last_report: AtomicUsize,
}

/// Classifies every cell in the square around a transmitter.
///
/// ```
/// use terracov_coverage::{ScanOptions, Scanner};
/// use terracov_itm::PropagationParameters;
/// use terracov_terrain::{GridTransform, TerrainGrid};
///
/// let transform = GridTransform::from_lon_lat(-5.5, 56.5, 100.0)?;
/// let terrain = TerrainGrid::new(21, 21, transform);
/// let (lon, lat) = transform.cell_to_lon_lat(10, 10);
///
/// let grid = Scanner::new(&terrain, PropagationParameters::default())
///     .with_options(ScanOptions { workers: Some(2), ..Default::default() })
///     .run((lon, lat), 100.0)?;
/// assert_eq!(grid.transmitter(), (10, 10));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Scanner<'a, T: TerrainAccessor + ?Sized> {
    terrain: &'a T,
    params: PropagationParameters,
    options: ScanOptions,
    cancel: CancelToken,
    progress: Option<ProgressCallback<'a>>,
}

impl<'a, T: TerrainAccessor + ?Sized> Scanner<'a, T> {
    /// Scanner over `terrain` with default options.
    pub fn new(terrain: &'a T, params: PropagationParameters) -> Self {
        Self {
            terrain,
            params,
            options: ScanOptions::default(),
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    /// Replace the scan options.
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Stop early when `token` is cancelled.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Report progress every `progress_interval` cells.
    pub fn with_progress(mut self, callback: ProgressCallback<'a>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Scan around the transmitter at `transmitter` (longitude, latitude),
    /// classifying cells against `max_attenuation_db`.
    ///
    /// Fails before scanning on invalid parameters, or when the transmitter
    /// has no backing terrain. Individual cells that cannot be evaluated are
    /// marked [`CellState::Failed`](crate::CellState::Failed).
    pub fn run(&self, transmitter: (f64, f64), max_attenuation_db: f64) -> Result<CoverageGrid> {
        let start = Instant::now();
        self.params.validate()?;
        self.options.validate()?;
        if !max_attenuation_db.is_finite() {
            return Err(CoverageError::Configuration(format!(
                "max attenuation must be finite, got {max_attenuation_db}"
            )));
        }

        let (lon, lat) = transmitter;
        let tx = self.terrain.coords_to_grid(lon, lat)?;
        if !self.terrain.exists(tx.0, tx.1) {
            return Err(CoverageError::OutOfBounds { y: tx.0, x: tx.1 });
        }

        let cell_size_m = self.terrain.cell_size_m();
        if !(cell_size_m.is_finite() && cell_size_m > 0.0) {
            return Err(CoverageError::Configuration(format!(
                "terrain cell size must be positive, got {cell_size_m}"
            )));
        }

        let (height, width) = self.terrain.extent();
        let max_cells = height.max(width);
        let radius_m = search_radius_m(max_attenuation_db, self.params.frequency_mhz);
        // The window always spans the short-range cutoff.
        let cutoff_cells = (self.options.short_range_cells.floor() as usize).min(max_cells);
        let radius_cells = search_radius_cells(radius_m, cell_size_m, max_cells).max(cutoff_cells);

        let r = radius_cells as i64;
        let y0 = (tx.0 - r).max(0);
        let y1 = (tx.0 + r).min(height as i64 - 1);
        let x0 = (tx.1 - r).max(0);
        let x1 = (tx.1 + r).min(width as i64 - 1);
        let window_height = (y1 - y0 + 1) as usize;
        let window_width = (x1 - x0 + 1) as usize;

        info!(
            tx_y = tx.0,
            tx_x = tx.1,
            max_attenuation_db,
            radius_m,
            radius_cells,
            cells = window_height * window_width,
            "Starting coverage scan"
        );

        let mut grid = CoverageGrid::new(
            tx,
            (y0, x0),
            window_height,
            window_width,
            radius_cells,
            max_attenuation_db,
        );

        let sampler = ProfileSampler::new(self.terrain, self.options.max_profile_samples);
        let counters = ScanCounters::default();
        let total = window_height * window_width;
        let sampler = &sampler;
        let counters_ref = &counters;
        let cells = grid.cells_mut();

        // Each worker owns whole rows of the window.
        let mut scan_rows = move || {
            cells
                .par_chunks_mut(window_width)
                .enumerate()
                .for_each(|(row, row_cells)| {
                    let y = y0 + row as i64;
                    self.scan_row(
                        tx,
                        y,
                        x0,
                        row_cells,
                        max_attenuation_db,
                        sampler,
                        counters_ref,
                        total,
                    );
                });
        };

        match self.options.workers {
            Some(workers) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()
                    .map_err(|e| CoverageError::Configuration(format!("worker pool: {e}")))?;
                pool.install(scan_rows);
            }
            None => scan_rows(),
        }

        let counts = grid.counts();
        let cancelled = self.cancel.is_cancelled() && counts.unvisited > 0;
        grid.set_cancelled(cancelled);

        let out_of_range = counters.out_of_range.load(Ordering::Relaxed);
        if out_of_range > 0 {
            warn!(
                cells = out_of_range,
                "Cells evaluated below the model's minimum path length"
            );
        }

        let elapsed = start.elapsed();
        if cancelled {
            debug!(visited = counts.visited(), unvisited = counts.unvisited, "Coverage scan cancelled");
        }
        info!(
            covered = counts.covered,
            short_range = counts.short_range,
            not_covered = counts.not_covered,
            failed = counts.failed,
            unvisited = counts.unvisited,
            elapsed_ms = elapsed.as_millis() as u64,
            "Coverage scan finished"
        );
        record_metrics(&grid, &counts, elapsed, cancelled);

        Ok(grid)
    }

    #[allow(clippy::too_many_arguments)]
    fn scan_row(
        &self,
        tx: (i64, i64),
        y: i64,
        x0: i64,
        row_cells: &mut [CoverageCell],
        max_attenuation_db: f64,
        sampler: &ProfileSampler<'_, T>,
        counters: &ScanCounters,
        total: usize,
    ) {
        for (col, cell) in row_cells.iter_mut().enumerate() {
            if self.cancel.is_cancelled() {
                return;
            }
            let rx = (y, x0 + col as i64);
            *cell = self.evaluate_cell(tx, rx, max_attenuation_db, sampler, counters);
            if cell.state == crate::CellState::Covered {
                counters.covered.fetch_add(1, Ordering::Relaxed);
            }
            let completed = counters.completed.fetch_add(1, Ordering::AcqRel) + 1;
            self.report_progress(counters, completed, total);
        }
        debug!(row = y, "Scanned row");
    }

    fn evaluate_cell(
        &self,
        tx: (i64, i64),
        rx: (i64, i64),
        max_attenuation_db: f64,
        sampler: &ProfileSampler<'_, T>,
        counters: &ScanCounters,
    ) -> CoverageCell {
        let dy = (rx.0 - tx.0) as f64;
        let dx = (rx.1 - tx.1) as f64;
        if dy.hypot(dx) <= self.options.short_range_cells {
            return CoverageCell::SHORT_RANGE;
        }

        let loss = sampler
            .profile(tx, rx)
            .and_then(|profile| {
                let analysis = PathAnalysis::new(&profile, &self.params)?;
                if analysis.warnings().is_out_of_range() {
                    counters.out_of_range.fetch_add(1, Ordering::Relaxed);
                }
                Ok(analysis.loss_db(self.options.reliability_pct, self.options.confidence_pct)?)
            });

        match loss {
            Ok(loss_db) => {
                trace!(y = rx.0, x = rx.1, loss_db, "Evaluated cell");
                CoverageCell::from_attenuation(loss_db, max_attenuation_db)
            }
            Err(err) => {
                trace!(y = rx.0, x = rx.1, error = %err, "Cell evaluation failed");
                CoverageCell::FAILED
            }
        }
    }

    fn report_progress(&self, counters: &ScanCounters, completed: usize, total: usize) {
        let Some(callback) = self.progress else {
            return;
        };
        let progress = ScanProgress {
            completed,
            total,
            covered: counters.covered.load(Ordering::Relaxed),
        };
        // The worker finishing the window always reports.
        if completed == total {
            counters.last_report.store(total, Ordering::Relaxed);
            callback(progress);
            return;
        }

        let interval = self.options.progress_interval.max(1);
        let last = counters.last_report.load(Ordering::Relaxed);
        if completed < last + interval {
            return;
        }
        // Only one worker reports each step.
        if counters
            .last_report
            .compare_exchange(last, completed, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            callback(progress);
        }
    }
}

fn record_metrics(grid: &CoverageGrid, counts: &CellCounts, elapsed: Duration, cancelled: bool) {
    use metric_defs::*;

    let outcomes = [
        (OUTCOME_COVERED, counts.covered - counts.short_range),
        (OUTCOME_SHORT_RANGE, counts.short_range),
        (OUTCOME_NOT_COVERED, counts.not_covered),
        (OUTCOME_FAILED, counts.failed),
    ];
    for (outcome, cells) in outcomes {
        metrics::counter!(SCAN_CELLS.name, OUTCOME_LABEL => outcome).increment(cells as u64);
    }

    metrics::gauge!(SCAN_RADIUS_CELLS.name).set(grid.radius_cells() as f64);

    let attenuation = metrics::histogram!(SCAN_ATTENUATION.name);
    for loss_db in grid.attenuations() {
        attenuation.record(loss_db);
    }

    metrics::histogram!(SCAN_DURATION.name).record(elapsed.as_secs_f64() * 1_000.0);
    if cancelled {
        metrics::counter!(SCAN_CANCELLED.name).increment(1);
    }
}

/// Scan with default options apart from the profile sample cap.
pub fn scan<T: TerrainAccessor + ?Sized>(
    terrain: &T,
    transmitter: (f64, f64),
    max_attenuation_db: f64,
    params: &PropagationParameters,
    max_profile_samples: usize,
) -> Result<CoverageGrid> {
    let options = ScanOptions {
        max_profile_samples,
        ..Default::default()
    };
    Scanner::new(terrain, *params)
        .with_options(options)
        .run(transmitter, max_attenuation_db)
}
