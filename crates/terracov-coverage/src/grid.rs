//! Per-cell scan results.

use serde::{Deserialize, Serialize};

/// Classification of one grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    /// Not evaluated (scan cancelled before reaching the cell).
    #[default]
    Unvisited,
    /// Loss within the link budget, or inside the short-range cutoff.
    Covered,
    /// Loss above the link budget.
    NotCovered,
    /// The cell could not be evaluated.
    Failed,
}

/// Result stored for one grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageCell {
    /// Classification.
    pub state: CellState,
    /// Basic transmission loss from the model (dB). `None` when the model
    /// was not run for this cell.
    pub attenuation_db: Option<f64>,
}

impl CoverageCell {
    /// Covered without a model evaluation.
    pub const SHORT_RANGE: Self = Self {
        state: CellState::Covered,
        attenuation_db: None,
    };

    /// Evaluation failed.
    pub const FAILED: Self = Self {
        state: CellState::Failed,
        attenuation_db: None,
    };

    /// Classify a model result against a loss budget.
    pub fn from_attenuation(attenuation_db: f64, max_attenuation_db: f64) -> Self {
        let state = if attenuation_db <= max_attenuation_db {
            CellState::Covered
        } else {
            CellState::NotCovered
        };
        Self {
            state,
            attenuation_db: Some(attenuation_db),
        }
    }

    /// Covered by the short-range rule.
    pub fn is_short_range(&self) -> bool {
        self.state == CellState::Covered && self.attenuation_db.is_none()
    }
}

/// Number of cells per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CellCounts {
    /// Cells never evaluated.
    pub unvisited: usize,
    /// Covered cells, short-range cells included.
    pub covered: usize,
    /// Covered cells that skipped the model.
    pub short_range: usize,
    /// Cells above the loss budget.
    pub not_covered: usize,
    /// Cells whose evaluation failed.
    pub failed: usize,
}

impl CellCounts {
    /// Cells that were evaluated.
    pub fn visited(&self) -> usize {
        self.covered + self.not_covered + self.failed
    }
}

/// Scan result over the square window around a transmitter.
///
/// Cells are addressed by terrain grid coordinates; the window's upper-left
/// cell is [`origin`](Self::origin). Storage is row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageGrid {
    transmitter: (i64, i64),
    origin: (i64, i64),
    height: usize,
    width: usize,
    radius_cells: usize,
    max_attenuation_db: f64,
    cancelled: bool,
    cells: Vec<CoverageCell>,
}

impl CoverageGrid {
    /// Unvisited window of `height` x `width` cells starting at `origin`.
    pub fn new(
        transmitter: (i64, i64),
        origin: (i64, i64),
        height: usize,
        width: usize,
        radius_cells: usize,
        max_attenuation_db: f64,
    ) -> Self {
        Self {
            transmitter,
            origin,
            height,
            width,
            radius_cells,
            max_attenuation_db,
            cancelled: false,
            cells: vec![CoverageCell::default(); height * width],
        }
    }

    /// Transmitter cell in terrain grid coordinates.
    pub fn transmitter(&self) -> (i64, i64) {
        self.transmitter
    }

    /// Upper-left cell of the window in terrain grid coordinates.
    pub fn origin(&self) -> (i64, i64) {
        self.origin
    }

    /// Window size as `(height, width)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Search radius in cells.
    pub fn radius_cells(&self) -> usize {
        self.radius_cells
    }

    /// Loss budget the cells were classified against (dB).
    pub fn max_attenuation_db(&self) -> f64 {
        self.max_attenuation_db
    }

    /// True when the scan stopped before visiting every cell.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub(crate) fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }

    /// True when (`y`, `x`) lies inside the window.
    pub fn contains(&self, y: i64, x: i64) -> bool {
        self.index(y, x).is_some()
    }

    fn index(&self, y: i64, x: i64) -> Option<usize> {
        let row = usize::try_from(y - self.origin.0).ok()?;
        let col = usize::try_from(x - self.origin.1).ok()?;
        (row < self.height && col < self.width).then_some(row * self.width + col)
    }

    /// Result for terrain cell (`y`, `x`), or `None` outside the window.
    pub fn cell(&self, y: i64, x: i64) -> Option<&CoverageCell> {
        self.index(y, x).map(|i| &self.cells[i])
    }

    /// State of terrain cell (`y`, `x`), or `None` outside the window.
    pub fn state(&self, y: i64, x: i64) -> Option<CellState> {
        self.cell(y, x).map(|c| c.state)
    }

    /// Model loss for terrain cell (`y`, `x`), when the model was run.
    pub fn attenuation_db(&self, y: i64, x: i64) -> Option<f64> {
        self.cell(y, x).and_then(|c| c.attenuation_db)
    }

    /// Every cell as `(y, x, state)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, i64, CellState)> + '_ {
        self.cells.iter().enumerate().map(move |(i, cell)| {
            let y = self.origin.0 + (i / self.width) as i64;
            let x = self.origin.1 + (i % self.width) as i64;
            (y, x, cell.state)
        })
    }

    /// Cells per state.
    pub fn counts(&self) -> CellCounts {
        let mut counts = CellCounts::default();
        for cell in &self.cells {
            match cell.state {
                CellState::Unvisited => counts.unvisited += 1,
                CellState::Covered => {
                    counts.covered += 1;
                    if cell.is_short_range() {
                        counts.short_range += 1;
                    }
                }
                CellState::NotCovered => counts.not_covered += 1,
                CellState::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// Model losses of every evaluated cell, row-major.
    pub fn attenuations(&self) -> impl Iterator<Item = f64> + '_ {
        self.cells.iter().filter_map(|c| c.attenuation_db)
    }

    /// Row-major cell storage for workers; each chunk of `width` cells is one row.
    pub(crate) fn cells_mut(&mut self) -> &mut [CoverageCell] {
        &mut self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addressing_uses_terrain_coordinates() {
        let mut grid = CoverageGrid::new((12, 22), (10, 20), 5, 5, 2, 100.0);
        assert!(grid.contains(10, 20));
        assert!(grid.contains(14, 24));
        assert!(!grid.contains(15, 20));
        assert!(!grid.contains(9, 20));
        assert_eq!(grid.state(12, 22), Some(CellState::Unvisited));
        assert_eq!(grid.state(0, 0), None);

        grid.cells_mut()[1] = CoverageCell::from_attenuation(90.0, 100.0);
        assert_eq!(grid.state(10, 21), Some(CellState::Covered));
        assert_eq!(grid.attenuation_db(10, 21), Some(90.0));
    }

    #[test]
    fn test_classification_threshold_inclusive() {
        assert_eq!(CoverageCell::from_attenuation(100.0, 100.0).state, CellState::Covered);
        assert_eq!(
            CoverageCell::from_attenuation(100.1, 100.0).state,
            CellState::NotCovered
        );
        assert!(CoverageCell::SHORT_RANGE.is_short_range());
        assert!(!CoverageCell::from_attenuation(50.0, 100.0).is_short_range());
    }

    #[test]
    fn test_counts_and_iter() {
        let mut grid = CoverageGrid::new((1, 1), (0, 0), 2, 3, 1, 100.0);
        {
            let cells = grid.cells_mut();
            cells[0] = CoverageCell::SHORT_RANGE;
            cells[1] = CoverageCell::from_attenuation(80.0, 100.0);
            cells[2] = CoverageCell::from_attenuation(120.0, 100.0);
            cells[3] = CoverageCell::FAILED;
        }

        let counts = grid.counts();
        assert_eq!(counts.covered, 2);
        assert_eq!(counts.short_range, 1);
        assert_eq!(counts.not_covered, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.unvisited, 2);
        assert_eq!(counts.visited(), 4);

        let cells: Vec<_> = grid.iter().collect();
        assert_eq!(cells[2], (0, 2, CellState::NotCovered));
        assert_eq!(cells[3], (1, 0, CellState::Failed));
        assert_eq!(grid.attenuations().collect::<Vec<_>>(), vec![80.0, 120.0]);
    }

    #[test]
    fn test_serializes() {
        let mut grid = CoverageGrid::new((0, 0), (0, 0), 1, 2, 1, 100.0);
        grid.cells_mut()[0] = CoverageCell::SHORT_RANGE;
        let json = serde_json::to_string(&grid).unwrap();
        assert!(json.contains("\"covered\""));
        assert!(json.contains("\"unvisited\""));

        let back: CoverageGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
    }
}
