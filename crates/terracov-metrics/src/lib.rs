//! Metrics infrastructure for terrain coverage scans.
//!
//! This crate describes every metric the coverage scanner records. It re-exports the
//! `metrics` crate for convenience and defines each metric as a structured [`Metric`]
//! constant to avoid typos and carry its metadata.
//!
//! # Example
//!
//! ```rust
//! use terracov_metrics::{describe_metrics, metric_defs};
//!
//! // Register metric descriptions at startup
//! describe_metrics();
//!
//! metrics::counter!(
//!     metric_defs::SCAN_CELLS.name,
//!     metric_defs::OUTCOME_LABEL => "covered"
//! )
//! .increment(1);
//! ```
//!
//! # Declaring a metric
//!
//! ```rust
//! use terracov_metrics::{Metric, MetricKind};
//! use metrics::Unit;
//!
//! const PROFILES: Metric = Metric::counter("terracov.profiles")
//!     .with_description("Terrain profiles sampled")
//!     .with_unit(Unit::Count)
//!     .with_labels(&["outcome"]);
//!
//! assert_eq!(PROFILES.kind, MetricKind::Counter);
//! ```
//!
//! Without an installed recorder every metric call is a no-op. [`InMemoryRecorder`]
//! collects values in-process for summaries and tests.

mod recorder;

pub use metrics;
pub use recorder::{HistogramSummary, InMemoryRecorder, MetricsSnapshot};

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// How a metric aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Running total.
    Counter,
    /// Last value wins.
    Gauge,
    /// Every sample kept for distribution summaries.
    Histogram,
}

/// Name, kind and description of one scan metric, declared as a `const`.
#[derive(Debug, Clone)]
pub struct Metric {
    /// Dotted name, e.g. `terracov.scan.cells`.
    pub name: &'static str,
    pub kind: MetricKind,
    pub description: &'static str,
    pub unit: Option<Unit>,
    /// Label keys the metric is recorded with.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn declare(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    pub const fn counter(name: &'static str) -> Self {
        Self::declare(name, MetricKind::Counter)
    }

    pub const fn gauge(name: &'static str) -> Self {
        Self::declare(name, MetricKind::Gauge)
    }

    pub const fn histogram(name: &'static str) -> Self {
        Self::declare(name, MetricKind::Histogram)
    }

    pub const fn with_description(self, description: &'static str) -> Self {
        Self {
            description,
            ..self
        }
    }

    pub const fn with_unit(self, unit: Unit) -> Self {
        Self {
            unit: Some(unit),
            ..self
        }
    }

    pub const fn with_labels(self, labels: &'static [&'static str]) -> Self {
        Self { labels, ..self }
    }

    /// Hand the description (and unit, when set) to the installed recorder.
    pub fn describe(&self) {
        let (name, text) = (self.name, self.description);
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => describe_counter!(name, unit, text),
            (MetricKind::Counter, None) => describe_counter!(name, text),
            (MetricKind::Gauge, Some(unit)) => describe_gauge!(name, unit, text),
            (MetricKind::Gauge, None) => describe_gauge!(name, text),
            (MetricKind::Histogram, Some(unit)) => describe_histogram!(name, unit, text),
            (MetricKind::Histogram, None) => describe_histogram!(name, text),
        }
    }
}

/// All metric definitions for coverage scans.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Label key carrying the classification of a scanned cell.
    pub const OUTCOME_LABEL: &str = "outcome";

    /// Cells classified covered by the propagation model.
    pub const OUTCOME_COVERED: &str = "covered";
    /// Cells classified not covered by the propagation model.
    pub const OUTCOME_NOT_COVERED: &str = "not_covered";
    /// Cells whose evaluation failed.
    pub const OUTCOME_FAILED: &str = "failed";
    /// Cells covered by the short-range rule without a model run.
    pub const OUTCOME_SHORT_RANGE: &str = "short_range";

    /// Scanned cells by outcome.
    ///
    /// Labels: outcome
    pub const SCAN_CELLS: Metric = Metric::counter("terracov.scan.cells")
        .with_description("Cells classified by coverage scans")
        .with_unit(Unit::Count)
        .with_labels(&[OUTCOME_LABEL]);

    /// Search radius of the most recent scan, in grid cells.
    pub const SCAN_RADIUS_CELLS: Metric = Metric::gauge("terracov.scan.radius_cells")
        .with_description("Search radius of the most recent scan in grid cells")
        .with_unit(Unit::Count);

    /// Basic transmission loss of every model-evaluated cell, in dB.
    pub const SCAN_ATTENUATION: Metric = Metric::histogram("terracov.scan.attenuation_db")
        .with_description("Basic transmission loss of evaluated cells in dB");

    /// Wall-clock duration of a scan.
    pub const SCAN_DURATION: Metric = Metric::histogram("terracov.scan.duration_ms")
        .with_description("Wall-clock duration of coverage scans")
        .with_unit(Unit::Milliseconds);

    /// Scans stopped by cancellation.
    pub const SCAN_CANCELLED: Metric = Metric::counter("terracov.scan.cancelled")
        .with_description("Coverage scans stopped by cancellation")
        .with_unit(Unit::Count);

    /// Every scan metric, in declaration order.
    pub const ALL: &[&Metric] = &[
        &SCAN_CELLS,
        &SCAN_RADIUS_CELLS,
        &SCAN_ATTENUATION,
        &SCAN_DURATION,
        &SCAN_CANCELLED,
    ];
}

/// Describes all metrics recorded by coverage scans.
///
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
