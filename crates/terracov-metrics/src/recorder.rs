//! In-process metrics recorder.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use metrics::{
    Counter, Gauge, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder, SharedString, Unit,
};
use serde::Serialize;

#[derive(Debug, Default)]
struct Samples(Mutex<Vec<f64>>);

impl HistogramFn for Samples {
    fn record(&self, value: f64) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value);
    }
}

#[derive(Debug, Default)]
struct Registry {
    counters: HashMap<String, Arc<AtomicU64>>,
    gauges: HashMap<String, Arc<AtomicU64>>,
    histograms: HashMap<String, Arc<Samples>>,
}

/// A recorder that keeps every metric in memory.
///
/// Metrics are keyed by name, followed by their labels in braces when present:
/// `terracov.scan.cells{outcome=covered}`.
///
/// ```rust
/// use terracov_metrics::InMemoryRecorder;
///
/// let recorder = InMemoryRecorder::new();
/// metrics::with_local_recorder(&recorder, || {
///     metrics::counter!("terracov.scan.cancelled").increment(1);
/// });
/// assert_eq!(recorder.snapshot().counter("terracov.scan.cancelled"), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryRecorder {
    registry: Mutex<Registry>,
}

impl InMemoryRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copies the current value of every metric.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let registry = self.registry();
        MetricsSnapshot {
            counters: registry
                .counters
                .iter()
                .map(|(k, v)| (k.clone(), v.load(Ordering::Acquire)))
                .collect(),
            gauges: registry
                .gauges
                .iter()
                .map(|(k, v)| (k.clone(), f64::from_bits(v.load(Ordering::Acquire))))
                .collect(),
            histograms: registry
                .histograms
                .iter()
                .map(|(k, v)| {
                    let samples = v.0.lock().unwrap_or_else(PoisonError::into_inner);
                    (k.clone(), HistogramSummary::from_samples(&samples))
                })
                .collect(),
        }
    }
}

fn key_string(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|label| format!("{}={}", label.key(), label.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

impl Recorder for InMemoryRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        let handle = self.registry().counters.entry(key_string(key)).or_default().clone();
        Counter::from_arc(handle)
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        let handle = self.registry().gauges.entry(key_string(key)).or_default().clone();
        Gauge::from_arc(handle)
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        let handle = self.registry().histograms.entry(key_string(key)).or_default().clone();
        Histogram::from_arc(handle)
    }
}

/// Summary statistics of a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramSummary {
    /// Number of recorded values.
    pub count: usize,
    /// Smallest recorded value.
    pub min: f64,
    /// Largest recorded value.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
}

impl HistogramSummary {
    fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self {
                count: 0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
            };
        }
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        Self {
            count: samples.len(),
            min,
            max,
            mean,
        }
    }
}

/// Point-in-time copy of an [`InMemoryRecorder`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    /// Counter values.
    pub counters: BTreeMap<String, u64>,
    /// Last gauge values.
    pub gauges: BTreeMap<String, f64>,
    /// Histogram summaries.
    pub histograms: BTreeMap<String, HistogramSummary>,
}

impl MetricsSnapshot {
    /// Counter value, zero when never incremented.
    pub fn counter(&self, key: &str) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    /// Gauge value, if set.
    pub fn gauge(&self, key: &str) -> Option<f64> {
        self.gauges.get(key).copied()
    }

    /// Histogram summary, if any value was recorded.
    pub fn histogram(&self, key: &str) -> Option<&HistogramSummary> {
        self.histograms.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_labelled_counters() {
        let recorder = InMemoryRecorder::new();
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("cells", "outcome" => "covered").increment(3);
            metrics::counter!("cells", "outcome" => "covered").increment(2);
            metrics::counter!("cells", "outcome" => "failed").increment(1);
        });

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.counter("cells{outcome=covered}"), 5);
        assert_eq!(snapshot.counter("cells{outcome=failed}"), 1);
        assert_eq!(snapshot.counter("cells{outcome=not_covered}"), 0);
    }

    #[test]
    fn test_gauges_and_histograms() {
        let recorder = InMemoryRecorder::new();
        metrics::with_local_recorder(&recorder, || {
            metrics::gauge!("radius").set(42.0);
            for value in [100.0, 120.0, 140.0] {
                metrics::histogram!("loss").record(value);
            }
        });

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.gauge("radius"), Some(42.0));
        let loss = snapshot.histogram("loss").unwrap();
        assert_eq!(loss.count, 3);
        assert_eq!(loss.min, 100.0);
        assert_eq!(loss.max, 140.0);
        assert_eq!(loss.mean, 120.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let recorder = InMemoryRecorder::new();
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("a").increment(1);
        });
        let json = serde_json::to_string(&recorder.snapshot()).unwrap();
        assert!(json.contains("\"a\":1"));
    }
}
