// Metric store - Latest value and bounded history per canonical metric name
use crate::domain::telemetry::{LastReading, MetricSeries, MetricView};
use im::HashMap;

/// Backed by persistent collections: cloning the store for a snapshot is
/// constant time, and an upsert afterwards only copies the touched path.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricStore {
    series: HashMap<String, MetricSeries>,
    capacity: usize,
}

impl MetricStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            series: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Returns false when the update was rejected (empty name or non-finite value).
    pub fn upsert(&mut self, name: &str, timestamp: i64, value: f64, unit: Option<String>) -> bool {
        if name.is_empty() || !value.is_finite() {
            return false;
        }

        match self.series.get_mut(name) {
            Some(series) => series.push(timestamp, value, unit, self.capacity),
            None => {
                let series = MetricSeries::new(timestamp, value, unit, self.capacity);
                self.series.insert(name.to_string(), series);
            }
        }
        true
    }

    pub fn get(&self, name: &str) -> MetricView {
        self.series
            .get(name)
            .map(MetricView::from_series)
            .unwrap_or_default()
    }

    /// Latest readings sorted by name.
    pub fn latest(&self) -> Vec<(&str, &LastReading)> {
        let mut rows: Vec<_> = self
            .series
            .iter()
            .map(|(name, s)| (name.as_str(), s.last()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
