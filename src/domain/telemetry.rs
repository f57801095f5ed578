// Telemetry data domain models
use im::Vector;
use serde::Serialize;

/// One stored reading. Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSample {
    pub timestamp: i64,
    pub value: f64,
}

impl MetricSample {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastReading {
    pub timestamp: i64,
    pub value: f64,
    pub unit: Option<String>,
}

/// Latest value plus a bounded, arrival-ordered history for one metric.
///
/// History is a persistent vector: clones share structure, and a push after a
/// clone copies at most one chunk instead of the whole history.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    last: LastReading,
    history: Vector<MetricSample>,
}

impl MetricSeries {
    pub fn new(timestamp: i64, value: f64, unit: Option<String>, capacity: usize) -> Self {
        let mut series = Self {
            last: LastReading {
                timestamp,
                value,
                unit: None,
            },
            history: Vector::new(),
        };
        series.push(timestamp, value, unit, capacity);
        series
    }

    /// Sets `last` and appends to history, evicting from the front past `capacity`.
    pub fn push(&mut self, timestamp: i64, value: f64, unit: Option<String>, capacity: usize) {
        self.last = LastReading {
            timestamp,
            value,
            unit,
        };
        self.history.push_back(MetricSample::new(timestamp, value));
        while self.history.len() > capacity {
            self.history.pop_front();
        }
    }

    pub fn last(&self) -> &LastReading {
        &self.last
    }

    pub fn history(&self) -> impl Iterator<Item = &MetricSample> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

/// Read-side view of a metric. Absent metrics have no value and an empty history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricView {
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub timestamp: Option<i64>,
    pub history: Vec<MetricSample>,
}

impl MetricView {
    pub fn from_series(series: &MetricSeries) -> Self {
        let last = series.last();
        Self {
            value: Some(last.value),
            unit: last.unit.clone(),
            timestamp: Some(last.timestamp),
            history: {
                let mut history = Vec::with_capacity(series.history_len());
                history.extend(series.history().copied());
                history
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_evicts_oldest_first() {
        let mut series = MetricSeries::new(0, 0.0, None, 3);
        for i in 1..5 {
            series.push(i, i as f64, None, 3);
        }

        let timestamps: Vec<i64> = series.history().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![2, 3, 4]);
        assert_eq!(series.last().value, 4.0);
    }

    #[test]
    fn test_last_follows_arrival_not_event_time() {
        let mut series = MetricSeries::new(2000, 1.0, None, 10);
        series.push(1000, 2.0, Some("V".to_string()), 10);

        assert_eq!(series.last().timestamp, 1000);
        assert_eq!(series.last().unit.as_deref(), Some("V"));
        let timestamps: Vec<i64> = series.history().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![2000, 1000]);
    }

    #[test]
    fn test_clone_keeps_its_history_after_pushes() {
        let mut series = MetricSeries::new(0, 0.0, None, 500);
        for i in 1..1000 {
            series.push(i, i as f64, None, 500);
        }
        let published = series.clone();

        for i in 1000..1200 {
            series.push(i, i as f64, None, 500);
        }

        assert_eq!(published.history_len(), 500);
        assert_eq!(published.history().next().map(|s| s.timestamp), Some(500));
        assert_eq!(published.last().timestamp, 999);
        assert_eq!(series.history_len(), 500);
        assert_eq!(series.history().next().map(|s| s.timestamp), Some(700));
    }
}
