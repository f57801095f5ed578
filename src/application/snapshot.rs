// Immutable view of ingestion state handed to readers
use crate::application::connection_monitor::ConnectionState;
use crate::application::fault_ledger::FaultLedger;
use crate::application::health_aggregator::{derive_health, metric_statuses};
use crate::application::metric_store::MetricStore;
use crate::domain::aliases;
use crate::domain::fault::FaultEvent;
use crate::domain::health::HealthReport;
use crate::domain::telemetry::{LastReading, MetricView};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct TelemetrySnapshot {
    /// Incremented once per published snapshot within a session.
    pub sequence: u64,
    pub metrics: MetricStore,
    pub ledger: FaultLedger,
    pub connection: ConnectionState,
}

impl TelemetrySnapshot {
    pub fn empty(history_limit: usize, ledger_limit: usize) -> Self {
        Self {
            sequence: 0,
            metrics: MetricStore::new(history_limit),
            ledger: FaultLedger::new(ledger_limit),
            connection: ConnectionState::default(),
        }
    }

    /// Looks up a metric by any known spelling of its name.
    pub fn metric(&self, name: &str) -> MetricView {
        self.metrics.get(aliases::normalize(name))
    }

    pub fn latest(&self) -> Vec<(&str, &LastReading)> {
        self.metrics.latest()
    }

    pub fn active_faults(&self) -> Vec<FaultEvent> {
        self.ledger.active_faults()
    }

    pub fn recent_history(&self, n: usize) -> Vec<FaultEvent> {
        self.ledger.recent_history(n)
    }

    pub fn connected(&self) -> bool {
        self.connection.connected
    }

    pub fn metric_statuses(&self) -> BTreeMap<String, String> {
        metric_statuses(&self.metrics, &self.ledger)
    }

    pub fn category_health(&self) -> HealthReport {
        derive_health(self.ledger.events(), &self.metric_statuses())
    }
}
