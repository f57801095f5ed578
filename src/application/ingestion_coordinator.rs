// Ingestion coordinator - Routes raw messages into the stores and publishes snapshots
use crate::application::connection_monitor::ConnectionMonitor;
use crate::application::fault_ledger::FaultLedger;
use crate::application::metric_store::MetricStore;
use crate::application::snapshot::TelemetrySnapshot;
use crate::domain::aliases;
use crate::domain::fault::FaultEvent;
use crate::domain::record::{DecodeError, FaultRecord, InboundRecord, TelemetryRecord};
use crate::infrastructure::config::IngestSettings;
use crate::infrastructure::payload_parser;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("payload could not be parsed")]
    Unparseable,
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("store rejected update for {0:?}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Telemetry { name: String },
    Fault { name: String },
    Batch { accepted: usize, dropped: usize },
    Dropped(IngestError),
}

/// Sole owner and mutator of the metric store, fault ledger and connection
/// monitor. Each entry point mutates, then publishes exactly one snapshot.
pub struct IngestionCoordinator {
    metrics: MetricStore,
    ledger: FaultLedger,
    connection: ConnectionMonitor,
    sequence: u64,
    publisher: watch::Sender<Arc<TelemetrySnapshot>>,
}

impl IngestionCoordinator {
    pub fn new(settings: &IngestSettings) -> Self {
        let empty = TelemetrySnapshot::empty(settings.history_limit, settings.ledger_limit);
        let (publisher, _) = watch::channel(Arc::new(empty.clone()));
        Self {
            metrics: empty.metrics,
            ledger: empty.ledger,
            connection: ConnectionMonitor::new(),
            sequence: 0,
            publisher,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<TelemetrySnapshot>> {
        self.publisher.subscribe()
    }

    pub fn snapshot(&self) -> Arc<TelemetrySnapshot> {
        self.publisher.borrow().clone()
    }

    pub fn on_message(&mut self, topic: &str, payload: &[u8]) -> IngestOutcome {
        self.on_message_at(topic, payload, chrono::Utc::now().timestamp_millis())
    }

    /// `arrival_ms` stands in for records that carry no timestamp.
    pub fn on_message_at(&mut self, topic: &str, payload: &[u8], arrival_ms: i64) -> IngestOutcome {
        self.connection.on_message(arrival_ms);

        let outcome = match payload_parser::parse(payload) {
            Some(Value::Array(items)) => self.ingest_batch(&items, arrival_ms),
            Some(value) => self.ingest_value(&value, arrival_ms),
            None => IngestOutcome::Dropped(IngestError::Unparseable),
        };

        if let IngestOutcome::Dropped(reason) = &outcome {
            tracing::debug!(topic, "dropped message: {}", reason);
        }

        self.publish();
        outcome
    }

    pub fn on_connect_at(&mut self, now_ms: i64) {
        self.connection.on_connect(now_ms);
        self.publish();
    }

    pub fn on_disconnect_at(&mut self, now_ms: i64) {
        self.connection.on_disconnect(now_ms);
        self.publish();
    }

    fn ingest_batch(&mut self, items: &[Value], arrival_ms: i64) -> IngestOutcome {
        let mut accepted = 0;
        for item in items {
            match self.ingest_value(item, arrival_ms) {
                IngestOutcome::Dropped(reason) => {
                    tracing::debug!("dropped batch element: {}", reason);
                }
                _ => accepted += 1,
            }
        }
        IngestOutcome::Batch {
            accepted,
            dropped: items.len() - accepted,
        }
    }

    fn ingest_value(&mut self, value: &Value, arrival_ms: i64) -> IngestOutcome {
        match InboundRecord::decode(value) {
            Ok(InboundRecord::Telemetry(record)) => self.apply_telemetry(record, arrival_ms),
            Ok(InboundRecord::Fault(record)) => self.apply_fault(record, arrival_ms),
            Err(e) => IngestOutcome::Dropped(e.into()),
        }
    }

    fn apply_telemetry(&mut self, record: TelemetryRecord, arrival_ms: i64) -> IngestOutcome {
        let name = aliases::normalize(&record.name).to_string();
        let unit = record
            .unit
            .as_deref()
            .map(|u| aliases::normalize_unit(u).to_string());
        let timestamp = record.timestamp.unwrap_or(arrival_ms);

        if self.metrics.upsert(&name, timestamp, record.value, unit) {
            IngestOutcome::Telemetry { name }
        } else {
            IngestOutcome::Dropped(IngestError::Rejected(name))
        }
    }

    fn apply_fault(&mut self, record: FaultRecord, arrival_ms: i64) -> IngestOutcome {
        let name = aliases::normalize(&record.name).to_string();
        let event = FaultEvent {
            timestamp: record.timestamp.unwrap_or(arrival_ms),
            name: name.clone(),
            status: record.status,
            value: record.value,
            source: record.source,
            message: record.message,
        };

        if self.ledger.append(event) {
            tracing::info!(name = %name, status = %record.status, "fault event recorded");
            IngestOutcome::Fault { name }
        } else {
            IngestOutcome::Dropped(IngestError::Rejected(name))
        }
    }

    fn publish(&mut self) {
        self.sequence += 1;
        let snapshot = TelemetrySnapshot {
            sequence: self.sequence,
            metrics: self.metrics.clone(),
            ledger: self.ledger.clone(),
            connection: self.connection.state(),
        };
        self.publisher.send_replace(Arc::new(snapshot));
    }
}
