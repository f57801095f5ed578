// Application layer - Ingestion state, coordination and session lifecycle
pub mod connection_monitor;
pub mod fault_ledger;
pub mod health_aggregator;
pub mod ingestion_coordinator;
pub mod metric_store;
pub mod session;
pub mod snapshot;
pub mod transport;
