// Ingestion session - Lifecycle of one coordinator bound to one transport
use crate::application::ingestion_coordinator::IngestionCoordinator;
use crate::application::snapshot::TelemetrySnapshot;
use crate::application::transport::{TransportEvent, TransportSource};
use crate::infrastructure::config::IngestSettings;
use crate::infrastructure::topic_filter::TopicFilters;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// Handle to a running session. Every session starts from empty state;
/// dropping the handle tears the session down like `stop` does.
pub struct IngestionSession {
    snapshots: watch::Receiver<Arc<TelemetrySnapshot>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl IngestionSession {
    pub fn start(transport: Box<dyn TransportSource>, settings: &IngestSettings) -> Self {
        let coordinator = IngestionCoordinator::new(settings);
        let snapshots = coordinator.subscribe();
        let filters = TopicFilters::new(&settings.topics);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(run(coordinator, transport, filters, shutdown_rx));
        tracing::info!(topics = ?settings.topics, "ingestion session started");

        Self {
            snapshots,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn snapshot(&self) -> Arc<TelemetrySnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<TelemetrySnapshot>> {
        self.snapshots.clone()
    }

    /// Stops ingesting, closes the transport and waits for the task to finish.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("ingestion task ended abnormally: {}", e);
            }
        }
        tracing::info!("ingestion session stopped");
    }
}

async fn run(
    mut coordinator: IngestionCoordinator,
    mut transport: Box<dyn TransportSource>,
    filters: TopicFilters,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = transport.next_event() => match event {
                Some(event) => dispatch(&mut coordinator, &filters, event),
                None => {
                    tracing::info!("transport finished");
                    break;
                }
            },
        }
    }

    transport.close().await;
}

fn dispatch(coordinator: &mut IngestionCoordinator, filters: &TopicFilters, event: TransportEvent) {
    let now = || chrono::Utc::now().timestamp_millis();
    match event {
        TransportEvent::Connected => {
            tracing::info!("transport connected");
            coordinator.on_connect_at(now());
        }
        TransportEvent::Closed => {
            tracing::info!("transport closed");
            coordinator.on_disconnect_at(now());
        }
        TransportEvent::Error(reason) => {
            tracing::warn!("transport error: {}", reason);
            coordinator.on_disconnect_at(now());
        }
        TransportEvent::Message { topic, payload } => {
            if !filters.accepts(&topic) {
                tracing::trace!(topic = %topic, "ignoring message outside subscribed topics");
                return;
            }
            coordinator.on_message(&topic, &payload);
        }
    }
}
