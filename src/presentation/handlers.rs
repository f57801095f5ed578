// HTTP request handlers
use crate::application::connection_monitor::ConnectionState;
use crate::application::snapshot::TelemetrySnapshot;
use crate::domain::fault::FaultEvent;
use crate::domain::health::HealthReport;
use crate::domain::telemetry::{LastReading, MetricView};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// Compact per-snapshot payload pushed over the event stream.
#[derive(Debug, Serialize)]
pub struct SnapshotSummary {
    pub sequence: u64,
    pub connection: ConnectionState,
    pub metrics: BTreeMap<String, LastReading>,
    pub active_faults: Vec<FaultEvent>,
    pub health: HealthReport,
}

impl SnapshotSummary {
    pub fn from_snapshot(snapshot: &TelemetrySnapshot) -> Self {
        Self {
            sequence: snapshot.sequence,
            connection: snapshot.connection,
            metrics: latest_readings(snapshot),
            active_faults: snapshot.active_faults(),
            health: snapshot.category_health(),
        }
    }
}

fn latest_readings(snapshot: &TelemetrySnapshot) -> BTreeMap<String, LastReading> {
    snapshot
        .latest()
        .into_iter()
        .map(|(name, last)| (name.to_string(), last.clone()))
        .collect()
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn connection_state(State(state): State<Arc<AppState>>) -> Json<ConnectionState> {
    Json(state.snapshot().connection)
}

pub async fn list_metrics(
    State(state): State<Arc<AppState>>,
) -> Json<BTreeMap<String, LastReading>> {
    Json(latest_readings(&state.snapshot()))
}

/// Unknown metrics answer with nulls and an empty history rather than 404,
/// so a dashboard tile can render before its first reading arrives.
pub async fn get_metric(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<MetricView> {
    Json(state.snapshot().metric(&name))
}

pub async fn active_faults(State(state): State<Arc<AppState>>) -> Json<Vec<FaultEvent>> {
    Json(state.snapshot().active_faults())
}

pub async fn recent_faults(
    Query(query): Query<RecentQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<Vec<FaultEvent>> {
    let limit = query.limit.unwrap_or(state.recent_default);
    Json(state.snapshot().recent_history(limit))
}

pub async fn metric_statuses(
    State(state): State<Arc<AppState>>,
) -> Json<BTreeMap<String, String>> {
    Json(state.snapshot().metric_statuses())
}

pub async fn category_health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(state.snapshot().category_health())
}

/// Server-sent events: the current snapshot, then one event per publication.
pub async fn stream_snapshots(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.snapshots.clone();

    let stream = async_stream::stream! {
        loop {
            let summary = SnapshotSummary::from_snapshot(&rx.borrow_and_update());
            match Event::default().event("snapshot").json_data(&summary) {
                Ok(event) => yield Ok::<Event, Infallible>(event),
                Err(e) => tracing::warn!("failed to encode snapshot event: {}", e),
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
