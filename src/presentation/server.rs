// HTTP routing and server lifecycle
use crate::application::session::IngestionSession;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    active_faults, category_health, connection_state, get_metric, health_check, list_metrics,
    metric_statuses, recent_faults, stream_snapshots,
};
use axum::{routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/connection", get(connection_state))
        .route("/metrics", get(list_metrics))
        .route("/metrics/:name", get(get_metric))
        .route("/faults/active", get(active_faults))
        .route("/faults/recent", get(recent_faults))
        .route("/statuses", get(metric_statuses))
        .route("/health", get(category_health))
        .route("/stream", get(stream_snapshots))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until `signal` resolves.
///
/// The session is stopped before the server drains its connections. That
/// drops the snapshot sender, which ends every open `/stream` response, so
/// graceful shutdown is never left waiting on a live event stream.
pub async fn run_server(
    listener: TcpListener,
    router: Router,
    session: IngestionSession,
    signal: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            signal.await;
            tracing::info!("shutdown requested, stopping ingestion");
            session.stop().await;
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::transport::ChannelTransport;
    use crate::infrastructure::config::IngestSettings;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_shutdown_completes_with_open_event_stream() {
        // the sender stays alive so the session only ends through shutdown
        let (_events, transport) = ChannelTransport::new(16);
        let session = IngestionSession::start(Box::new(transport), &IngestSettings::default());
        let state = Arc::new(AppState {
            snapshots: session.subscribe(),
            recent_default: 80,
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(run_server(listener, router(state), session, async move {
            let _ = stop_rx.await;
        }));

        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"GET /stream HTTP/1.1\r\nhost: localhost\r\n\r\n")
            .await
            .unwrap();

        let mut received = Vec::new();
        let mut buf = [0u8; 4096];
        while !String::from_utf8_lossy(&received).contains("event: snapshot") {
            let n = client.read(&mut buf).await.unwrap();
            assert!(n > 0, "stream closed before the first snapshot");
            received.extend_from_slice(&buf[..n]);
        }

        stop_tx.send(()).unwrap();
        let finished = tokio::time::timeout(Duration::from_secs(3), server).await;
        assert!(matches!(finished, Ok(Ok(Ok(())))));
    }
}
