// Transport trait - Broker-facing event source consumed by an ingestion session
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Message { topic: String, payload: Bytes },
    Closed,
    Error(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection to {address} failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("read failed: {0}")]
    Read(#[from] std::io::Error),
}

/// Reconnection and retry live behind this trait; the session only mirrors
/// the resulting connect/close/error events.
#[async_trait]
pub trait TransportSource: Send {
    /// `None` once the source is finished for good.
    async fn next_event(&mut self) -> Option<TransportEvent>;

    /// Releases the connection. Called once when the session stops.
    async fn close(&mut self);
}

/// In-process source fed through an mpsc channel.
pub struct ChannelTransport {
    rx: mpsc::Receiver<TransportEvent>,
}

impl ChannelTransport {
    pub fn new(buffer: usize) -> (mpsc::Sender<TransportEvent>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self { rx })
    }
}

#[async_trait]
impl TransportSource for ChannelTransport {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }

    async fn close(&mut self) {
        self.rx.close();
    }
}
