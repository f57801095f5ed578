// Line bridge transport - Newline-delimited `topic payload` frames over TCP
//
// Matches the output of `mosquitto_sub -v -t '#'`, so any broker can be
// bridged with e.g. `mosquitto_sub -v -t 'wesmo/#' | nc -l 1884`.
use crate::application::transport::{TransportError, TransportEvent, TransportSource};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::TcpStream;

/// Longest accepted frame, newline included. Longer lines are skipped whole.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
struct Backoff {
    min: Duration,
    max: Duration,
    next: Option<Duration>,
}

impl Backoff {
    fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
            next: None,
        }
    }

    /// Delay to wait before the next attempt; doubles up to `max`.
    fn take(&mut self) -> Option<Duration> {
        let current = self.next;
        let following = current.map(|d| (d * 2).min(self.max)).unwrap_or(self.min);
        self.next = Some(following);
        current
    }

    fn reset(&mut self) {
        self.next = None;
    }
}

pub struct LineBridgeTransport {
    address: String,
    backoff: Backoff,
    reader: Option<BufReader<TcpStream>>,
    /// Set while skipping the remainder of an oversized frame.
    discarding: bool,
    closed: bool,
}

impl LineBridgeTransport {
    pub fn new(address: impl Into<String>, reconnect_min: Duration, reconnect_max: Duration) -> Self {
        Self {
            address: address.into(),
            backoff: Backoff::new(reconnect_min, reconnect_max),
            reader: None,
            discarding: false,
            closed: false,
        }
    }

    async fn connect(&mut self) -> TransportEvent {
        if let Some(delay) = self.backoff.take() {
            tracing::debug!(address = %self.address, ?delay, "waiting before reconnect");
            tokio::time::sleep(delay).await;
        }

        match TcpStream::connect(&self.address).await {
            Ok(stream) => {
                tracing::info!(address = %self.address, "bridge connected");
                self.reader = Some(BufReader::new(stream));
                self.discarding = false;
                self.backoff.reset();
                TransportEvent::Connected
            }
            Err(source) => {
                let err = TransportError::Connect {
                    address: self.address.clone(),
                    source,
                };
                TransportEvent::Error(err.to_string())
            }
        }
    }
}

/// Splits a frame at the first space. A frame without one carries an empty payload.
fn split_frame(mut line: Vec<u8>) -> Option<TransportEvent> {
    while matches!(line.last(), Some(b'\n' | b'\r')) {
        line.pop();
    }
    if line.is_empty() {
        return None;
    }

    let (topic, payload) = match line.iter().position(|b| *b == b' ') {
        Some(idx) => {
            let payload = line.split_off(idx + 1);
            line.pop();
            (line, payload)
        }
        None => (line, Vec::new()),
    };

    Some(TransportEvent::Message {
        topic: String::from_utf8_lossy(&topic).into_owned(),
        payload: Bytes::from(payload),
    })
}

#[async_trait]
impl TransportSource for LineBridgeTransport {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        if self.closed {
            return None;
        }

        loop {
            let Some(reader) = self.reader.as_mut() else {
                return Some(self.connect().await);
            };

            let mut line = Vec::new();
            let read = reader
                .take(MAX_FRAME_BYTES as u64)
                .read_until(b'\n', &mut line)
                .await;
            match read {
                Ok(0) => {
                    self.reader = None;
                    return Some(TransportEvent::Closed);
                }
                Ok(n) => {
                    let complete = line.last() == Some(&b'\n');
                    if self.discarding {
                        self.discarding = !complete;
                        continue;
                    }
                    if !complete && n >= MAX_FRAME_BYTES {
                        tracing::warn!(
                            address = %self.address,
                            limit = MAX_FRAME_BYTES,
                            "dropping oversized frame"
                        );
                        self.discarding = true;
                        continue;
                    }
                    if let Some(event) = split_frame(line) {
                        return Some(event);
                    }
                }
                Err(e) => {
                    self.reader = None;
                    return Some(TransportEvent::Error(TransportError::Read(e).to_string()));
                }
            }
        }
    }

    async fn close(&mut self) {
        self.closed = true;
        self.reader = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_split_frame() {
        assert_eq!(
            split_frame(b"wesmo/telemetry {\"name\":\"SoC\"}\r\n".to_vec()),
            Some(TransportEvent::Message {
                topic: "wesmo/telemetry".to_string(),
                payload: Bytes::from_static(b"{\"name\":\"SoC\"}"),
            })
        );
        assert_eq!(
            split_frame(b"wesmo/faults\n".to_vec()),
            Some(TransportEvent::Message {
                topic: "wesmo/faults".to_string(),
                payload: Bytes::new(),
            })
        );
        assert_eq!(split_frame(b"\n".to_vec()), None);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(backoff.take(), None);
        assert_eq!(backoff.take(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.take(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.take(), Some(Duration::from_millis(350)));
        backoff.reset();
        assert_eq!(backoff.take(), None);
    }

    #[tokio::test]
    async fn test_reads_frames_until_peer_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(b"wesmo/telemetry {name:SoC,value:40}\n\nwesmo/faults {\"name\":\"SoC\",\"status\":\"RESOLVED\"}\n")
                .await
                .unwrap();
        });

        let mut transport =
            LineBridgeTransport::new(address, Duration::from_millis(10), Duration::from_millis(20));

        assert_eq!(transport.next_event().await, Some(TransportEvent::Connected));
        match transport.next_event().await {
            Some(TransportEvent::Message { topic, payload }) => {
                assert_eq!(topic, "wesmo/telemetry");
                assert_eq!(&payload[..], b"{name:SoC,value:40}");
            }
            other => panic!("unexpected event {:?}", other),
        }
        match transport.next_event().await {
            Some(TransportEvent::Message { topic, .. }) => assert_eq!(topic, "wesmo/faults"),
            other => panic!("unexpected event {:?}", other),
        }
        server.await.unwrap();
        assert_eq!(transport.next_event().await, Some(TransportEvent::Closed));

        transport.close().await;
        assert_eq!(transport.next_event().await, None);
    }

    #[tokio::test]
    async fn test_oversized_frame_is_skipped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut oversized = b"wesmo/telemetry ".to_vec();
            oversized.resize(MAX_FRAME_BYTES * 3, b'x');
            oversized.push(b'\n');
            socket.write_all(&oversized).await.unwrap();
            socket
                .write_all(b"wesmo/telemetry {name:SoC,value:41}\n")
                .await
                .unwrap();
        });

        let mut transport =
            LineBridgeTransport::new(address, Duration::from_millis(10), Duration::from_millis(20));

        assert_eq!(transport.next_event().await, Some(TransportEvent::Connected));
        match transport.next_event().await {
            Some(TransportEvent::Message { payload, .. }) => {
                assert_eq!(&payload[..], b"{name:SoC,value:41}");
            }
            other => panic!("unexpected event {:?}", other),
        }
        server.await.unwrap();
        assert_eq!(transport.next_event().await, Some(TransportEvent::Closed));
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported_as_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let mut transport =
            LineBridgeTransport::new(address, Duration::from_millis(1), Duration::from_millis(2));
        assert!(matches!(
            transport.next_event().await,
            Some(TransportEvent::Error(_))
        ));
    }
}
