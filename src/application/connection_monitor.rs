// Connection monitor - Mirror of transport connectivity plus data freshness
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionState {
    pub connected: bool,
    /// Arrival time of the last connect/close/error signal.
    pub last_change_at: Option<i64>,
    /// Arrival time of the last message, processed or dropped.
    pub last_message_at: Option<i64>,
}

/// Pure state mirror; retry and backoff belong to the transport.
#[derive(Debug, Clone, Default)]
pub struct ConnectionMonitor {
    state: ConnectionState,
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connect(&mut self, now_ms: i64) {
        self.state.connected = true;
        self.state.last_change_at = Some(now_ms);
    }

    /// Close and error both mean "not connected"; stored data is kept.
    pub fn on_disconnect(&mut self, now_ms: i64) {
        self.state.connected = false;
        self.state.last_change_at = Some(now_ms);
    }

    pub fn on_message(&mut self, now_ms: i64) {
        self.state.last_message_at = Some(now_ms);
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }
}
