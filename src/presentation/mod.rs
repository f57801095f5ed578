// Presentation layer - HTTP read API over published snapshots
pub mod app_state;
pub mod handlers;
pub mod server;
