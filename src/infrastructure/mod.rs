// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod line_bridge;
pub mod payload_parser;
pub mod topic_filter;
