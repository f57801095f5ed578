// Domain layer - Pure data models and classification rules
pub mod aliases;
pub mod fault;
pub mod health;
pub mod record;
pub mod telemetry;
