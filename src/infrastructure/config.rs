use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub bridge: BridgeSettings,
    pub ingest: IngestSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BridgeSettings {
    pub address: String,
    pub reconnect_min_ms: u64,
    pub reconnect_max_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IngestSettings {
    pub topics: Vec<String>,
    pub history_limit: usize,
    pub ledger_limit: usize,
    pub recent_default: usize,
}

pub const DEFAULT_HISTORY_LIMIT: usize = 600;
pub const DEFAULT_LEDGER_LIMIT: usize = 300;
pub const DEFAULT_RECENT_EVENTS: usize = 80;

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            topics: vec![
                "wesmo/telemetry/#".to_string(),
                "wesmo/faults/#".to_string(),
            ],
            history_limit: DEFAULT_HISTORY_LIMIT,
            ledger_limit: DEFAULT_LEDGER_LIMIT,
            recent_default: DEFAULT_RECENT_EVENTS,
        }
    }
}

fn builder_with_defaults() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    let ingest = IngestSettings::default();
    Ok(config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8080")?
        .set_default("bridge.address", "127.0.0.1:1884")?
        .set_default("bridge.reconnect_min_ms", 1000)?
        .set_default("bridge.reconnect_max_ms", 10_000)?
        .set_default("ingest.topics", ingest.topics)?
        .set_default("ingest.history_limit", ingest.history_limit as u64)?
        .set_default("ingest.ledger_limit", ingest.ledger_limit as u64)?
        .set_default("ingest.recent_default", ingest.recent_default as u64)?)
}

/// Defaults, then `config/telemetry.*` if present, then `TELEMETRY__*` env vars.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = builder_with_defaults()?
        .add_source(config::File::with_name("config/telemetry").required(false))
        .add_source(
            config::Environment::with_prefix("TELEMETRY")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("ingest.topics")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = settings.try_deserialize()?;
    if app.ingest.history_limit == 0 || app.ingest.ledger_limit == 0 {
        anyhow::bail!("ingest.history_limit and ingest.ledger_limit must be positive");
    }
    Ok(app)
}
