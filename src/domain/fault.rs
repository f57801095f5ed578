// Fault event domain models
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultStatus {
    WarnHigh,
    FaultHigh,
    FaultLow,
    Resolved,
}

impl FaultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultStatus::WarnHigh => "WARN_HIGH",
            FaultStatus::FaultHigh => "FAULT_HIGH",
            FaultStatus::FaultLow => "FAULT_LOW",
            FaultStatus::Resolved => "RESOLVED",
        }
    }

    pub fn health(&self) -> Health {
        match self {
            FaultStatus::Resolved => Health::Ok,
            FaultStatus::WarnHigh => Health::Warn,
            FaultStatus::FaultHigh | FaultStatus::FaultLow => Health::Fault,
        }
    }
}

impl fmt::Display for FaultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

/// Exact match on the wire spelling; producers always send upper case.
impl FromStr for FaultStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WARN_HIGH" => Ok(FaultStatus::WarnHigh),
            "FAULT_HIGH" => Ok(FaultStatus::FaultHigh),
            "FAULT_LOW" => Ok(FaultStatus::FaultLow),
            "RESOLVED" => Ok(FaultStatus::Resolved),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultEvent {
    pub timestamp: i64,
    pub name: String,
    pub status: FaultStatus,
    /// NaN when the producer sent no reading. Serialized as `null`.
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Per-metric health derived from the latest fault event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Health {
    Ok,
    Warn,
    Fault,
}

impl Health {
    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Ok => "OK",
            Health::Warn => "WARN",
            Health::Fault => "FAULT",
        }
    }
}
