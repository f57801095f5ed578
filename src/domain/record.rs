// Inbound record shapes decoded from parsed payloads
use crate::domain::fault::FaultStatus;
use serde_json::{Map, Value};
use thiserror::Error;

/// Discriminator value producers may set explicitly on fault events.
pub const FAULT_EVENT_KIND: &str = "fault_event";

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub name: String,
    pub value: f64,
    pub unit: Option<String>,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaultRecord {
    pub name: String,
    pub status: FaultStatus,
    pub value: f64,
    pub source: Option<String>,
    pub message: Option<String>,
    pub timestamp: Option<i64>,
}

/// The closed set of shapes the ingestion path understands.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundRecord {
    Telemetry(TelemetryRecord),
    Fault(FaultRecord),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("record is not an object")]
    NotAnObject,
    #[error("record has no name")]
    MissingName,
    #[error("fault event for {0:?} has no status")]
    MissingStatus(String),
    #[error("fault event for {name:?} has unknown status {status:?}")]
    UnknownStatus { name: String, status: String },
    #[error("reading for {0:?} has no numeric value")]
    MissingValue(String),
    #[error("reading for {0:?} is not finite")]
    NonFiniteValue(String),
}

impl InboundRecord {
    /// Fault-shaped records carry `kind: "fault_event"` or both a `name` and a
    /// `status` field of any type; telemetry-shaped records carry `name` and a
    /// numeric `value`.
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;

        let tagged = obj.get("kind").and_then(Value::as_str) == Some(FAULT_EVENT_KIND);
        if tagged || (obj.contains_key("status") && obj.contains_key("name")) {
            return decode_fault(obj).map(InboundRecord::Fault);
        }

        decode_telemetry(obj).map(InboundRecord::Telemetry)
    }
}

fn decode_telemetry(obj: &Map<String, Value>) -> Result<TelemetryRecord, DecodeError> {
    let name = required_name(obj)?;
    let value = match obj.get("value").and_then(coerce_number) {
        Some(v) if v.is_finite() => v,
        Some(_) => return Err(DecodeError::NonFiniteValue(name)),
        None => return Err(DecodeError::MissingValue(name)),
    };

    Ok(TelemetryRecord {
        value,
        unit: optional_string(obj, "unit"),
        timestamp: record_timestamp(obj),
        name,
    })
}

fn decode_fault(obj: &Map<String, Value>) -> Result<FaultRecord, DecodeError> {
    let name = required_name(obj)?;
    let status = match obj.get("status") {
        Some(Value::String(s)) => s.parse::<FaultStatus>().map_err(|e| DecodeError::UnknownStatus {
            name: name.clone(),
            status: e.0,
        })?,
        Some(other) => {
            return Err(DecodeError::UnknownStatus {
                status: other.to_string(),
                name,
            });
        }
        None => return Err(DecodeError::MissingStatus(name)),
    };

    Ok(FaultRecord {
        status,
        value: obj.get("value").and_then(coerce_number).unwrap_or(f64::NAN),
        source: optional_string(obj, "source"),
        message: optional_string(obj, "message"),
        timestamp: record_timestamp(obj),
        name,
    })
}

fn required_name(obj: &Map<String, Value>) -> Result<String, DecodeError> {
    match obj.get("name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(DecodeError::MissingName),
    }
}

fn optional_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Numbers pass through; strings holding a number are parsed.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// `ts` wins over `time`; both must be finite numbers to count.
fn record_timestamp(obj: &Map<String, Value>) -> Option<i64> {
    ["ts", "time"].into_iter().find_map(|key| {
        obj.get(key)
            .and_then(Value::as_f64)
            .filter(|t| t.is_finite())
            .map(|t| t as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_telemetry() {
        let record = InboundRecord::decode(&json!({
            "name": "SoC", "value": 42, "unit": "%", "ts": 1000
        }))
        .unwrap();

        assert_eq!(
            record,
            InboundRecord::Telemetry(TelemetryRecord {
                name: "SoC".to_string(),
                value: 42.0,
                unit: Some("%".to_string()),
                timestamp: Some(1000),
            })
        );
    }

    #[test]
    fn test_decode_string_value_and_time_fallback() {
        let record = InboundRecord::decode(&json!({
            "name": "Motor Temp", "value": " 87.5 ", "ts": "soon", "time": 20
        }))
        .unwrap();

        let InboundRecord::Telemetry(r) = record else {
            panic!("expected telemetry");
        };
        assert_eq!(r.value, 87.5);
        assert_eq!(r.timestamp, Some(20));
    }

    #[test]
    fn test_decode_rejects_bad_values() {
        assert_eq!(
            InboundRecord::decode(&json!({"name": "SoC", "value": "NaN"})),
            Err(DecodeError::NonFiniteValue("SoC".to_string()))
        );
        assert_eq!(
            InboundRecord::decode(&json!({"name": "SoC", "value": "high"})),
            Err(DecodeError::MissingValue("SoC".to_string()))
        );
        assert_eq!(
            InboundRecord::decode(&json!({"name": "", "value": 1})),
            Err(DecodeError::MissingName)
        );
        assert_eq!(
            InboundRecord::decode(&json!([1, 2])),
            Err(DecodeError::NotAnObject)
        );
    }

    #[test]
    fn test_decode_fault_by_shape_and_by_kind() {
        let by_shape = InboundRecord::decode(&json!({
            "name": "Motor Temp", "status": "FAULT_HIGH", "value": 95.0, "ts": 7
        }))
        .unwrap();
        let InboundRecord::Fault(f) = by_shape else {
            panic!("expected fault");
        };
        assert_eq!(f.status, FaultStatus::FaultHigh);
        assert_eq!(f.timestamp, Some(7));

        let by_kind = InboundRecord::decode(&json!({
            "kind": "fault_event", "name": "SoC", "status": "RESOLVED",
            "source": "BMS", "message": "back to nominal"
        }))
        .unwrap();
        let InboundRecord::Fault(f) = by_kind else {
            panic!("expected fault");
        };
        assert!(f.value.is_nan());
        assert_eq!(f.source.as_deref(), Some("BMS"));
        assert_eq!(f.message.as_deref(), Some("back to nominal"));
    }

    #[test]
    fn test_decode_fault_errors() {
        assert_eq!(
            InboundRecord::decode(&json!({"kind": "fault_event", "name": "SoC"})),
            Err(DecodeError::MissingStatus("SoC".to_string()))
        );
        assert_eq!(
            InboundRecord::decode(&json!({"name": "SoC", "status": "MELTING"})),
            Err(DecodeError::UnknownStatus {
                name: "SoC".to_string(),
                status: "MELTING".to_string()
            })
        );
    }

    #[test]
    fn test_non_string_status_is_still_fault_shaped() {
        assert_eq!(
            InboundRecord::decode(&json!({"name": "SoC", "status": 5, "value": 40})),
            Err(DecodeError::UnknownStatus {
                name: "SoC".to_string(),
                status: "5".to_string()
            })
        );
        assert_eq!(
            InboundRecord::decode(&json!({"name": "SoC", "status": null, "value": 40})),
            Err(DecodeError::UnknownStatus {
                name: "SoC".to_string(),
                status: "null".to_string()
            })
        );
    }
}
