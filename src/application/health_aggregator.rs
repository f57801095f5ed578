// Health aggregator - Worst-ever severity per subsystem category
use crate::application::fault_ledger::FaultLedger;
use crate::application::metric_store::MetricStore;
use crate::domain::aliases;
use crate::domain::fault::{FaultEvent, Health};
use crate::domain::health::{Category, CategoryHealth, HealthReport, Severity};
use std::collections::BTreeMap;

/// Telemetry series carrying a 0/1 fault flag for another metric.
pub const FAULT_FLAG_PREFIX: &str = "FAULT ";

/// Recomputed from the full ledger on every call. A later, milder event never
/// lowers a category: the report is the worst severity seen in the window.
pub fn derive_health<'a>(
    events: impl IntoIterator<Item = &'a FaultEvent>,
    statuses: &BTreeMap<String, String>,
) -> HealthReport {
    let mut categories = CategoryHealth::default();
    let mut touched = false;

    let event_labels = events
        .into_iter()
        .map(|e| (e.name.as_str(), e.status.as_str()));
    let status_labels = statuses.iter().map(|(n, s)| (n.as_str(), s.as_str()));

    for (name, status) in event_labels.chain(status_labels) {
        let label = format!("{} {}", name, status).to_uppercase();
        let severity = Severity::from_label(Some(status), &label);
        for category in Category::classify(&label) {
            touched = true;
            categories.escalate(category, severity);
        }
    }

    let overall = if touched {
        categories.worst()
    } else {
        Severity::Neutral
    };

    HealthReport {
        overall,
        categories,
    }
}

/// Current status label per canonical metric name.
///
/// Ledger state comes from the latest event for the name; flag series named
/// `FAULT <metric>` contribute `FAULT` while non-zero. Flag targets go through
/// the alias table, so the ledger wins for every spelling of a metric.
pub fn metric_statuses(store: &MetricStore, ledger: &FaultLedger) -> BTreeMap<String, String> {
    let mut statuses = BTreeMap::new();

    for (name, last) in store.latest() {
        let Some(target) = name.strip_prefix(FAULT_FLAG_PREFIX) else {
            continue;
        };
        if target.is_empty() {
            continue;
        }
        let target = aliases::normalize(target);
        let raised = last.value != 0.0;
        // several spellings may flag one metric; any raised flag wins
        if raised || !statuses.contains_key(target) {
            let health = if raised { Health::Fault } else { Health::Ok };
            statuses.insert(target.to_string(), health.as_str().to_string());
        }
    }

    for (name, event) in ledger.latest_by_name() {
        statuses.insert(name.to_string(), event.status.health().as_str().to_string());
    }

    statuses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fault::FaultStatus;

    fn event(timestamp: i64, name: &str, status: FaultStatus) -> FaultEvent {
        FaultEvent {
            timestamp,
            name: name.to_string(),
            status,
            value: f64::NAN,
            source: None,
            message: None,
        }
    }

    #[test]
    fn test_category_escalation() {
        let events = vec![
            event(1, "Battery Temperature", FaultStatus::WarnHigh),
            event(2, "Motor Temp", FaultStatus::FaultHigh),
        ];

        let report = derive_health(&events, &BTreeMap::new());
        assert_eq!(report.overall, Severity::Fault);
        assert_eq!(
            report.categories,
            CategoryHealth {
                battery: Severity::Warn,
                motor: Severity::Fault,
                brakes: Severity::Ok,
                comms: Severity::Ok,
            }
        );
    }

    #[test]
    fn test_no_downgrade_after_resolution() {
        let events = vec![
            event(1, "Motor Speed", FaultStatus::FaultHigh),
            event(2, "Motor Speed", FaultStatus::Resolved),
        ];

        let report = derive_health(&events, &BTreeMap::new());
        assert_eq!(report.categories.motor, Severity::Fault);
        assert_eq!(report.overall, Severity::Fault);
    }

    #[test]
    fn test_untouched_is_neutral() {
        let report = derive_health(&[], &BTreeMap::new());
        assert_eq!(report.overall, Severity::Neutral);
        assert_eq!(report.categories, CategoryHealth::default());

        let events = vec![event(1, "Track Time", FaultStatus::FaultHigh)];
        assert_eq!(derive_health(&events, &BTreeMap::new()).overall, Severity::Neutral);
    }

    #[test]
    fn test_resolved_only_is_ok() {
        let events = vec![event(1, "SoC", FaultStatus::Resolved)];
        let report = derive_health(&events, &BTreeMap::new());
        assert_eq!(report.overall, Severity::Ok);
    }

    #[test]
    fn test_status_map_feeds_categories() {
        let mut statuses = BTreeMap::new();
        statuses.insert("Brake Pressure Rear".to_string(), "WARN".to_string());
        statuses.insert("VCU".to_string(), "OK".to_string());

        let report = derive_health(&[], &statuses);
        assert_eq!(report.categories.brakes, Severity::Warn);
        assert_eq!(report.categories.comms, Severity::Ok);
        assert_eq!(report.overall, Severity::Warn);
    }

    #[test]
    fn test_metric_statuses() {
        let mut store = MetricStore::new(10);
        store.upsert("FAULT DC Voltage", 1, 1.0, None);
        store.upsert("FAULT Motor Temp", 1, 0.0, None);
        store.upsert("FAULT SoC", 1, 1.0, None);
        store.upsert("SoC", 1, 40.0, None);

        let mut ledger = FaultLedger::new(10);
        ledger.append(event(1, "SoC", FaultStatus::Resolved));
        ledger.append(event(2, "Motor Speed", FaultStatus::WarnHigh));

        let statuses = metric_statuses(&store, &ledger);
        assert_eq!(statuses.get("DC Voltage").map(String::as_str), Some("FAULT"));
        assert_eq!(statuses.get("Motor Temp").map(String::as_str), Some("OK"));
        assert_eq!(statuses.get("SoC").map(String::as_str), Some("OK"));
        assert_eq!(statuses.get("Motor Speed").map(String::as_str), Some("WARN"));
        assert_eq!(statuses.len(), 4);
    }

    #[test]
    fn test_flag_targets_use_canonical_names() {
        let mut store = MetricStore::new(10);
        store.upsert("FAULT Motor Temperature", 1, 1.0, None);
        store.upsert("FAULT Battery State of Charge", 1, 1.0, None);
        store.upsert("FAULT SoC", 1, 0.0, None);

        let mut ledger = FaultLedger::new(10);
        ledger.append(event(2, "Motor Temp", FaultStatus::Resolved));

        let statuses = metric_statuses(&store, &ledger);
        assert_eq!(statuses.get("Motor Temp").map(String::as_str), Some("OK"));
        assert_eq!(statuses.get("SoC").map(String::as_str), Some("FAULT"));
        assert!(!statuses.contains_key("Motor Temperature"));
        assert!(!statuses.contains_key("Battery State of Charge"));
        assert_eq!(statuses.len(), 2);
    }
}
