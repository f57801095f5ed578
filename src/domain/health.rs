// Subsystem health classification
use serde::Serialize;

/// Ordered `Neutral < Ok < Warn < Fault` for worst-of aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Neutral,
    Ok,
    Warn,
    Fault,
}

impl Severity {
    /// Reads a free-form status label such as `FAULT_HIGH`, `OK` or `Error`.
    pub fn from_status_text(status: &str) -> Self {
        let upper = status.to_uppercase();
        if upper.contains("FAULT") || upper.contains("ERROR") {
            Severity::Fault
        } else if upper.contains("WARN") {
            Severity::Warn
        } else if upper.starts_with("OK") {
            Severity::Ok
        } else {
            Severity::Neutral
        }
    }

    /// Severity of a `"<name> <status>"` label; falls back to keywords anywhere
    /// in the label when the status itself says nothing.
    pub fn from_label(status: Option<&str>, label: &str) -> Self {
        let severity = status.map(Severity::from_status_text).unwrap_or(Severity::Neutral);
        if severity != Severity::Neutral {
            return severity;
        }
        if label.contains("FAULT") {
            Severity::Fault
        } else if label.contains("WARN") {
            Severity::Warn
        } else {
            Severity::Neutral
        }
    }

    pub fn escalate(self, next: Severity) -> Severity {
        self.max(next)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Battery,
    Motor,
    Brakes,
    Comms,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Battery,
        Category::Motor,
        Category::Brakes,
        Category::Comms,
    ];

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::Battery => &["BATTERY", "SOC", "STATE OF CHARGE", "VOLT"],
            Category::Motor => &["MOTOR", "INVERTER", "TORQUE", "VELOCITY", "SPEED"],
            Category::Brakes => &["BRAKE", "BREAK", "PRESSURE", "PEDAL"],
            // "CAN " keeps words like "SCAN" and "CANCEL" out of comms
            Category::Comms => &["COMMS", "COMMUNICATION", "VCU", "NMT", "CAN "],
        }
    }

    /// Categories whose keywords appear in `label`. Matching is case-insensitive.
    pub fn classify(label: &str) -> Vec<Category> {
        let upper = label.to_uppercase();
        Category::ALL
            .into_iter()
            .filter(|c| c.keywords().iter().any(|k| upper.contains(k)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryHealth {
    pub battery: Severity,
    pub motor: Severity,
    pub brakes: Severity,
    pub comms: Severity,
}

impl Default for CategoryHealth {
    fn default() -> Self {
        Self {
            battery: Severity::Ok,
            motor: Severity::Ok,
            brakes: Severity::Ok,
            comms: Severity::Ok,
        }
    }
}

impl CategoryHealth {
    pub fn get(&self, category: Category) -> Severity {
        match category {
            Category::Battery => self.battery,
            Category::Motor => self.motor,
            Category::Brakes => self.brakes,
            Category::Comms => self.comms,
        }
    }

    pub fn escalate(&mut self, category: Category, severity: Severity) {
        let slot = match category {
            Category::Battery => &mut self.battery,
            Category::Motor => &mut self.motor,
            Category::Brakes => &mut self.brakes,
            Category::Comms => &mut self.comms,
        };
        *slot = slot.escalate(severity);
    }

    pub fn worst(&self) -> Severity {
        Category::ALL
            .into_iter()
            .map(|c| self.get(c))
            .max()
            .unwrap_or(Severity::Neutral)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub overall: Severity,
    pub categories: CategoryHealth,
}
