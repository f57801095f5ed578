// Producer name and unit normalization

/// Known producer-side spellings mapped to canonical metric names.
///
/// Exact, case-sensitive keys. Entries are only ever added: removing one would
/// split a metric's history in two. No canonical name may appear as a key.
const METRIC_ALIASES: &[(&str, &str)] = &[
    ("Break Pressure Front", "Brake Pressure Front"),
    ("Break Pressure Rear", "Brake Pressure Rear"),
    ("Break-Pressure-Front", "Brake Pressure Front"),
    ("Break-Pressure-Rear", "Brake Pressure Rear"),
    ("Battery Voltage", "DC Voltage"),
    ("battery voltage", "DC Voltage"),
    ("Pack Voltage", "DC Voltage"),
    ("Pack Current", "Battery Current"),
    ("battery current", "Battery Current"),
    ("Battery State of Charge", "SoC"),
    ("battery state of charge", "SoC"),
    ("soc", "SoC"),
    ("SOC", "SoC"),
    ("Motor RPM", "Motor Speed"),
    ("motor rpm", "Motor Speed"),
    ("motor speed", "Motor Speed"),
    ("Controller Temp", "Motor Temp"),
    ("Controller Temperature", "Motor Temp"),
    ("controller temp", "Motor Temp"),
    ("Motor Temperature", "Motor Temp"),
    ("motor temperature", "Motor Temp"),
];

const UNIT_ALIASES: &[(&str, &str)] = &[
    ("c", "degC"),
    ("C", "degC"),
    ("°C", "degC"),
    ("degc", "degC"),
];

/// Canonical name for `raw`; unknown names pass through unchanged.
pub fn normalize(raw: &str) -> &str {
    METRIC_ALIASES
        .iter()
        .find(|(alias, _)| *alias == raw)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(raw)
}

pub fn normalize_unit(raw: &str) -> &str {
    UNIT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == raw)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(raw)
}
