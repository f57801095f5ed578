// MQTT-style topic filter matching

/// A subscription filter such as `wesmo/telemetry/#` or `car/+/faults`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilter {
    levels: Vec<String>,
}

impl TopicFilter {
    pub fn new(filter: &str) -> Self {
        Self {
            levels: filter.split('/').map(str::to_string).collect(),
        }
    }

    /// `+` matches exactly one level; a trailing `#` matches the parent level
    /// and anything below it.
    pub fn matches(&self, topic: &str) -> bool {
        let mut topic_levels = topic.split('/');

        for (idx, level) in self.levels.iter().enumerate() {
            if level == "#" && idx == self.levels.len() - 1 {
                return true;
            }
            match topic_levels.next() {
                Some(t) if level == "+" || level == t => {}
                _ => return false,
            }
        }

        topic_levels.next().is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TopicFilters {
    filters: Vec<TopicFilter>,
}

impl TopicFilters {
    pub fn new<S: AsRef<str>>(filters: &[S]) -> Self {
        Self {
            filters: filters.iter().map(|f| TopicFilter::new(f.as_ref())).collect(),
        }
    }

    pub fn accepts(&self, topic: &str) -> bool {
        self.filters.iter().any(|f| f.matches(topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_level_wildcard() {
        let filter = TopicFilter::new("wesmo/telemetry/#");
        assert!(filter.matches("wesmo/telemetry"));
        assert!(filter.matches("wesmo/telemetry/bms"));
        assert!(filter.matches("wesmo/telemetry/bms/cell/3"));
        assert!(!filter.matches("wesmo/faults"));
        assert!(!filter.matches("wesmo"));
    }

    #[test]
    fn test_single_level_wildcard() {
        let filter = TopicFilter::new("car/+/faults");
        assert!(filter.matches("car/mc/faults"));
        assert!(!filter.matches("car/faults"));
        assert!(!filter.matches("car/mc/x/faults"));
    }

    #[test]
    fn test_exact() {
        let filters = TopicFilters::new(&["wesmo/faults", "wesmo/telemetry/#"]);
        assert!(filters.accepts("wesmo/faults"));
        assert!(!filters.accepts("wesmo/faults/extra"));
        assert!(filters.accepts("wesmo/telemetry"));
        assert!(!filters.accepts("/wesmo-data"));
    }
}
