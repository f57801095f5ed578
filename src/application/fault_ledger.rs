// Fault ledger - Bounded, append-only record of fault lifecycle events
use crate::domain::fault::{FaultEvent, FaultStatus, Health};
use im::Vector;
use std::collections::HashMap;

/// Passive recorder: any status may follow any other for a given name.
/// Ordering between events is (timestamp, insertion), later insertion wins ties.
/// Events live in a persistent vector, so snapshots share them.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultLedger {
    events: Vector<FaultEvent>,
    capacity: usize,
}

impl FaultLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Vector::new(),
            capacity: capacity.max(1),
        }
    }

    /// Status is already a closed enum; only the name needs checking here.
    pub fn append(&mut self, event: FaultEvent) -> bool {
        if event.name.is_empty() {
            return false;
        }

        self.events.push_back(event);
        while self.events.len() > self.capacity {
            self.events.pop_front();
        }
        true
    }

    /// All retained events in insertion order.
    pub fn events(&self) -> impl Iterator<Item = &FaultEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Chronologically latest event per metric name.
    pub fn latest_by_name(&self) -> HashMap<&str, &FaultEvent> {
        let mut latest: HashMap<&str, (usize, &FaultEvent)> = HashMap::new();
        for (idx, event) in self.events.iter().enumerate() {
            latest
                .entry(event.name.as_str())
                .and_modify(|current| {
                    if (event.timestamp, idx) >= (current.1.timestamp, current.0) {
                        *current = (idx, event);
                    }
                })
                .or_insert((idx, event));
        }
        latest.into_iter().map(|(name, (_, e))| (name, e)).collect()
    }

    /// Latest event per name whose status is not `RESOLVED`, newest first.
    pub fn active_faults(&self) -> Vec<FaultEvent> {
        let mut active: Vec<FaultEvent> = self
            .latest_by_name()
            .into_values()
            .filter(|e| e.status != FaultStatus::Resolved)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.name.cmp(&b.name)));
        active
    }

    /// The `n` most recent events, newest first.
    pub fn recent_history(&self, n: usize) -> Vec<FaultEvent> {
        let mut ordered: Vec<(usize, &FaultEvent)> = self.events.iter().enumerate().collect();
        ordered.sort_by(|a, b| (b.1.timestamp, b.0).cmp(&(a.1.timestamp, a.0)));
        ordered.into_iter().take(n).map(|(_, e)| e.clone()).collect()
    }

    /// `None` when the ledger holds no event for `name`.
    pub fn health_of(&self, name: &str) -> Option<Health> {
        self.latest_by_name().get(name).map(|e| e.status.health())
    }
}
