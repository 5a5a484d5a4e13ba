// Threshold alarm domain model
use super::equipment::Measurement;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmEvent {
    pub id: String,
    pub timestamp: String,
    pub equipment_name: String,
    pub parameter: Measurement,
    pub value: f64,
    pub severity: Severity,
}

/// Classify an upward crossing of `threshold` between two consecutive samples.
///
/// Returns `None` unless `previous <= threshold < next`.
pub fn classify_crossing(
    previous: f64,
    next: f64,
    threshold: f64,
    critical_margin: f64,
) -> Option<Severity> {
    if previous > threshold || next <= threshold {
        return None;
    }
    if next > threshold + critical_margin {
        Some(Severity::Critical)
    } else {
        Some(Severity::Warning)
    }
}

/// Most-recent-first list of raised alarms, bounded in length.
#[derive(Debug, Clone)]
pub struct AlarmLog {
    events: VecDeque<AlarmEvent>,
    capacity: usize,
}

impl AlarmLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn raise(&mut self, event: AlarmEvent) {
        self.events.push_front(event);
        self.events.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn snapshot(&self) -> Vec<AlarmEvent> {
        self.events.iter().cloned().collect()
    }
}
