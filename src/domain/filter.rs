// Declarative record filter
use super::equipment::EquipmentRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub min_flow: f64,
    pub max_flow: f64,
    pub min_pressure: f64,
    pub max_pressure: f64,
    /// Alarm threshold for pressure; independent of the display bounds.
    pub pressure_threshold: f64,
    /// Empty means every type passes.
    #[serde(default)]
    pub selected_types: BTreeSet<String>,
    /// Case-insensitive substring matched against name or type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            min_flow: 0.0,
            max_flow: 3000.0,
            min_pressure: 0.0,
            max_pressure: 100.0,
            pressure_threshold: 40.0,
            selected_types: BTreeSet::new(),
            search: None,
        }
    }
}

impl FilterSpec {
    pub fn matches(&self, record: &EquipmentRecord) -> bool {
        let in_flow = record.flowrate >= self.min_flow && record.flowrate <= self.max_flow;
        let in_pressure =
            record.pressure >= self.min_pressure && record.pressure <= self.max_pressure;
        let type_ok =
            self.selected_types.is_empty() || self.selected_types.contains(&record.kind);

        in_flow && in_pressure && type_ok && self.matches_search(record)
    }

    fn matches_search(&self, record: &EquipmentRecord) -> bool {
        let term = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => term.to_lowercase(),
            _ => return true,
        };
        record.name.to_lowercase().contains(&term) || record.kind.to_lowercase().contains(&term)
    }

    /// Keep the records that pass, in their original order.
    pub fn apply(&self, records: &[EquipmentRecord]) -> Vec<EquipmentRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}
