// Summary statistics over a set of equipment records
use super::equipment::EquipmentRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_count: usize,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    #[serde(default)]
    pub type_distribution: BTreeMap<String, usize>,
}

impl SummaryStats {
    /// Reduce `records` to counts, rounded means and a per-type tally.
    ///
    /// Empty input yields all-zero means and an empty distribution.
    pub fn from_records(records: &[EquipmentRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let (mut flow, mut pressure, mut temperature) = (0.0, 0.0, 0.0);
        let mut type_distribution = BTreeMap::new();
        for record in records {
            flow += record.flowrate;
            pressure += record.pressure;
            temperature += record.temperature;
            *type_distribution.entry(record.kind.clone()).or_insert(0) += 1;
        }

        let count = records.len() as f64;
        Self {
            total_count: records.len(),
            avg_flowrate: round2(flow / count),
            avg_pressure: round2(pressure / count),
            avg_temperature: round2(temperature / count),
            type_distribution,
        }
    }
}

/// Round to two decimals, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to one decimal, halves away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
