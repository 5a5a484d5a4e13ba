// Dataset domain model - one completed import
use super::equipment::EquipmentRecord;
use super::summary::SummaryStats;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub timestamp: String,
    pub filename: String,
    pub data: Vec<EquipmentRecord>,
    pub summary: SummaryStats,
}

impl DatasetEntry {
    pub fn new(
        id: String,
        timestamp: String,
        filename: String,
        data: Vec<EquipmentRecord>,
        summary: SummaryStats,
    ) -> Self {
        Self {
            id,
            timestamp,
            filename,
            data,
            summary,
        }
    }
}

// Upstream backends key datasets by integer primary key
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
