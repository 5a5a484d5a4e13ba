// Dashboard domain model - what the presentation layer renders
use super::alarm::AlarmEvent;
use super::equipment::EquipmentRecord;
use super::summary::SummaryStats;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub dataset_id: Option<String>,
    pub filename: Option<String>,
    pub simulating: bool,
    pub records: Vec<EquipmentRecord>,
    pub summary: SummaryStats,
    pub alarms: Vec<AlarmEvent>,
}

impl DashboardView {
    pub fn empty(alarms: Vec<AlarmEvent>) -> Self {
        Self {
            dataset_id: None,
            filename: None,
            simulating: false,
            records: Vec::new(),
            summary: SummaryStats::default(),
            alarms,
        }
    }
}
