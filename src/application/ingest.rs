// Ingest use case - CSV text to a dataset entry
use crate::domain::dataset::DatasetEntry;
use crate::domain::equipment::EquipmentRecord;
use crate::domain::summary::SummaryStats;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub const SAMPLE_FILENAME: &str = "sample_equipment_data.csv";

pub const SAMPLE_CSV: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature
Centrifugal Pump A,Pump,450.5,12.4,85.0
Heat Exchanger X1,Heat Exchanger,1200.0,4.5,145.2
Storage Tank T101,Tank,0.0,1.2,25.0
Reactor R-202,Reactor,850.0,45.0,210.5
Control Valve V-01,Valve,320.4,15.8,40.0
Distillation Column D1,Column,2500.0,2.5,180.0
Centrifugal Pump B,Pump,480.2,13.1,88.5
Reactor R-203,Reactor,890.0,42.5,215.0";

const DEFAULT_NAME: &str = "Unknown";
const DEFAULT_TYPE: &str = "General";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported file {filename}: only .csv files are accepted")]
    UnsupportedFile { filename: String },

    #[error("file {filename} could not be read as text")]
    Unreadable { filename: String },
}

/// Reject uploads whose name does not carry a `.csv` extension.
pub fn check_extension(filename: &str) -> Result<(), IngestError> {
    if filename.to_ascii_lowercase().ends_with(".csv") {
        Ok(())
    } else {
        Err(IngestError::UnsupportedFile {
            filename: filename.to_string(),
        })
    }
}

/// Decode raw upload bytes; anything that is not UTF-8 counts as unreadable.
pub fn decode_upload(filename: &str, bytes: &[u8]) -> Result<String, IngestError> {
    check_extension(filename)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| IngestError::Unreadable {
        filename: filename.to_string(),
    })
}

/// Parse flat comma-separated text into records.
///
/// The first non-empty line is a header and is skipped without inspection.
/// Malformed cells never fail the import: blank names and types get
/// placeholders and numeric cells that do not parse become `0.0`.
pub fn parse_records(content: &str, generated_at: DateTime<Utc>) -> Vec<EquipmentRecord> {
    let stamp = generated_at.timestamp_millis();

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .skip(1)
        .enumerate()
        .map(|(index, line)| {
            let cols: Vec<&str> = line.split(',').map(str::trim).collect();
            let col = |i: usize| cols.get(i).copied().unwrap_or("");

            EquipmentRecord::new(
                format!("eq-{}-{}", stamp, index),
                text_or(col(0), DEFAULT_NAME),
                text_or(col(1), DEFAULT_TYPE),
                parse_measurement(col(2)),
                parse_measurement(col(3)),
                parse_measurement(col(4)),
            )
        })
        .collect()
}

fn text_or(cell: &str, fallback: &str) -> String {
    if cell.is_empty() {
        fallback.to_string()
    } else {
        cell.to_string()
    }
}

/// Permissive numeric cell: unparsable, non-finite or negative values read as zero.
pub fn parse_measurement(cell: &str) -> f64 {
    match cell.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value.max(0.0),
        _ => 0.0,
    }
}

/// Run the full pipeline: parse, summarize and wrap as a new history entry.
pub fn build_dataset(filename: &str, content: &str) -> DatasetEntry {
    let now = Utc::now();
    let data = parse_records(content, now);
    let summary = SummaryStats::from_records(&data);

    tracing::debug!(
        "Parsed {} records from {} ({} types)",
        data.len(),
        filename,
        summary.type_distribution.len()
    );

    DatasetEntry::new(
        format!("ds-{}", uuid::Uuid::new_v4()),
        now.to_rfc3339(),
        filename.to_string(),
        data,
        summary,
    )
}
