// Remote dataset source - HTTP client for the upstream history/upload API
use crate::application::dataset_source::{DatasetSource, SourceError};
use crate::domain::dataset::DatasetEntry;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RemoteSource {
    base_url: String,
    client: reqwest::Client,
    capacity: usize,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Vec<DatasetEntry>,
}

impl RemoteSource {
    /// `capacity` bounds how many history entries are kept from upstream.
    pub fn new(base_url: String, timeout: Duration, capacity: usize) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Unreachable(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            capacity,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(SourceError::Status { status, body })
    }
}

fn transport(e: reqwest::Error) -> SourceError {
    if e.is_decode() {
        SourceError::Payload(e.to_string())
    } else {
        SourceError::Unreachable(e.to_string())
    }
}

/// Fill the gaps upstream payloads may leave: creation time, record ids, negative readings.
fn normalize(mut entry: DatasetEntry) -> DatasetEntry {
    if entry.timestamp.is_empty() {
        entry.timestamp = Utc::now().to_rfc3339();
    }
    for (index, record) in entry.data.iter_mut().enumerate() {
        if record.id.is_empty() {
            record.id = format!("eq-{}-{}", entry.id, index);
        }
        record.flowrate = record.flowrate.max(0.0);
        record.pressure = record.pressure.max(0.0);
        record.temperature = record.temperature.max(0.0);
    }
    entry
}

#[async_trait]
impl DatasetSource for RemoteSource {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn fetch_history(&self) -> Result<Vec<DatasetEntry>, SourceError> {
        let response = self
            .client
            .get(self.url("history"))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport)?;

        let payload = Self::check(response)
            .await?
            .json::<HistoryResponse>()
            .await
            .map_err(transport)?;

        tracing::debug!("Fetched {} history entries from {}", payload.history.len(), self.base_url);
        Ok(payload
            .history
            .into_iter()
            .take(self.capacity)
            .map(normalize)
            .collect())
    }

    async fn submit_dataset(
        &self,
        filename: &str,
        content: &str,
    ) -> Result<DatasetEntry, SourceError> {
        let part = reqwest::multipart::Part::text(content.to_string())
            .file_name(filename.to_string())
            .mime_str("text/csv")
            .map_err(transport)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        let entry = Self::check(response)
            .await?
            .json::<DatasetEntry>()
            .await
            .map_err(transport)?;

        tracing::info!("Uploaded {} to {} as dataset {}", filename, self.base_url, entry.id);
        Ok(normalize(entry))
    }
}
