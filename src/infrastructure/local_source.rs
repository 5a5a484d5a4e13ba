// Offline dataset source - parse in-process, keep history in a blob store
use crate::application::dataset_source::{DatasetSource, SourceError};
use crate::application::history_store::HistoryStore;
use crate::application::ingest::build_dataset;
use crate::domain::dataset::DatasetEntry;
use async_trait::async_trait;

#[derive(Clone)]
pub struct LocalSource {
    history: HistoryStore,
}

impl LocalSource {
    pub fn new(history: HistoryStore) -> Self {
        Self { history }
    }
}

#[async_trait]
impl DatasetSource for LocalSource {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch_history(&self) -> Result<Vec<DatasetEntry>, SourceError> {
        Ok(self.history.all().await)
    }

    async fn submit_dataset(
        &self,
        filename: &str,
        content: &str,
    ) -> Result<DatasetEntry, SourceError> {
        let entry = build_dataset(filename, content);

        // Persistence failures are soft; the caller still gets the entry
        if let Err(e) = self.history.append(entry.clone()).await {
            tracing::warn!("Could not persist dataset {}: {}", entry.id, e);
        }

        tracing::info!(
            "Processed {} locally: {} records",
            filename,
            entry.summary.total_count
        );
        Ok(entry)
    }
}
