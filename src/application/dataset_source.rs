// Dataset source - where history comes from and where uploads go
use crate::application::history_store::StoreError;
use crate::domain::dataset::DatasetEntry;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("dataset service unreachable: {0}")]
    Unreachable(String),

    #[error("dataset service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("dataset service sent an unexpected payload: {0}")]
    Payload(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The capability a session needs from its backing data: list history, submit an upload.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Short label for logs
    fn name(&self) -> &'static str;

    /// Stored datasets, newest first
    async fn fetch_history(&self) -> Result<Vec<DatasetEntry>, SourceError>;

    /// Process raw CSV content and record it in history
    async fn submit_dataset(&self, filename: &str, content: &str)
    -> Result<DatasetEntry, SourceError>;
}

/// Prefer `primary`; on any failure, warn and serve the request from `fallback`.
pub struct FallbackSource {
    primary: Arc<dyn DatasetSource>,
    fallback: Arc<dyn DatasetSource>,
}

impl FallbackSource {
    pub fn new(primary: Arc<dyn DatasetSource>, fallback: Arc<dyn DatasetSource>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl DatasetSource for FallbackSource {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn fetch_history(&self) -> Result<Vec<DatasetEntry>, SourceError> {
        match self.primary.fetch_history().await {
            Ok(history) => Ok(history),
            Err(e) => {
                tracing::warn!(
                    "{} history unavailable, using {}: {}",
                    self.primary.name(),
                    self.fallback.name(),
                    e
                );
                self.fallback.fetch_history().await
            }
        }
    }

    async fn submit_dataset(
        &self,
        filename: &str,
        content: &str,
    ) -> Result<DatasetEntry, SourceError> {
        match self.primary.submit_dataset(filename, content).await {
            Ok(entry) => Ok(entry),
            Err(e) => {
                tracing::warn!(
                    "{} upload of {} failed, processing with {}: {}",
                    self.primary.name(),
                    filename,
                    self.fallback.name(),
                    e
                );
                self.fallback.submit_dataset(filename, content).await
            }
        }
    }
}
