// History store - bounded, newest-first list of processed datasets
use crate::domain::dataset::DatasetEntry;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

pub const DEFAULT_STORAGE_KEY: &str = "chem_equip_history";
pub const DEFAULT_CAPACITY: usize = 5;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Opaque keyed storage for serialized blobs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn BlobStore>,
    key: String,
    capacity: usize,
    write_lock: Arc<Mutex<()>>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn BlobStore>, key: impl Into<String>, capacity: usize) -> Self {
        Self {
            store,
            key: key.into(),
            capacity,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Persisted history, newest first. Missing or unreadable storage reads as empty.
    pub async fn all(&self) -> Vec<DatasetEntry> {
        let raw = match self.store.load(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read history blob {}: {}", self.key, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<DatasetEntry>>(&raw) {
            Ok(mut entries) => {
                entries.truncate(self.capacity);
                entries
            }
            Err(e) => {
                tracing::warn!("Discarding corrupt history blob {}: {}", self.key, e);
                Vec::new()
            }
        }
    }

    /// Prepend `entry`, evict past capacity, persist, and return the new list.
    pub async fn append(&self, entry: DatasetEntry) -> Result<Vec<DatasetEntry>, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.all().await;
        entries.insert(0, entry);
        entries.truncate(self.capacity);

        let blob = serde_json::to_string(&entries)?;
        self.store.save(&self.key, &blob).await?;

        tracing::debug!("History now holds {} entries", entries.len());
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ingest::build_dataset;
    use crate::infrastructure::blob_store::MemoryBlobStore;

    fn store() -> (Arc<MemoryBlobStore>, HistoryStore) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let history = HistoryStore::new(blobs.clone(), DEFAULT_STORAGE_KEY, DEFAULT_CAPACITY);
        (blobs, history)
    }

    #[tokio::test]
    async fn test_empty_storage_reads_as_empty() {
        let (_, history) = store();
        assert!(history.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_storage_reads_as_empty() {
        let (blobs, history) = store();
        blobs.save(DEFAULT_STORAGE_KEY, "{not json").await.unwrap();
        assert!(history.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_append_is_bounded_and_newest_first() {
        let (_, history) = store();

        let mut last_id = String::new();
        for i in 0..8 {
            let entry = build_dataset(&format!("batch-{}.csv", i), "h\nPump,Pump,1,2,3");
            last_id = entry.id.clone();
            let entries = history.append(entry).await.unwrap();
            assert!(entries.len() <= DEFAULT_CAPACITY);
            assert_eq!(entries[0].id, last_id);
        }

        let entries = history.all().await;
        assert_eq!(entries.len(), DEFAULT_CAPACITY);
        assert_eq!(entries[0].id, last_id);
        assert_eq!(entries[0].filename, "batch-7.csv");
        assert_eq!(entries[4].filename, "batch-3.csv");
    }
}
