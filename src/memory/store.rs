use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::kernel::config::StoreConfig;
use crate::kernel::path::Mapping;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serialization(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("missing partition key")]
    MissingKey,
}

/// Backing store for the durable attribute scope.
///
/// Retries and timeouts belong to implementations, not to callers.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Existing attributes for `key`; an unknown key reads as empty.
    async fn read(&self, key: &str) -> Result<Mapping, StoreError>;

    async fn write(&self, key: &str, attributes: Mapping) -> Result<(), StoreError>;
}

/// In-process store. Counts writes so callers can observe flush behaviour.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Mapping>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(key: &str, attributes: Mapping) -> Self {
        let store = Self::new();
        if let Ok(mut records) = store.records.lock() {
            records.insert(key.to_string(), attributes);
        }
        store
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn record(&self, key: &str) -> Option<Mapping> {
        self.records.lock().ok()?.get(key).cloned()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Mapping, StoreError> {
        let records = self
            .records
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(records.get(key).cloned().unwrap_or_default())
    }

    async fn write(&self, key: &str, attributes: Mapping) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        records.insert(key.to_string(), attributes);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// JSON file of rows `{<partition key>: key, <attributes name>: {...}}`.
pub struct FileStore {
    path: PathBuf,
    partition_key: String,
    attributes_name: String,
    // Serializes read-modify-write of the whole file.
    lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf, config: &StoreConfig) -> Self {
        Self {
            path,
            partition_key: config.partition_key.clone(),
            attributes_name: config.attributes_name.clone(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn load_rows(&self) -> Result<Vec<Value>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn matches(&self, row: &Value, key: &str) -> bool {
        row.get(&self.partition_key).and_then(Value::as_str) == Some(key)
    }
}

#[async_trait]
impl DurableStore for FileStore {
    async fn read(&self, key: &str) -> Result<Mapping, StoreError> {
        if key.is_empty() {
            return Err(StoreError::MissingKey);
        }
        let _guard = self.lock.lock().await;
        let rows = self.load_rows().await?;

        Ok(rows
            .iter()
            .find(|row| self.matches(row, key))
            .and_then(|row| row.get(&self.attributes_name))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default())
    }

    async fn write(&self, key: &str, attributes: Mapping) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::MissingKey);
        }
        let _guard = self.lock.lock().await;
        let mut rows = self.load_rows().await?;

        let mut row = Mapping::new();
        row.insert(self.partition_key.clone(), Value::String(key.to_string()));
        row.insert(self.attributes_name.clone(), Value::Object(attributes));

        match rows.iter_mut().find(|r| self.matches(r, key)) {
            Some(existing) => *existing = Value::Object(row),
            None => rows.push(Value::Object(row)),
        }

        let json = serde_json::to_string_pretty(&rows)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tokio::fs::write(&self.path, json).await?;
        debug!(path = %self.path.display(), "durable record written");
        Ok(())
    }
}
