use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use lottery_core::{MappingTable, Participant};
use thiserror::Error;
use tokio::sync::RwLock;

/// Underlying cause of a store failure.
#[derive(Debug, Error)]
pub enum StoreIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Read failures are safe to retry from the top of the sequence; a write
/// failure after a successful draw must be surfaced to the caller, never
/// reported as success.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store read failed: {0}")]
    Read(#[source] StoreIoError),
    #[error("store write failed: {0}")]
    Write(#[source] StoreIoError),
}

/// Whole-table persistence for the assignment mapping. `load` returns `None`
/// when nothing has ever been saved; callers treat that as an empty table.
/// `save` replaces the whole blob, since several backends only offer
/// set-value semantics.
#[async_trait]
pub trait MappingStore: Send + Sync {
    async fn load(&self) -> Result<Option<MappingTable>, StoreError>;
    async fn save(&self, mapping: &MappingTable) -> Result<(), StoreError>;
}

/// Read-only source of the participant list. Re-read per request so an
/// externally refreshed roster is picked up without a restart.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    async fn load(&self) -> Result<Vec<Participant>, StoreError>;
}

/// JSON blob on local disk.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MappingStore for FileStore {
    async fn load(&self) -> Result<Option<MappingTable>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Read(err.into())),
        };
        // Malformed data is an error, not an empty table.
        let mapping = serde_json::from_slice(&bytes).map_err(|e| StoreError::Read(e.into()))?;
        Ok(Some(mapping))
    }

    async fn save(&self, mapping: &MappingTable) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(mapping).map_err(|e| StoreError::Write(e.into()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| StoreError::Write(e.into()))
    }
}

/// In-process store for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Option<MappingTable>>,
}

#[async_trait]
impl MappingStore for MemoryStore {
    async fn load(&self) -> Result<Option<MappingTable>, StoreError> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, mapping: &MappingTable) -> Result<(), StoreError> {
        *self.inner.write().await = Some(mapping.clone());
        Ok(())
    }
}

/// Roster read from a JSON array on disk.
pub struct FileRoster {
    path: PathBuf,
}

impl FileRoster {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RosterProvider for FileRoster {
    async fn load(&self) -> Result<Vec<Participant>, StoreError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| StoreError::Read(e.into()))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Read(e.into()))
    }
}

/// Fixed in-memory roster for tests.
pub struct StaticRoster {
    participants: Vec<Participant>,
}

impl StaticRoster {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self { participants }
    }
}

#[async_trait]
impl RosterProvider for StaticRoster {
    async fn load(&self) -> Result<Vec<Participant>, StoreError> {
        Ok(self.participants.clone())
    }
}
