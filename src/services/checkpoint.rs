//! Checkpoint persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;

/// Stores opaque run snapshots keyed by checkpoint id.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Vec<u8>>>;

    async fn put(&self, id: &str, state: Vec<u8>) -> Result<()>;

    /// Removing an absent id is not an error.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Process-local checkpoint store.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.entries.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn get(&self, id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn put(&self, id: &str, state: Vec<u8>) -> Result<()> {
        self.entries.write().await.insert(id.to_string(), state);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.entries.write().await.remove(id);
        Ok(())
    }
}
