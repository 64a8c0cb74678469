//! What a suspended run leaves in the checkpoint store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{NodeKey, NodeValue};
use crate::error::{AgentFlowError, Result};
use crate::interrupt::InterruptSignal;
use crate::services::CheckpointStore;

/// Outputs of the nodes that finished before the suspension, plus the
/// suspending node's own signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSnapshot {
    pub completed: BTreeMap<NodeKey, NodeValue>,
    pub signal: InterruptSignal,
}

impl CheckpointSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| {
            AgentFlowError::CheckpointStore(format!("corrupt checkpoint: {e}"))
        })
    }

    pub async fn load(store: &dyn CheckpointStore, checkpoint_id: &str) -> Result<Self> {
        let bytes = store
            .get(checkpoint_id)
            .await?
            .ok_or_else(|| AgentFlowError::CheckpointNotFound(checkpoint_id.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub async fn save(&self, store: &dyn CheckpointStore, checkpoint_id: &str) -> Result<()> {
        store.put(checkpoint_id, self.to_bytes()?).await
    }
}
