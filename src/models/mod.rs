//! Model metadata and lookup.

pub mod capabilities;

pub use capabilities::ModelCapabilities;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Connection settings handed to the model factory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Provider-side model name.
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Everything known about a configured model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    pub model_id: String,
    /// Wire protocol the model speaks, e.g. `openai` or `ark`.
    pub protocol: String,
    #[serde(default)]
    pub capabilities: ModelCapabilities,
    #[serde(default)]
    pub connection: ConnectionConfig,
}

/// Looks up model metadata by id.
#[async_trait]
pub trait ModelManager: Send + Sync {
    async fn get_model(&self, model_id: &str) -> Result<Option<ModelMeta>>;
}

/// In-memory model catalogue.
#[derive(Debug, Clone, Default)]
pub struct StaticModelManager {
    models: HashMap<String, ModelMeta>,
}

impl StaticModelManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, meta: ModelMeta) -> Self {
        self.models.insert(meta.model_id.clone(), meta);
        self
    }
}

#[async_trait]
impl ModelManager for StaticModelManager {
    async fn get_model(&self, model_id: &str) -> Result<Option<ModelMeta>> {
        Ok(self.models.get(model_id).cloned())
    }
}
