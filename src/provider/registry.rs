//! Registry mapping protocols to model factories.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{ChatModel, ModelFactory};
use crate::error::{AgentFlowError, Result};
use crate::models::ConnectionConfig;

/// Builds chat models for one family of protocols.
pub trait ProtocolFactory: Send + Sync {
    /// Protocol key(s) this factory handles (e.g., `&["openai", "azure"]`).
    fn protocols(&self) -> &[&str];

    fn create(&self, protocol: &str, connection: &ConnectionConfig) -> Result<Arc<dyn ChatModel>>;
}

/// [`ModelFactory`] backed by registered protocol factories.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, Arc<dyn ProtocolFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for all protocols it declares.
    pub fn register(&mut self, factory: Arc<dyn ProtocolFactory>) {
        for protocol in factory.protocols() {
            self.factories.insert(protocol.to_string(), factory.clone());
        }
    }

    /// List all registered protocols.
    pub fn protocols(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

#[async_trait]
impl ModelFactory for ProviderRegistry {
    fn supports_protocol(&self, protocol: &str) -> bool {
        self.factories.contains_key(protocol)
    }

    async fn create_chat_model(
        &self,
        protocol: &str,
        connection: &ConnectionConfig,
    ) -> Result<Arc<dyn ChatModel>> {
        self.factories
            .get(protocol)
            .ok_or_else(|| AgentFlowError::UnsupportedProtocol(protocol.to_string()))?
            .create(protocol, connection)
    }
}
