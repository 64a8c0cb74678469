//! Chat model abstraction and protocol-based model construction.

pub mod registry;

pub use registry::{ProtocolFactory, ProviderRegistry};

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::ConnectionConfig;
use crate::types::{concat_messages, Message};

/// Stream of message chunks produced by a model.
pub type MessageStream = BoxStream<'static, Result<Message>>;

/// Tool definition sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A request sent to a chat model.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// A model able to answer chat requests and, when given tools, to request
/// tool calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Generate a response as a stream of chunks.
    async fn stream(&self, request: &ChatRequest) -> Result<MessageStream>;

    /// Generate a complete response.
    async fn generate(&self, request: &ChatRequest) -> Result<Message> {
        let chunks: Vec<Message> = self.stream(request).await?.try_collect().await?;
        concat_messages(&chunks)
    }
}

/// Creates chat models for the protocols it understands.
#[async_trait]
pub trait ModelFactory: Send + Sync {
    fn supports_protocol(&self, protocol: &str) -> bool;

    async fn create_chat_model(
        &self,
        protocol: &str,
        connection: &ConnectionConfig,
    ) -> Result<Arc<dyn ChatModel>>;
}
