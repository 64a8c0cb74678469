//! A small DAG runtime: nodes, edges, join-on-all-predecessors scheduling.

pub mod builder;
pub mod checkpoint;
mod executor;

pub use builder::{CompiledGraph, GraphBuilder};
pub use checkpoint::CheckpointSnapshot;
pub use executor::ResumePoint;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio_util::sync::CancellationToken;

use crate::error::{AgentFlowError, Result};
use crate::interrupt::ResumeOptions;
use crate::provider::MessageStream;
use crate::services::RetrievedFragment;
use crate::types::Message;

/// Identifies a node of the agent graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKey {
    PersonaRender,
    PromptVariables,
    KnowledgeRetrieve,
    KnowledgePack,
    PreTools,
    PromptTemplate,
    ChatModel,
    React,
    Suggest,
}

/// Value produced by a node and handed to its successors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NodeValue {
    Empty,
    Text(String),
    Variables(BTreeMap<String, String>),
    Fragments(Vec<RetrievedFragment>),
    Messages(Vec<Message>),
    Message(Message),
}

/// Outputs of a node's predecessors.
#[derive(Debug, Clone, Default)]
pub struct NodeInputs {
    values: BTreeMap<NodeKey, NodeValue>,
}

impl NodeInputs {
    pub fn new(values: BTreeMap<NodeKey, NodeValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: NodeKey) -> Option<&NodeValue> {
        self.values.get(&key)
    }

    pub fn text(&self, key: NodeKey) -> Result<&str> {
        match self.values.get(&key) {
            Some(NodeValue::Text(text)) => Ok(text),
            other => Err(unexpected(key, "text", other)),
        }
    }

    pub fn variables(&self, key: NodeKey) -> Result<&BTreeMap<String, String>> {
        match self.values.get(&key) {
            Some(NodeValue::Variables(values)) => Ok(values),
            other => Err(unexpected(key, "variables", other)),
        }
    }

    pub fn messages(&self, key: NodeKey) -> Result<&[Message]> {
        match self.values.get(&key) {
            Some(NodeValue::Messages(messages)) => Ok(messages),
            other => Err(unexpected(key, "messages", other)),
        }
    }

    pub fn message(&self, key: NodeKey) -> Result<&Message> {
        match self.values.get(&key) {
            Some(NodeValue::Message(message)) => Ok(message),
            other => Err(unexpected(key, "message", other)),
        }
    }

    /// The output of whichever of `keys` is present first.
    pub fn first_of(&self, keys: &[NodeKey]) -> Option<(NodeKey, &NodeValue)> {
        keys.iter()
            .find_map(|key| self.values.get(key).map(|value| (*key, value)))
    }
}

fn unexpected(key: NodeKey, expected: &str, found: Option<&NodeValue>) -> AgentFlowError {
    AgentFlowError::InvalidGraph(match found {
        None => format!("missing input from {key}"),
        Some(_) => format!("input from {key} is not {expected}"),
    })
}

/// Per-tool-call chunks emitted together; slot `i` belongs to the call at
/// index `i` of the assistant message.
pub type ToolFrame = Vec<Option<Message>>;

/// Tool output of one round. A round that fails or suspends ends with a
/// single `Err` item instead of closing cleanly.
pub type ToolFrameStream = BoxStream<'static, Result<ToolFrame>>;

/// Typed hooks into a run. Every method has a no-op default.
#[async_trait]
pub trait RunObserver: Send + Sync {
    async fn on_node_start(&self, _node: NodeKey) {}

    async fn on_node_end(&self, _node: NodeKey, _output: &NodeValue) {}

    /// A model node began streaming its answer.
    async fn on_model_stream(&self, _node: NodeKey, _stream: MessageStream) {}

    /// The loop node is about to execute the calls of `message`.
    async fn on_tools_start(&self, _message: &Message) {}

    /// Streamed tool output; the stream ends once every call has finished,
    /// or with an `Err` when the round failed or suspended.
    async fn on_tool_stream(&self, _frames: ToolFrameStream) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

#[async_trait]
impl RunObserver for NoopObserver {}

/// Resume data handed to the node that suspended.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeResume {
    /// Snapshot the node stored when it suspended.
    pub state: serde_json::Value,
    pub tool_call_id: String,
    pub options: Option<ResumeOptions>,
}

/// Run-scoped context shared by all nodes.
#[derive(Clone)]
pub struct NodeContext {
    pub checkpoint_id: String,
    pub cancel: CancellationToken,
    pub observer: Arc<dyn RunObserver>,
    /// Set only for the node being resumed.
    pub resume: Option<NodeResume>,
}

impl NodeContext {
    pub fn new(checkpoint_id: impl Into<String>, observer: Arc<dyn RunObserver>) -> Self {
        Self {
            checkpoint_id: checkpoint_id.into(),
            cancel: CancellationToken::new(),
            observer,
            resume: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl std::fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("checkpoint_id", &self.checkpoint_id)
            .field("resume", &self.resume)
            .finish_non_exhaustive()
    }
}

/// A unit of work in the graph.
#[async_trait]
pub trait Node: Send + Sync {
    async fn run(&self, inputs: NodeInputs, ctx: &NodeContext) -> Result<NodeValue>;
}
