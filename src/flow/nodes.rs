//! Prompt-side nodes and the bare model node.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use crate::error::{AgentFlowError, Result};
use crate::graph::{Node, NodeContext, NodeInputs, NodeKey, NodeValue};
use crate::prompt::{compose_messages, render_persona, PromptParts, CURRENT_TIME_VARIABLE};
use crate::provider::{ChatModel, ChatRequest};
use crate::retriever;
use crate::services::KnowledgeService;
use crate::stream::unbounded_pipe;
use crate::types::{concat_messages, KnowledgeSettings, Message, ModelRef, SuggestReplyConfig, SuggestReplyMode};

pub(crate) struct PersonaRenderNode {
    pub persona: String,
    pub values: BTreeMap<String, String>,
}

#[async_trait]
impl Node for PersonaRenderNode {
    async fn run(&self, _inputs: NodeInputs, _ctx: &NodeContext) -> Result<NodeValue> {
        Ok(NodeValue::Text(render_persona(&self.persona, &self.values)))
    }
}

/// Publishes the merged variable values plus the current time.
pub(crate) struct PromptVariablesNode {
    pub values: BTreeMap<String, String>,
}

#[async_trait]
impl Node for PromptVariablesNode {
    async fn run(&self, _inputs: NodeInputs, _ctx: &NodeContext) -> Result<NodeValue> {
        let mut values = self.values.clone();
        values.insert(
            CURRENT_TIME_VARIABLE.to_string(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S %A").to_string(),
        );
        Ok(NodeValue::Variables(values))
    }
}

pub(crate) struct KnowledgeRetrieveNode {
    pub service: Arc<dyn KnowledgeService>,
    pub settings: KnowledgeSettings,
    pub query: String,
    pub history: Vec<Message>,
}

#[async_trait]
impl Node for KnowledgeRetrieveNode {
    async fn run(&self, _inputs: NodeInputs, _ctx: &NodeContext) -> Result<NodeValue> {
        let fragments =
            retriever::retrieve(self.service.as_ref(), &self.settings, &self.query, &self.history)
                .await?;
        Ok(NodeValue::Fragments(fragments))
    }
}

pub(crate) struct KnowledgePackNode;

#[async_trait]
impl Node for KnowledgePackNode {
    async fn run(&self, inputs: NodeInputs, _ctx: &NodeContext) -> Result<NodeValue> {
        match inputs.get(NodeKey::KnowledgeRetrieve) {
            Some(NodeValue::Fragments(fragments)) => Ok(NodeValue::Text(retriever::pack(fragments))),
            _ => Err(AgentFlowError::InvalidGraph(format!(
                "missing input from {}",
                NodeKey::KnowledgeRetrieve
            ))),
        }
    }
}

/// Joins persona, variables, knowledge and pre-call tool turns into the
/// message list for the main node. History and input arrive already
/// truncated and adapted to the model.
pub(crate) struct PromptTemplateNode {
    pub history: Vec<Message>,
    pub input: Message,
}

#[async_trait]
impl Node for PromptTemplateNode {
    async fn run(&self, inputs: NodeInputs, _ctx: &NodeContext) -> Result<NodeValue> {
        let parts = PromptParts {
            persona: inputs.text(NodeKey::PersonaRender)?,
            knowledge: inputs.text(NodeKey::KnowledgePack)?,
            variables: inputs.variables(NodeKey::PromptVariables)?,
            history: &self.history,
            pre_tool_messages: inputs.messages(NodeKey::PreTools)?,
            input: Some(&self.input),
        };
        Ok(NodeValue::Messages(compose_messages(&parts)))
    }
}

/// Single model call, used when the agent has no tools.
pub(crate) struct ChatModelNode {
    pub model: Arc<dyn ChatModel>,
    pub model_ref: ModelRef,
}

#[async_trait]
impl Node for ChatModelNode {
    async fn run(&self, inputs: NodeInputs, ctx: &NodeContext) -> Result<NodeValue> {
        let request = ChatRequest {
            messages: inputs.messages(NodeKey::PromptTemplate)?.to_vec(),
            tools: Vec::new(),
            temperature: self.model_ref.temperature,
            max_tokens: self.model_ref.max_tokens,
        };
        let answer = stream_answer(self.model.as_ref(), &request, NodeKey::ChatModel, ctx).await?;
        Ok(NodeValue::Message(answer))
    }
}

/// Stream a model answer, handing a mirror of the chunks to the observer,
/// and return the concatenated message.
///
/// The mirror is unbounded so a caller that never drains it cannot stall
/// the run.
pub(crate) async fn stream_answer(
    model: &dyn ChatModel,
    request: &ChatRequest,
    node: NodeKey,
    ctx: &NodeContext,
) -> Result<Message> {
    let mut stream = model.stream(request).await?;
    let (mirror, reader) = unbounded_pipe();
    ctx.observer.on_model_stream(node, reader.boxed()).await;

    let forward = |item: Result<Message>| {
        if mirror.send(item).is_err() {
            debug!(checkpoint_id = %ctx.checkpoint_id, node = %node, "answer reader dropped");
        }
    };

    let mut chunks = Vec::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => {
                forward(Ok(chunk.clone()));
                chunks.push(chunk);
            }
            Err(err) => {
                forward(Err(AgentFlowError::Stream(err.to_string())));
                return Err(err);
            }
        }
    }
    if chunks.is_empty() {
        return Ok(Message::assistant(""));
    }
    concat_messages(&chunks)
}

const SUGGEST_PROMPT: &str = "Suggest three short questions the user is likely to ask next, \
based on the conversation below. Answer with a JSON array of strings and nothing else.";

/// Generates follow-up suggestions from the main node's answer.
pub(crate) struct SuggestNode {
    pub model: Arc<dyn ChatModel>,
    pub config: SuggestReplyConfig,
    pub input: Message,
}

impl SuggestNode {
    fn system_prompt(&self) -> String {
        match (&self.config.mode, self.config.custom_persona.as_deref()) {
            (SuggestReplyMode::Custom, Some(persona)) if !persona.trim().is_empty() => {
                format!("{SUGGEST_PROMPT}\n\nFollow these instructions as well:\n{}", persona.trim())
            }
            _ => SUGGEST_PROMPT.to_string(),
        }
    }
}

#[async_trait]
impl Node for SuggestNode {
    async fn run(&self, inputs: NodeInputs, _ctx: &NodeContext) -> Result<NodeValue> {
        let answer = match inputs.first_of(&[NodeKey::React, NodeKey::ChatModel]) {
            Some((_, NodeValue::Message(message))) => message.text(),
            _ => {
                return Err(AgentFlowError::InvalidGraph(
                    "suggestion node has no main answer to follow".to_string(),
                ))
            }
        };
        let request = ChatRequest {
            messages: vec![
                Message::system(self.system_prompt()),
                Message::user(format!(
                    "User: {}\nAssistant: {answer}",
                    self.input.text()
                )),
            ],
            ..Default::default()
        };
        let message = self.model.generate(&request).await?;
        Ok(NodeValue::Message(message))
    }
}
