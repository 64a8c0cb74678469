//! Converts node lifecycle callbacks into the caller-facing event stream.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use super::collector::ToolOutputCollector;
use super::pipe::{pipe, PipeWriter};
use crate::error::{AgentFlowError, Result};
use crate::events::AgentEvent;
use crate::graph::{NodeKey, NodeValue, RunObserver, ToolFrameStream};
use crate::interrupt::InterruptInfo;
use crate::provider::MessageStream;
use crate::types::{Message, Role};

/// Content of the synthetic tool message sent right before an interrupt.
pub const DIRECT_REPLY_ACK: &str = "directly streaming reply";

/// Writes [`AgentEvent`]s for one run into its output pipe.
pub struct EventTranslator {
    writer: PipeWriter<Result<AgentEvent>>,
    checkpoint_id: String,
    return_directly: Arc<HashSet<String>>,
    tool_stream_buffer: usize,
}

impl EventTranslator {
    pub fn new(
        writer: PipeWriter<Result<AgentEvent>>,
        checkpoint_id: impl Into<String>,
        return_directly: Arc<HashSet<String>>,
        tool_stream_buffer: usize,
    ) -> Self {
        Self {
            writer,
            checkpoint_id: checkpoint_id.into(),
            return_directly,
            tool_stream_buffer,
        }
    }

    async fn emit(&self, event: Result<AgentEvent>) {
        if !self.writer.send(event).await {
            debug!(checkpoint_id = %self.checkpoint_id, "event reader dropped");
        }
    }

    /// Report how the run ended. Success emits nothing; an interrupt emits
    /// the acknowledgement and the `Interrupt` event; anything else is
    /// forwarded as the terminal error.
    pub async fn finish(&self, outcome: Result<()>) {
        let err = match outcome {
            Ok(()) => return,
            Err(err) => err,
        };
        match err {
            AgentFlowError::Interrupted(signal) => {
                let Some(info) = InterruptInfo::from_signal(self.checkpoint_id.clone(), &signal)
                else {
                    self.emit(Err(AgentFlowError::Internal(
                        "interrupt carried no pending tool call".to_string(),
                    )))
                    .await;
                    return;
                };
                info!(
                    checkpoint_id = %self.checkpoint_id,
                    tool_call_id = %info.tool_call_id,
                    kind = %info.kind,
                    "run suspended"
                );
                let tool_name = info
                    .payload()
                    .map(|payload| payload.tool_name().to_string())
                    .unwrap_or_default();
                let ack = Message::tool(info.tool_call_id.clone(), tool_name, DIRECT_REPLY_ACK);
                self.emit(Ok(AgentEvent::ToolsMessage(vec![ack]))).await;
                self.emit(Ok(AgentEvent::Interrupt(info))).await;
            }
            other => {
                error!(
                    checkpoint_id = %self.checkpoint_id,
                    "[AgentRunError] | node execute failed, err={other}"
                );
                self.emit(Err(other)).await;
            }
        }
    }

    /// Concatenate tool output per call and mirror a return-directly tool's
    /// chunks into a secondary stream.
    ///
    /// Only the first chunk of the round decides whether a return-directly
    /// tool is present. A round that ends in an error or a suspension yields
    /// `None`; the error goes to the mirror, if one was opened, and the run's
    /// terminal event reports it to the caller.
    async fn concat_tool_frames(&self, mut frames: ToolFrameStream) -> Option<Vec<Message>> {
        let mut collector = ToolOutputCollector::new();
        let mut first_check = true;
        let mut direct_index = None;
        let mut mirror: Option<PipeWriter<Result<Message>>> = None;

        while let Some(item) = frames.next().await {
            let frame = match item {
                Ok(frame) => frame,
                Err(err) => {
                    debug!(checkpoint_id = %self.checkpoint_id, error = %err, "tool round did not complete");
                    if let Some(writer) = mirror.take() {
                        self.mirror(&writer, Err(err)).await;
                    }
                    return None;
                }
            };
            for (index, slot) in frame.into_iter().enumerate() {
                let Some(chunk) = slot else {
                    continue;
                };
                if !self.return_directly.is_empty() {
                    if first_check {
                        first_check = false;
                        let name = chunk.tool_name.as_deref().unwrap_or_default();
                        if self.return_directly.contains(name) {
                            direct_index = Some(index);
                        }
                    }
                    if direct_index == Some(index) {
                        if mirror.is_none() {
                            let (writer, reader) = pipe(self.tool_stream_buffer);
                            self.emit(Ok(AgentEvent::ToolAsChatModelStream(reader.boxed())))
                                .await;
                            mirror = Some(writer);
                        }
                        if let Some(writer) = &mirror {
                            self.mirror(writer, Ok(chunk.clone())).await;
                        }
                    }
                }
                collector.push(index, chunk);
            }
        }
        drop(mirror);
        match collector.finish() {
            Ok(messages) => Some(messages),
            Err(err) => {
                warn!(checkpoint_id = %self.checkpoint_id, error = %err, "cannot merge tool output");
                None
            }
        }
    }

    async fn mirror(&self, writer: &PipeWriter<Result<Message>>, item: Result<Message>) {
        if !writer.send(item).await {
            debug!(checkpoint_id = %self.checkpoint_id, "tool mirror reader dropped");
        }
    }
}

/// Decode a suggestion node's output: a JSON array of strings, one
/// suggestion each. Anything else yields nothing.
pub fn decode_suggestions(message: &Message) -> Vec<Message> {
    if message.content.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<String>>(&message.content) {
        Ok(items) => items
            .into_iter()
            .map(|content| Message {
                role: message.role,
                content,
                ..Default::default()
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "suggestion output is not a JSON string array");
            Vec::new()
        }
    }
}

#[async_trait]
impl RunObserver for EventTranslator {
    async fn on_node_end(&self, node: NodeKey, output: &NodeValue) {
        match (node, output) {
            (NodeKey::KnowledgeRetrieve, NodeValue::Fragments(fragments)) => {
                if !fragments.is_empty() {
                    self.emit(Ok(AgentEvent::Knowledge(fragments.clone()))).await;
                }
            }
            (NodeKey::PreTools, NodeValue::Messages(messages)) => {
                for message in messages {
                    let event = if message.role == Role::Tool {
                        AgentEvent::ToolsMessage(vec![message.clone()])
                    } else {
                        AgentEvent::FunctionCall(message.clone())
                    };
                    self.emit(Ok(event)).await;
                }
            }
            (NodeKey::Suggest, NodeValue::Message(message)) => {
                for suggestion in decode_suggestions(message) {
                    self.emit(Ok(AgentEvent::Suggest(suggestion))).await;
                }
            }
            _ => {}
        }
    }

    async fn on_model_stream(&self, _node: NodeKey, stream: MessageStream) {
        self.emit(Ok(AgentEvent::ChatModelAnswer(stream))).await;
    }

    async fn on_tools_start(&self, message: &Message) {
        self.emit(Ok(AgentEvent::FunctionCall(message.clone()))).await;
    }

    async fn on_tool_stream(&self, frames: ToolFrameStream) {
        match self.concat_tool_frames(frames).await {
            Some(messages) if !messages.is_empty() => {
                self.emit(Ok(AgentEvent::ToolsMessage(messages))).await;
            }
            _ => {}
        }
    }
}
