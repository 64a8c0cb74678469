//! The reasoning/acting loop: call the model, run the tools it asks for,
//! feed the results back, repeat until it answers without tool calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::nodes::stream_answer;
use crate::error::{AgentFlowError, Result};
use crate::graph::{Node, NodeContext, NodeInputs, NodeKey, NodeValue, ToolFrame};
use crate::interrupt::{InterruptSignal, PendingInterrupt, ResumeOptions, ToolInterrupt};
use crate::provider::{ChatModel, ChatRequest};
use crate::stream::{pipe, ToolOutputCollector};
use crate::tools::{validate_arguments, Tool, ToolArguments, ToolExecutionContext, ToolSet};
use crate::types::{AgentIdentity, AgentState, Message, ModelRef, ToolCall};

/// What the loop stores in the checkpoint when a tool suspends.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoopSnapshot {
    state: AgentState,
    iteration: usize,
    /// Assistant message whose calls were executing.
    pending: Message,
    /// Results of calls that finished before the suspension, by call id.
    completed: BTreeMap<String, Message>,
}

/// One tool-call round carried into the tool phase.
struct Round {
    assistant: Message,
    completed: BTreeMap<String, Message>,
    resume: Option<ResumeOptions>,
}

enum CallEvent {
    Chunk(Message),
    Interrupted(ToolInterrupt),
    Failed(AgentFlowError),
}

enum CallOutcome {
    Done(Message),
    Interrupted(ToolInterrupt),
}

pub(crate) struct ReactNode {
    pub model: Arc<dyn ChatModel>,
    pub model_ref: ModelRef,
    pub tools: ToolSet,
    pub max_iterations: usize,
    pub user_id: String,
    pub identity: AgentIdentity,
    pub input: Message,
}

impl ReactNode {
    fn restore(&self, inputs: &NodeInputs, ctx: &NodeContext) -> Result<(AgentState, usize, Option<Round>)> {
        match &ctx.resume {
            Some(resume) => {
                let snapshot: LoopSnapshot = serde_json::from_value(resume.state.clone())?;
                debug!(
                    checkpoint_id = %ctx.checkpoint_id,
                    tool_call_id = %resume.tool_call_id,
                    iteration = snapshot.iteration,
                    "resuming tool round"
                );
                let round = Round {
                    assistant: snapshot.pending,
                    completed: snapshot.completed,
                    resume: resume.options.clone(),
                };
                Ok((snapshot.state, snapshot.iteration, Some(round)))
            }
            None => {
                let messages = inputs.messages(NodeKey::PromptTemplate)?.to_vec();
                Ok((AgentState::new(messages, Some(self.input.clone())), 0, None))
            }
        }
    }

    fn tool_context(&self, call: &ToolCall, resume: Option<&ResumeOptions>) -> ToolExecutionContext {
        ToolExecutionContext {
            tool_call_id: call.id.clone(),
            user_id: self.user_id.clone(),
            identity: self.identity.clone(),
            resume: resume
                .filter(|resume| resume.tool_call_id == call.id)
                .cloned(),
        }
    }

    /// Resolve and validate a call. `Err` carries the message fed back to
    /// the model in place of a result.
    fn prepare(&self, call: &ToolCall) -> std::result::Result<(Arc<dyn Tool>, ToolArguments), String> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| format!("unknown tool '{}'", call.name))?;
        let args = ToolArguments::parse(&call.arguments).map_err(|e| e.to_string())?;
        validate_arguments(args.raw(), &tool.parameters().schema).map_err(|e| e.to_string())?;
        Ok((Arc::clone(tool), args))
    }

    fn call_stream<'a>(
        &'a self,
        index: usize,
        call: &'a ToolCall,
        completed: &'a BTreeMap<String, Message>,
        resume: Option<&'a ResumeOptions>,
    ) -> BoxStream<'a, (usize, CallEvent)> {
        async_stream::stream! {
            if let Some(done) = completed.get(&call.id) {
                yield (index, CallEvent::Chunk(done.clone()));
                return;
            }
            let (tool, args) = match self.prepare(call) {
                Ok(prepared) => prepared,
                Err(message) => {
                    warn!(tool = %call.name, error = %message, "rejected tool call");
                    yield (index, CallEvent::Chunk(error_result(call, &message)));
                    return;
                }
            };
            let ctx = self.tool_context(call, resume);
            match tool.execute_stream(&args, &ctx).await {
                Ok(mut output) => {
                    while let Some(item) = output.next().await {
                        match item {
                            Ok(text) => yield (index, CallEvent::Chunk(Message::tool(&call.id, &call.name, text))),
                            Err(err) => {
                                yield (index, classify(call, err));
                                return;
                            }
                        }
                    }
                }
                Err(err) => yield (index, classify(call, err)),
            }
        }
        .boxed()
    }

    /// Execute every call of `round` concurrently, streaming frames to the
    /// observer. Returns one outcome per call, in call order.
    async fn run_tools(&self, round: &Round, ctx: &NodeContext) -> Result<Vec<CallOutcome>> {
        let calls = &round.assistant.tool_calls;
        let width = calls.len();
        let (frames, reader) = pipe::<Result<ToolFrame>>(width);

        let produce = async move {
            let streams = calls.iter().enumerate().map(|(index, call)| {
                self.call_stream(index, call, &round.completed, round.resume.as_ref())
            });
            let mut merged = stream::select_all(streams);
            let mut collector = ToolOutputCollector::new();
            let mut interrupts: Vec<Option<ToolInterrupt>> = vec![None; width];

            while let Some((index, event)) = merged.next().await {
                match event {
                    CallEvent::Chunk(chunk) => {
                        let mut frame: ToolFrame = vec![None; width];
                        frame[index] = Some(chunk.clone());
                        frames.send(Ok(frame)).await;
                        collector.push(index, chunk);
                    }
                    CallEvent::Interrupted(interrupt) => interrupts[index] = Some(interrupt),
                    CallEvent::Failed(err) => {
                        frames.send(Err(AgentFlowError::Stream(err.to_string()))).await;
                        return Err(err);
                    }
                }
            }
            // A suspended round reports nothing but the interrupt; finished
            // results are replayed when the run resumes.
            if let Some(interrupt) = interrupts.iter().flatten().next() {
                frames
                    .send(Err(AgentFlowError::ToolInterrupt {
                        tool_name: interrupt.tool_name().to_string(),
                        interrupt: interrupt.clone(),
                    }))
                    .await;
            }
            drop(frames);

            let mut results = collector.finish_indexed()?;
            Ok(calls
                .iter()
                .enumerate()
                .map(|(index, call)| match interrupts[index].take() {
                    Some(interrupt) => CallOutcome::Interrupted(interrupt),
                    None => CallOutcome::Done(
                        results
                            .remove(&index)
                            .unwrap_or_else(|| Message::tool(&call.id, &call.name, "")),
                    ),
                })
                .collect())
        };

        let ((), outcomes) = tokio::join!(ctx.observer.on_tool_stream(reader.boxed()), produce);
        outcomes
    }
}

fn error_result(call: &ToolCall, message: &str) -> Message {
    Message::tool(&call.id, &call.name, format!("error: {message}"))
}

/// Interrupts suspend the call, argument errors go back to the model,
/// everything else aborts the run.
fn classify(call: &ToolCall, err: AgentFlowError) -> CallEvent {
    match err {
        AgentFlowError::ToolInterrupt { interrupt, .. } => CallEvent::Interrupted(interrupt),
        AgentFlowError::InvalidArgument(message) => {
            CallEvent::Chunk(error_result(call, &format!("invalid argument: {message}")))
        }
        other => CallEvent::Failed(other),
    }
}

#[async_trait]
impl Node for ReactNode {
    async fn run(&self, inputs: NodeInputs, ctx: &NodeContext) -> Result<NodeValue> {
        let (mut state, mut iteration, mut carried) = self.restore(&inputs, ctx)?;
        let definitions = self.tools.definitions();

        loop {
            let round = match carried.take() {
                Some(round) => round,
                None => {
                    if iteration >= self.max_iterations {
                        return Err(AgentFlowError::Node {
                            node: NodeKey::React,
                            message: format!(
                                "model still calling tools after {} iterations",
                                self.max_iterations
                            ),
                        });
                    }
                    iteration += 1;
                    let request = ChatRequest {
                        messages: state.messages.clone(),
                        tools: definitions.clone(),
                        temperature: self.model_ref.temperature,
                        max_tokens: self.model_ref.max_tokens,
                    };
                    let answer =
                        stream_answer(self.model.as_ref(), &request, NodeKey::React, ctx).await?;
                    state.messages.push(answer.clone());
                    if !answer.has_tool_calls() {
                        return Ok(NodeValue::Message(answer));
                    }
                    Round {
                        assistant: answer,
                        completed: BTreeMap::new(),
                        resume: None,
                    }
                }
            };

            ctx.observer.on_tools_start(&round.assistant).await;
            let outcomes = self.run_tools(&round, ctx).await?;

            let mut results = BTreeMap::new();
            let mut interrupts = Vec::new();
            for (call, outcome) in round.assistant.tool_calls.iter().zip(outcomes) {
                match outcome {
                    CallOutcome::Done(message) => {
                        results.insert(call.id.clone(), message);
                    }
                    CallOutcome::Interrupted(interrupt) => interrupts.push(PendingInterrupt {
                        tool_call_id: call.id.clone(),
                        interrupt,
                    }),
                }
            }

            if !interrupts.is_empty() {
                let snapshot = LoopSnapshot {
                    state,
                    iteration,
                    pending: round.assistant,
                    completed: results,
                };
                return Err(AgentFlowError::Interrupted(Box::new(InterruptSignal {
                    node: NodeKey::React,
                    interrupts,
                    state: serde_json::to_value(&snapshot)?,
                })));
            }

            let mut direct: Option<Message> = None;
            for call in &round.assistant.tool_calls {
                let Some(message) = results.remove(&call.id) else {
                    continue;
                };
                let returns_directly = self
                    .tools
                    .get(&call.name)
                    .is_some_and(|tool| tool.return_directly());
                if direct.is_none() && returns_directly {
                    direct = Some(message.clone());
                }
                state.messages.push(message);
            }
            if let Some(message) = direct {
                state.return_directly_tool_call_id = message.tool_call_id.clone();
                debug!(
                    checkpoint_id = %ctx.checkpoint_id,
                    tool_call_id = ?state.return_directly_tool_call_id,
                    "tool output returned directly"
                );
                return Ok(NodeValue::Message(message));
            }
        }
    }
}
