//! Events delivered to the caller of a run.

use futures::stream::BoxStream;
use strum::Display;

use crate::error::Result;
use crate::interrupt::InterruptInfo;
use crate::provider::MessageStream;
use crate::services::RetrievedFragment;
use crate::types::Message;

/// One item of a run's output. A fatal error arrives as the `Err` side of
/// [`AgentEventStream`] and is always the last item.
pub enum AgentEvent {
    /// The model asked for tool calls; carries the assistant message.
    FunctionCall(Message),
    /// Results of one round of tool calls.
    ToolsMessage(Vec<Message>),
    /// Fragments recalled from the agent's knowledge.
    Knowledge(Vec<RetrievedFragment>),
    /// Streamed model answer; drain it to receive the tokens.
    ChatModelAnswer(MessageStream),
    /// Output of a return-directly tool, streamed as if the model said it.
    ToolAsChatModelStream(MessageStream),
    Suggest(Message),
    /// The run suspended; this is its last event.
    Interrupt(InterruptInfo),
}

/// Discriminant of [`AgentEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AgentEventKind {
    FunctionCall,
    ToolsMessage,
    Knowledge,
    ChatModelAnswer,
    ToolAsChatModelStream,
    Suggest,
    Interrupt,
}

impl AgentEvent {
    pub fn kind(&self) -> AgentEventKind {
        match self {
            Self::FunctionCall(_) => AgentEventKind::FunctionCall,
            Self::ToolsMessage(_) => AgentEventKind::ToolsMessage,
            Self::Knowledge(_) => AgentEventKind::Knowledge,
            Self::ChatModelAnswer(_) => AgentEventKind::ChatModelAnswer,
            Self::ToolAsChatModelStream(_) => AgentEventKind::ToolAsChatModelStream,
            Self::Suggest(_) => AgentEventKind::Suggest,
            Self::Interrupt(_) => AgentEventKind::Interrupt,
        }
    }
}

impl std::fmt::Debug for AgentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FunctionCall(message) => f.debug_tuple("FunctionCall").field(message).finish(),
            Self::ToolsMessage(messages) => f.debug_tuple("ToolsMessage").field(messages).finish(),
            Self::Knowledge(fragments) => f.debug_tuple("Knowledge").field(fragments).finish(),
            Self::ChatModelAnswer(_) => f.write_str("ChatModelAnswer(..)"),
            Self::ToolAsChatModelStream(_) => f.write_str("ToolAsChatModelStream(..)"),
            Self::Suggest(message) => f.debug_tuple("Suggest").field(message).finish(),
            Self::Interrupt(info) => f.debug_tuple("Interrupt").field(info).finish(),
        }
    }
}

/// Ordered, finite output of one run.
pub type AgentEventStream = BoxStream<'static, Result<AgentEvent>>;
