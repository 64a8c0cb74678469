//! Error types for AgentFlow.

use thiserror::Error;

use crate::graph::NodeKey;
use crate::interrupt::{InterruptSignal, InterruptKind, ToolInterrupt};

/// Broad error category for routing handling logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Raised before any streaming begins; no partial run is possible.
    Build,
    /// A node or collaborator failed while the graph was running.
    Runtime,
    /// Structured suspension; not a failure.
    Interrupt,
    /// Checkpoint lookup or persistence problem.
    Checkpoint,
    /// Unexpected failure such as a recovered panic.
    Internal,
}

/// Primary error type for all AgentFlow operations.
#[derive(Error, Debug)]
pub enum AgentFlowError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Unsupported model protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("Model '{model}' does not support function calling but {tool_count} tools are configured")]
    FunctionCallUnsupported { model: String, tool_count: usize },

    #[error("Invalid tool configuration: {0}")]
    InvalidToolConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{service} service error: {message}")]
    Collaborator { service: String, message: String },

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Node {node} failed: {message}")]
    Node { node: NodeKey, message: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checkpoint not found: {0}")]
    CheckpointNotFound(String),

    #[error("Checkpoint store error: {0}")]
    CheckpointStore(String),

    #[error("Resume mismatch: {0}")]
    ResumeMismatch(String),

    #[error("Tool '{tool_name}' interrupted: {}", interrupt.kind())]
    ToolInterrupt {
        tool_name: String,
        interrupt: ToolInterrupt,
    },

    #[error("Run interrupted at node {}", .0.node)]
    Interrupted(Box<InterruptSignal>),

    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    #[error("Run canceled")]
    Canceled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentFlowError {
    /// Create a collaborator error for the named service.
    pub fn collaborator(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collaborator {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a tool execution error.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_)
            | Self::ModelNotFound(_)
            | Self::UnsupportedProtocol(_)
            | Self::FunctionCallUnsupported { .. }
            | Self::InvalidToolConfig(_)
            | Self::InvalidGraph(_) => ErrorCategory::Build,
            Self::ToolInterrupt { .. } | Self::Interrupted(_) => ErrorCategory::Interrupt,
            Self::CheckpointNotFound(_) | Self::CheckpointStore(_) | Self::ResumeMismatch(_) => {
                ErrorCategory::Checkpoint
            }
            Self::Internal(_) => ErrorCategory::Internal,
            _ => ErrorCategory::Runtime,
        }
    }

    /// Whether this error carries structured interrupt data.
    pub fn is_interrupt(&self) -> bool {
        self.category() == ErrorCategory::Interrupt
    }

    /// Whether this error is a build-time fatal.
    pub fn is_build_error(&self) -> bool {
        self.category() == ErrorCategory::Build
    }

    /// Interrupt kind if this error is a structured interrupt.
    pub fn interrupt_kind(&self) -> Option<InterruptKind> {
        match self {
            Self::ToolInterrupt { interrupt, .. } => Some(interrupt.kind()),
            Self::Interrupted(signal) => signal.first().map(|(_, interrupt)| interrupt.kind()),
            _ => None,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AgentFlowError>;
