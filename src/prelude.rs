//! Convenience re-exports for common use.

pub use crate::config::FlowSettings;
pub use crate::error::{AgentFlowError, ErrorCategory, Result};
pub use crate::events::{AgentEvent, AgentEventKind, AgentEventStream};
pub use crate::flow::{AgentFlow, BuiltAgent};
pub use crate::interrupt::{InterruptInfo, InterruptKind, ResumeInfo};
pub use crate::models::{ModelCapabilities, ModelManager, ModelMeta};
pub use crate::provider::{ChatModel, ChatRequest, ModelFactory};
pub use crate::services::{
    CheckpointStore, Collaborators, DatabaseService, InMemoryCheckpointStore, KnowledgeService,
    PluginService, VariableService, WorkflowService,
};
pub use crate::tools::{Tool, ToolArguments, ToolParameters};
pub use crate::types::{
    AgentConfiguration, ContentPart, ExecutionRequest, Message, ModelRef, Role,
};
