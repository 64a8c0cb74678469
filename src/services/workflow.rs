//! Workflow service boundary.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::error::{AgentFlowError, Result};
use crate::interrupt::{ResumeOptions, ToolInterrupt, WorkflowInterruptEvent};

/// Which workflow versions an agent may call.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowPolicy {
    pub workflow_id: i64,
    pub plugin_id: i64,
    pub is_draft: bool,
    pub version: String,
}

/// A workflow exposed as a model tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowToolInfo {
    pub workflow_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parameters: serde_json::Value,
    /// Set when the workflow's terminate plan returns its output to the user
    /// verbatim instead of handing it back to the model.
    #[serde(default)]
    pub return_directly: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowExecuteRequest {
    pub workflow_id: i64,
    pub tool_name: String,
    pub user_id: String,
    pub is_draft: bool,
    /// JSON input object.
    pub input: String,
    pub resume: Option<ResumeOptions>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutcome {
    Completed { output: String },
    Interrupted(WorkflowInterruptEvent),
}

/// Output chunks of a streaming workflow run.
pub type WorkflowStream = BoxStream<'static, Result<String>>;

#[async_trait]
pub trait WorkflowService: Send + Sync {
    async fn workflow_tools(&self, policies: Vec<WorkflowPolicy>) -> Result<Vec<WorkflowToolInfo>>;

    async fn sync_execute(&self, request: WorkflowExecuteRequest) -> Result<WorkflowOutcome>;

    /// Execute and stream the output. A suspension surfaces as an
    /// [`AgentFlowError::ToolInterrupt`], either immediately or mid-stream.
    async fn stream_execute(&self, request: WorkflowExecuteRequest) -> Result<WorkflowStream> {
        match self.sync_execute(request).await? {
            WorkflowOutcome::Completed { output } => {
                Ok(futures::stream::once(async move { Ok(output) }).boxed())
            }
            WorkflowOutcome::Interrupted(event) => Err(AgentFlowError::ToolInterrupt {
                tool_name: event.tool_name.clone(),
                interrupt: ToolInterrupt::Workflow(event),
            }),
        }
    }
}
