//! The tool abstraction shared by every adapter.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use super::arguments::ToolArguments;
use super::types::ToolParameters;
use crate::error::Result;
use crate::interrupt::ResumeOptions;
use crate::provider::ToolDefinition;
use crate::types::AgentIdentity;

/// Output chunks of one tool call.
pub type ToolOutputStream = BoxStream<'static, Result<String>>;

/// Context available during tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionContext {
    pub tool_call_id: String,
    pub user_id: String,
    pub identity: AgentIdentity,
    /// Present only for the call being resumed after a workflow interrupt.
    pub resume: Option<ResumeOptions>,
}

/// A capability the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters(&self) -> &ToolParameters;

    /// Whether this tool's output ends the turn and goes straight to the
    /// user. Fixed for the lifetime of the tool.
    fn return_directly(&self) -> bool {
        false
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolExecutionContext) -> Result<String>;

    /// Execute and stream the output. Tools without native streaming yield
    /// their whole result as one chunk.
    async fn execute_stream(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolOutputStream> {
        let output = self.execute(args, ctx).await?;
        Ok(futures::stream::once(async move { Ok(output) }).boxed())
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters().schema.clone(),
        }
    }
}
