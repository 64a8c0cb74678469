//! Tools called ahead of the model, whose results are injected into the
//! prompt as a synthetic call/result exchange.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{AgentFlowError, Result};
use crate::graph::{Node, NodeContext, NodeInputs, NodeValue};
use crate::services::{
    ExecuteScene, ExecuteToolOutcome, ExecuteToolRequest, PluginService, WorkflowExecuteRequest,
    WorkflowOutcome, WorkflowService,
};
use crate::types::{AgentIdentity, Message, PreCallTarget, PreCallTool, ToolCall};

pub(crate) struct PreToolsNode {
    pub calls: Vec<PreCallTool>,
    pub user_id: String,
    pub identity: AgentIdentity,
    pub plugins: Arc<dyn PluginService>,
    pub workflows: Arc<dyn WorkflowService>,
}

impl PreToolsNode {
    async fn invoke(&self, call: &PreCallTool) -> Result<String> {
        match &call.target {
            PreCallTarget::Plugin { plugin_id, tool_id } => {
                let outcome = self
                    .plugins
                    .execute_tool(ExecuteToolRequest {
                        user_id: self.user_id.clone(),
                        plugin_id: *plugin_id,
                        tool_id: *tool_id,
                        arguments: call.arguments.clone(),
                        scene: ExecuteScene::for_draft(self.identity.is_draft),
                    })
                    .await?;
                match outcome {
                    ExecuteToolOutcome::Completed { trimmed_response } => Ok(trimmed_response),
                    // Nothing can be resumed before the loop node exists.
                    ExecuteToolOutcome::AuthRequired { message } => Err(AgentFlowError::tool(
                        &call.tool_name,
                        format!("authorization required before the turn: {message}"),
                    )),
                }
            }
            PreCallTarget::Workflow { workflow_id } => {
                let outcome = self
                    .workflows
                    .sync_execute(WorkflowExecuteRequest {
                        workflow_id: *workflow_id,
                        tool_name: call.tool_name.clone(),
                        user_id: self.user_id.clone(),
                        is_draft: self.identity.is_draft,
                        input: call.arguments.clone(),
                        resume: None,
                    })
                    .await?;
                match outcome {
                    WorkflowOutcome::Completed { output } => Ok(output),
                    WorkflowOutcome::Interrupted(event) => Err(AgentFlowError::tool(
                        &call.tool_name,
                        format!("workflow suspended before the turn ({})", event.event_type),
                    )),
                }
            }
        }
    }
}

#[async_trait]
impl Node for PreToolsNode {
    async fn run(&self, _inputs: NodeInputs, _ctx: &NodeContext) -> Result<NodeValue> {
        let mut messages = Vec::with_capacity(self.calls.len() * 2);
        for (index, call) in self.calls.iter().enumerate() {
            let call_id = call
                .call_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("pre_call_{index}"));
            let output = self.invoke(call).await?;
            debug!(tool = %call.tool_name, call_id = %call_id, "pre-call tool finished");
            messages.push(Message::assistant_tool_calls(vec![ToolCall::new(
                call_id.clone(),
                call.tool_name.clone(),
                call.arguments.clone(),
            )]));
            messages.push(Message::tool(call_id, call.tool_name.clone(), output));
        }
        Ok(NodeValue::Messages(messages))
    }
}
