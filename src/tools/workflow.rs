//! Workflows exposed as tools.

use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext, ToolOutputStream};
use super::types::ToolParameters;
use crate::error::{AgentFlowError, Result};
use crate::interrupt::ToolInterrupt;
use crate::services::{WorkflowExecuteRequest, WorkflowOutcome, WorkflowService, WorkflowToolInfo};

pub struct WorkflowTool {
    info: WorkflowToolInfo,
    parameters: ToolParameters,
    service: Arc<dyn WorkflowService>,
}

impl WorkflowTool {
    pub fn new(info: WorkflowToolInfo, service: Arc<dyn WorkflowService>) -> Self {
        let parameters = ToolParameters::from_schema(info.parameters.clone());
        Self {
            info,
            parameters,
            service,
        }
    }

    fn request(&self, args: &ToolArguments, ctx: &ToolExecutionContext) -> WorkflowExecuteRequest {
        WorkflowExecuteRequest {
            workflow_id: self.info.workflow_id,
            tool_name: self.info.name.clone(),
            user_id: ctx.user_id.clone(),
            is_draft: ctx.identity.is_draft,
            input: args.to_json_string(),
            resume: ctx
                .resume
                .clone()
                .filter(|resume| resume.tool_call_id == ctx.tool_call_id),
        }
    }
}

#[async_trait]
impl Tool for WorkflowTool {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn description(&self) -> &str {
        &self.info.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    fn return_directly(&self) -> bool {
        self.info.return_directly
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolExecutionContext) -> Result<String> {
        match self.service.sync_execute(self.request(args, ctx)).await? {
            WorkflowOutcome::Completed { output } => Ok(output),
            WorkflowOutcome::Interrupted(event) => Err(AgentFlowError::ToolInterrupt {
                tool_name: self.info.name.clone(),
                interrupt: ToolInterrupt::Workflow(event),
            }),
        }
    }

    async fn execute_stream(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolOutputStream> {
        self.service.stream_execute(self.request(args, ctx)).await
    }
}
