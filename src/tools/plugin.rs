//! Plugin tools.

use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::ToolParameters;
use crate::error::{AgentFlowError, Result};
use crate::interrupt::{OAuthInterrupt, ToolInterrupt};
use crate::services::{
    ExecuteScene, ExecuteToolOutcome, ExecuteToolRequest, PluginService, PluginToolInfo,
};

/// A plugin API exposed to the model.
pub struct PluginTool {
    info: PluginToolInfo,
    parameters: ToolParameters,
    service: Arc<dyn PluginService>,
}

impl PluginTool {
    pub fn new(info: PluginToolInfo, service: Arc<dyn PluginService>) -> Self {
        let parameters = ToolParameters::from_schema(info.parameters.clone());
        Self {
            info,
            parameters,
            service,
        }
    }
}

#[async_trait]
impl Tool for PluginTool {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn description(&self) -> &str {
        &self.info.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolExecutionContext) -> Result<String> {
        let request = ExecuteToolRequest {
            user_id: ctx.user_id.clone(),
            plugin_id: self.info.plugin_id,
            tool_id: self.info.tool_id,
            arguments: args.to_json_string(),
            scene: ExecuteScene::for_draft(ctx.identity.is_draft),
        };
        match self.service.execute_tool(request).await? {
            ExecuteToolOutcome::Completed { trimmed_response } => Ok(trimmed_response),
            ExecuteToolOutcome::AuthRequired { message } => Err(AgentFlowError::ToolInterrupt {
                tool_name: self.info.name.clone(),
                interrupt: ToolInterrupt::OAuthPlugin(OAuthInterrupt {
                    tool_name: self.info.name.clone(),
                    message,
                }),
            }),
        }
    }
}
