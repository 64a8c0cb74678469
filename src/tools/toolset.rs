//! Assembly of the agent's tool set.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::database::DatabaseTool;
use super::plugin::PluginTool;
use super::tool::Tool;
use super::variable::VariableTool;
use super::workflow::WorkflowTool;
use crate::error::{AgentFlowError, Result};
use crate::provider::ToolDefinition;
use crate::services::{
    AgentToolsRequest, Collaborators, PluginToolInfo, WorkflowPolicy, WorkflowToolInfo,
};
use crate::types::{AgentConfiguration, ExecutionRequest};

/// Ordered, immutable set of tools offered to the model: plugins, then
/// workflows, then one tool per database table, then the variable tool.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for tool in &tools {
            if tool.name().is_empty() {
                return Err(AgentFlowError::InvalidToolConfig(
                    "tool with an empty name".to_string(),
                ));
            }
            if !seen.insert(tool.name().to_string()) {
                return Err(AgentFlowError::InvalidToolConfig(format!(
                    "duplicate tool name '{}'",
                    tool.name()
                )));
            }
        }
        Ok(Self { tools })
    }

    /// Resolve every declaration on the agent into a tool.
    pub async fn assemble(
        config: &AgentConfiguration,
        request: &ExecutionRequest,
        collaborators: &Collaborators,
    ) -> Result<Self> {
        let identity = &request.identity;
        let plugins = async {
            if config.plugins.is_empty() {
                return Ok(Vec::new());
            }
            collaborators
                .plugins
                .agent_tools(AgentToolsRequest {
                    agent_id: identity.agent_id,
                    is_draft: identity.is_draft,
                    version: identity.version.clone(),
                    tools: config.plugins.clone(),
                })
                .await
        };
        let workflows = async {
            if config.workflows.is_empty() {
                return Ok(Vec::new());
            }
            let policies = config
                .workflows
                .iter()
                .map(|decl| WorkflowPolicy {
                    workflow_id: decl.workflow_id,
                    plugin_id: decl.plugin_id,
                    is_draft: identity.is_draft,
                    version: identity.version.clone(),
                })
                .collect();
            collaborators.workflows.workflow_tools(policies).await
        };
        let (plugin_infos, workflow_infos) = futures::try_join!(plugins, workflows)?;

        let mut tools: Vec<Arc<dyn Tool>> = Vec::with_capacity(config.declared_tool_count());
        for info in order_plugins(config, plugin_infos)? {
            tools.push(Arc::new(PluginTool::new(info, collaborators.plugins.clone())));
        }
        for info in order_workflows(config, workflow_infos)? {
            tools.push(Arc::new(WorkflowTool::new(info, collaborators.workflows.clone())));
        }
        for table in &config.databases {
            tools.push(Arc::new(DatabaseTool::new(
                table.clone(),
                collaborators.database.clone(),
            )));
        }
        if let Some(tool) = VariableTool::new(&config.variables, collaborators.variables.clone()) {
            tools.push(Arc::new(tool));
        }

        debug!(
            agent_id = config.agent_id,
            tool_count = tools.len(),
            "assembled tool set"
        );
        Self::new(tools)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    /// Names of the tools whose output ends the turn.
    pub fn return_directly_names(&self) -> HashSet<String> {
        self.tools
            .iter()
            .filter(|tool| tool.return_directly())
            .map(|tool| tool.name().to_string())
            .collect()
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet").field("tools", &self.names()).finish()
    }
}

/// Put resolved plugin tools in declaration order; every declaration must
/// resolve.
fn order_plugins(
    config: &AgentConfiguration,
    mut infos: Vec<PluginToolInfo>,
) -> Result<Vec<PluginToolInfo>> {
    config
        .plugins
        .iter()
        .map(|decl| {
            let position = infos
                .iter()
                .position(|info| info.plugin_id == decl.plugin_id && info.tool_id == decl.tool_id)
                .ok_or_else(|| {
                    AgentFlowError::InvalidToolConfig(format!(
                        "plugin {} tool {} could not be resolved",
                        decl.plugin_id, decl.tool_id
                    ))
                })?;
            Ok(infos.swap_remove(position))
        })
        .collect()
}

fn order_workflows(
    config: &AgentConfiguration,
    mut infos: Vec<WorkflowToolInfo>,
) -> Result<Vec<WorkflowToolInfo>> {
    config
        .workflows
        .iter()
        .map(|decl| {
            let position = infos
                .iter()
                .position(|info| info.workflow_id == decl.workflow_id)
                .ok_or_else(|| {
                    AgentFlowError::InvalidToolConfig(format!(
                        "workflow {} could not be resolved",
                        decl.workflow_id
                    ))
                })?;
            Ok(infos.swap_remove(position))
        })
        .collect()
}
