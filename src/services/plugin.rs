//! Plugin service boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::Result;
use crate::types::PluginToolDecl;

/// Plugin tool metadata resolved for an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginToolInfo {
    pub plugin_id: i64,
    pub tool_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the tool arguments.
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentToolsRequest {
    pub agent_id: i64,
    pub is_draft: bool,
    pub version: String,
    pub tools: Vec<PluginToolDecl>,
}

/// Where a plugin call originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecuteScene {
    Online,
    Draft,
}

impl ExecuteScene {
    pub fn for_draft(is_draft: bool) -> Self {
        if is_draft {
            Self::Draft
        } else {
            Self::Online
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteToolRequest {
    pub user_id: String,
    pub plugin_id: i64,
    pub tool_id: i64,
    pub arguments: String,
    pub scene: ExecuteScene,
}

/// Result of a plugin call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteToolOutcome {
    /// The response trimmed to the fields the model should see.
    Completed { trimmed_response: String },
    /// The plugin needs the user to authorize it first.
    AuthRequired { message: String },
}

#[async_trait]
pub trait PluginService: Send + Sync {
    async fn agent_tools(&self, request: AgentToolsRequest) -> Result<Vec<PluginToolInfo>>;

    async fn execute_tool(&self, request: ExecuteToolRequest) -> Result<ExecuteToolOutcome>;
}
