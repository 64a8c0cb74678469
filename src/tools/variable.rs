//! The variable-mutation tool.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::ToolParameters;
use crate::error::{AgentFlowError, Result};
use crate::services::{VariableScope, VariableService};
use crate::types::VariableDecl;

pub const SET_VARIABLE_TOOL: &str = "set_user_variable";

/// Lets the model store a value for one of the agent's user variables.
pub struct VariableTool {
    keywords: Vec<String>,
    description: String,
    parameters: ToolParameters,
    service: Arc<dyn VariableService>,
}

impl VariableTool {
    /// `None` when no variable is writable.
    pub fn new(variables: &[VariableDecl], service: Arc<dyn VariableService>) -> Option<Self> {
        let writable: Vec<&VariableDecl> =
            variables.iter().filter(|v| v.enabled && !v.system).collect();
        if writable.is_empty() {
            return None;
        }

        let keywords: Vec<String> = writable.iter().map(|v| v.keyword.clone()).collect();
        let mut description =
            "Remember a value about the user for later turns. Writable variables:".to_string();
        for variable in &writable {
            description.push_str(&format!("\n- {}", variable.keyword));
            if !variable.description.is_empty() {
                description.push_str(&format!(": {}", variable.description));
            }
        }
        let parameters = ToolParameters::object()
            .string_enum("keyword", "Variable to set", &keywords, true)
            .string("value", "New value", true)
            .build();

        Some(Self {
            keywords,
            description,
            parameters,
            service,
        })
    }
}

#[async_trait]
impl Tool for VariableTool {
    fn name(&self) -> &str {
        SET_VARIABLE_TOOL
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolExecutionContext) -> Result<String> {
        let keyword = args.get_str("keyword")?;
        if !self.keywords.iter().any(|k| k == keyword) {
            return Err(AgentFlowError::InvalidArgument(format!(
                "'{keyword}' is not a writable variable"
            )));
        }
        let value = args.get_str("value")?;

        let scope = VariableScope {
            user_id: ctx.user_id.clone(),
            agent_id: ctx.identity.agent_id,
            connector_id: ctx.identity.connector_id,
            is_draft: ctx.identity.is_draft,
        };
        self.service
            .set_variables(&scope, BTreeMap::from([(keyword.to_string(), value.to_string())]))
            .await?;
        Ok(serde_json::json!({ "keyword": keyword, "updated": true }).to_string())
    }
}
