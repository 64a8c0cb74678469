//! Per-turn execution request.

use std::collections::BTreeMap;

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::message::Message;
use crate::interrupt::ResumeInfo;

/// One conversational turn to execute.
#[derive(Debug, Clone, Builder)]
pub struct ExecutionRequest {
    #[builder(into)]
    pub user_id: String,
    pub input: Message,
    #[builder(default)]
    pub history: Vec<Message>,
    #[builder(default)]
    pub identity: AgentIdentity,
    pub resume_info: Option<ResumeInfo>,
    #[builder(default)]
    pub pre_call_tools: Vec<PreCallTool>,
    /// Variable values that take precedence over stored ones.
    #[builder(default)]
    pub variables: BTreeMap<String, String>,
}

impl ExecutionRequest {
    pub fn is_resume(&self) -> bool {
        self.resume_info.is_some()
    }
}

/// Which agent (and which build of it) is being executed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentIdentity {
    pub agent_id: i64,
    #[serde(default)]
    pub connector_id: i64,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub is_draft: bool,
}

/// A tool invoked ahead of the model call whose result is injected into
/// the prompt as synthetic conversation turns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreCallTool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    pub tool_name: String,
    pub target: PreCallTarget,
    /// Raw JSON arguments.
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PreCallTarget {
    Plugin { plugin_id: i64, tool_id: i64 },
    Workflow { workflow_id: i64 },
}
