//! Declarative agent configuration.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Everything needed to assemble an agent's execution graph.
///
/// Owned by the caller and treated as immutable for one execution.
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize)]
pub struct AgentConfiguration {
    #[builder(default)]
    pub agent_id: i64,
    #[builder(into, default)]
    pub name: String,
    /// Persona template; may contain `{{placeholder}}` tokens.
    #[builder(into, default)]
    pub persona: String,
    #[builder(default)]
    pub model: ModelRef,
    #[builder(default)]
    pub knowledge: KnowledgeSettings,
    #[builder(default)]
    #[serde(default)]
    pub plugins: Vec<PluginToolDecl>,
    #[builder(default)]
    #[serde(default)]
    pub workflows: Vec<WorkflowToolDecl>,
    #[builder(default)]
    #[serde(default)]
    pub databases: Vec<DatabaseDecl>,
    #[builder(default)]
    #[serde(default)]
    pub variables: Vec<VariableDecl>,
    #[builder(default)]
    #[serde(default)]
    pub suggest_reply: SuggestReplyConfig,
}

impl AgentConfiguration {
    /// Number of tool declarations of every kind (variables count once).
    pub fn declared_tool_count(&self) -> usize {
        self.plugins.len()
            + self.workflows.len()
            + self.databases.len()
            + usize::from(self.has_variable_tool())
    }

    /// Whether the variable-mutation tool should be offered to the model.
    pub fn has_variable_tool(&self) -> bool {
        self.variables.iter().any(|v| v.enabled && !v.system)
    }
}

/// Reference to the model serving this agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelRef {
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Number of past conversation rounds sent to the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_rounds: Option<usize>,
}

impl ModelRef {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: Some(model_id.into()),
            ..Default::default()
        }
    }
}

/// Knowledge recall settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeSettings {
    #[serde(default)]
    pub knowledge_ids: Vec<String>,
    pub top_k: usize,
    pub min_score: f64,
    pub search_type: SearchType,
    #[serde(default)]
    pub use_rewrite: bool,
    #[serde(default)]
    pub use_rerank: bool,
    #[serde(default)]
    pub use_nl2sql: bool,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            knowledge_ids: Vec::new(),
            top_k: 3,
            min_score: 0.5,
            search_type: SearchType::Hybrid,
            use_rewrite: false,
            use_rerank: false,
            use_nl2sql: false,
        }
    }
}

impl KnowledgeSettings {
    pub fn is_enabled(&self) -> bool {
        !self.knowledge_ids.is_empty()
    }
}

/// Knowledge search strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SearchType {
    Semantic,
    FullText,
    Hybrid,
}

/// A plugin tool bound to the agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginToolDecl {
    pub plugin_id: i64,
    pub tool_id: i64,
}

/// A workflow exposed to the agent as a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowToolDecl {
    pub workflow_id: i64,
    #[serde(default)]
    pub plugin_id: i64,
}

/// A database table bound to the agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseDecl {
    pub table_id: i64,
    pub table_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<DatabaseField>,
    /// When set, the table schema is withheld from the tool description.
    #[serde(default)]
    pub prompt_disabled: bool,
}

/// A column of a bound database table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseField {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

/// A user/agent variable declared on the agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableDecl {
    pub keyword: String,
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// System variables are read-only and never offered for mutation.
    #[serde(default)]
    pub system: bool,
}

fn default_true() -> bool {
    true
}

/// Suggested-reply generation mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SuggestReplyMode {
    #[default]
    Disabled,
    Default,
    Custom,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SuggestReplyConfig {
    pub mode: SuggestReplyMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_persona: Option<String>,
}

impl SuggestReplyConfig {
    pub fn is_enabled(&self) -> bool {
        self.mode != SuggestReplyMode::Disabled
    }
}
