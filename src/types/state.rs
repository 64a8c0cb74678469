//! Graph-local agent state.

use serde::{Deserialize, Serialize};

use super::message::{Message, Role};

/// State accumulated by the main node during one run.
///
/// Lives only inside the graph; on resume it is rebuilt from the checkpoint
/// snapshot rather than carried over in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentState {
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_input: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_directly_tool_call_id: Option<String>,
}

impl AgentState {
    pub fn new(messages: Vec<Message>, user_input: Option<Message>) -> Self {
        Self {
            messages,
            user_input,
            return_directly_tool_call_id: None,
        }
    }

    /// The last assistant or tool message, i.e. the turn's answer.
    pub fn final_answer(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::Assistant | Role::Tool) && !m.has_tool_calls())
    }
}
