//! Composition of the final prompt sent to the model.

use std::collections::BTreeMap;

use crate::types::{Message, Role};

/// Variable carrying the formatted current time.
pub const CURRENT_TIME_VARIABLE: &str = "current_time";

/// Everything the chat template is filled from.
#[derive(Debug, Clone, Copy)]
pub struct PromptParts<'a> {
    pub persona: &'a str,
    pub knowledge: &'a str,
    pub variables: &'a BTreeMap<String, String>,
    pub history: &'a [Message],
    pub pre_tool_messages: &'a [Message],
    pub input: Option<&'a Message>,
}

/// Build the system prompt: persona, recalled knowledge, remembered
/// variables and the current time, each section only when non-empty.
pub fn system_prompt(parts: &PromptParts<'_>) -> String {
    let mut sections: Vec<String> = Vec::new();
    if !parts.persona.trim().is_empty() {
        sections.push(parts.persona.trim().to_string());
    }
    if !parts.knowledge.is_empty() {
        sections.push(format!(
            "# Knowledge\nUse the following recalled slices when they are relevant:\n{}",
            parts.knowledge
        ));
    }
    let memory: Vec<String> = parts
        .variables
        .iter()
        .filter(|(key, value)| key.as_str() != CURRENT_TIME_VARIABLE && !value.is_empty())
        .map(|(key, value)| format!("- {key}: {value}"))
        .collect();
    if !memory.is_empty() {
        sections.push(format!("# Memory\n{}", memory.join("\n")));
    }
    if let Some(time) = parts.variables.get(CURRENT_TIME_VARIABLE) {
        sections.push(format!("Current time: {time}"));
    }
    sections.join("\n\n")
}

/// System message, history, pre-call tool turns, then the user's input.
pub fn compose_messages(parts: &PromptParts<'_>) -> Vec<Message> {
    let mut messages =
        Vec::with_capacity(parts.history.len() + parts.pre_tool_messages.len() + 2);
    let system = system_prompt(parts);
    if !system.is_empty() {
        messages.push(Message::system(system));
    }
    messages.extend(parts.history.iter().cloned());
    messages.extend(parts.pre_tool_messages.iter().cloned());
    if let Some(input) = parts.input {
        messages.push(input.clone());
    }
    messages
}

/// Keep the last `rounds` conversation rounds, where a round starts at a
/// user message. Anything before the first kept user message is dropped.
pub fn truncate_history(history: &[Message], rounds: usize) -> Vec<Message> {
    if rounds == 0 {
        return Vec::new();
    }
    let starts: Vec<usize> = history
        .iter()
        .enumerate()
        .filter(|(_, message)| message.role == Role::User)
        .map(|(index, _)| index)
        .collect();
    if starts.len() <= rounds {
        let first = starts.first().copied().unwrap_or(history.len());
        return history[first..].to_vec();
    }
    history[starts[starts.len() - rounds]..].to_vec()
}
