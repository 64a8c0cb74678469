//! Message types exchanged between nodes, models, and tools.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{AgentFlowError, Result};

/// A message in a conversation.
///
/// `content` holds plain text; `parts` holds the structured multi-modal
/// representation when the message carries more than text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<ContentPart>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
            ..Default::default()
        }
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
            ..Default::default()
        }
    }

    /// Create a multi-part user message.
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            parts,
            ..Default::default()
        }
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
            ..Default::default()
        }
    }

    /// Create an assistant message that requests tool calls.
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            tool_calls,
            ..Default::default()
        }
    }

    /// Create a tool result message.
    pub fn tool(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
            tool_name: Some(tool_name.into()),
            ..Default::default()
        }
    }

    /// Text content, falling back to the concatenated text parts.
    pub fn text(&self) -> String {
        if !self.content.is_empty() || self.parts.is_empty() {
            return self.content.clone();
        }
        self.parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Conversation role.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    #[default]
    User,
    Assistant,
    Tool,
}

/// Input modality a model may accept.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    File,
    Audio,
    Video,
}

/// A single part of multi-modal message content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { url: String },
    FileUrl { url: String },
    AudioUrl { url: String },
    VideoUrl { url: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::ImageUrl { url: url.into() }
    }

    pub fn modality(&self) -> Modality {
        match self {
            Self::Text { .. } => Modality::Text,
            Self::ImageUrl { .. } => Modality::Image,
            Self::FileUrl { .. } => Modality::File,
            Self::AudioUrl { .. } => Modality::Audio,
            Self::VideoUrl { .. } => Modality::Video,
        }
    }

    /// URL for non-text parts.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Text { .. } => None,
            Self::ImageUrl { url }
            | Self::FileUrl { url }
            | Self::AudioUrl { url }
            | Self::VideoUrl { url } => Some(url),
        }
    }
}

/// A tool call requested by the model.
///
/// Streaming models emit partial calls; `index` ties fragments of the same
/// call together and `arguments` is the raw JSON text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            index: None,
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the arguments as JSON, treating blank text as an empty object.
    pub fn arguments_json(&self) -> Result<serde_json::Value> {
        let trimmed = self.arguments.trim();
        if trimmed.is_empty() {
            return Ok(serde_json::json!({}));
        }
        serde_json::from_str(trimmed).map_err(|e| {
            AgentFlowError::InvalidArgument(format!(
                "tool call '{}' has malformed arguments: {e}",
                self.id
            ))
        })
    }
}

/// Concatenate streamed message chunks into one message.
///
/// Content is appended in arrival order, tool call fragments sharing an
/// index are merged, and the first non-empty tool call id/name wins.
pub fn concat_messages(chunks: &[Message]) -> Result<Message> {
    let Some(first) = chunks.first() else {
        return Err(AgentFlowError::Stream(
            "cannot concatenate an empty chunk list".to_string(),
        ));
    };

    let mut merged = Message {
        role: first.role,
        ..Default::default()
    };
    for chunk in chunks {
        if chunk.role != merged.role {
            return Err(AgentFlowError::Stream(format!(
                "cannot concatenate chunks with different roles ({} vs {})",
                merged.role, chunk.role
            )));
        }
        merged.content.push_str(&chunk.content);
        merged.parts.extend(chunk.parts.iter().cloned());
        if merged.tool_call_id.is_none() {
            merged.tool_call_id = chunk.tool_call_id.clone().filter(|id| !id.is_empty());
        }
        if merged.tool_name.is_none() {
            merged.tool_name = chunk.tool_name.clone().filter(|name| !name.is_empty());
        }
        for call in &chunk.tool_calls {
            merge_tool_call(&mut merged.tool_calls, call);
        }
    }
    Ok(merged)
}

fn merge_tool_call(calls: &mut Vec<ToolCall>, fragment: &ToolCall) {
    let existing = fragment
        .index
        .and_then(|index| calls.iter_mut().find(|call| call.index == Some(index)));
    match existing {
        Some(call) => {
            if call.id.is_empty() {
                call.id = fragment.id.clone();
            }
            if call.name.is_empty() {
                call.name = fragment.name.clone();
            }
            call.arguments.push_str(&fragment.arguments);
        }
        None => calls.push(fragment.clone()),
    }
}
