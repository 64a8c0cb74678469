//! Fitting multi-modal user input to what the model accepts.

use crate::models::ModelCapabilities;
use crate::types::{ContentPart, Message, Role};

/// Adapt one message to the model's input modalities.
///
/// Unsupported non-text parts are dropped and described in text instead
/// (`this is a <kind>:<url>`), appended to the nearest text part (the
/// closest preceding one, else the first following one). A model that only
/// takes one modality receives a single text string. Only user messages are
/// touched.
pub fn adapt_input(message: &Message, capabilities: &ModelCapabilities) -> Message {
    if message.role != Role::User || message.parts.is_empty() {
        return message.clone();
    }

    let mut parts: Vec<ContentPart> = Vec::with_capacity(message.parts.len() + 1);
    if !message.content.is_empty() {
        parts.push(ContentPart::text(message.content.clone()));
    }
    // Markers waiting for a text part to attach to.
    let mut orphans: Vec<String> = Vec::new();

    for part in &message.parts {
        match part {
            ContentPart::Text { text } => {
                let mut text = text.clone();
                for marker in orphans.drain(..) {
                    text = format!("{text} {marker}");
                }
                parts.push(ContentPart::Text { text });
            }
            other if capabilities.supports_modality(other.modality()) => parts.push(other.clone()),
            other => {
                let marker = format!(
                    " this is a {}:{}",
                    other.modality(),
                    other.url().unwrap_or_default()
                );
                match parts.iter_mut().rev().find_map(|p| match p {
                    ContentPart::Text { text } => Some(text),
                    _ => None,
                }) {
                    Some(text) => *text = format!("{text} {marker}"),
                    None => orphans.push(marker),
                }
            }
        }
    }
    if !orphans.is_empty() {
        let text = orphans.concat().trim().to_string();
        parts.insert(0, ContentPart::Text { text });
    }

    let mut adapted = message.clone();
    if capabilities.is_multimodal() {
        adapted.content = String::new();
        adapted.parts = parts;
    } else {
        adapted.content = parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .concat();
        adapted.parts = Vec::new();
    }
    adapted
}

/// Adapt every user message of a conversation.
pub fn adapt_history(history: &[Message], capabilities: &ModelCapabilities) -> Vec<Message> {
    history
        .iter()
        .map(|message| adapt_input(message, capabilities))
        .collect()
}
