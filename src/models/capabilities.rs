//! Model capability descriptors.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::Modality;

/// What a model can do, as declared by its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    pub supports_tools: bool,
    pub supports_streaming: bool,
    /// Input modalities the model accepts natively.
    pub input_modalities: BTreeSet<Modality>,
    pub context_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<usize>,
}

impl Default for ModelCapabilities {
    fn default() -> Self {
        Self {
            supports_tools: false,
            supports_streaming: true,
            input_modalities: BTreeSet::from([Modality::Text]),
            context_length: 4096,
            max_output_tokens: None,
        }
    }
}

impl ModelCapabilities {
    /// Full-featured model capabilities.
    pub fn full(context_length: usize) -> Self {
        Self {
            supports_tools: true,
            supports_streaming: true,
            input_modalities: BTreeSet::from([
                Modality::Text,
                Modality::Image,
                Modality::File,
                Modality::Audio,
                Modality::Video,
            ]),
            context_length,
            max_output_tokens: None,
        }
    }

    /// Text-only model with function calling.
    pub fn text_with_tools() -> Self {
        Self {
            supports_tools: true,
            ..Self::default()
        }
    }

    pub fn supports_modality(&self, modality: Modality) -> bool {
        modality == Modality::Text || self.input_modalities.contains(&modality)
    }

    /// Whether structured multi-part input can be sent as-is.
    pub fn is_multimodal(&self) -> bool {
        self.input_modalities.len() > 1
    }
}
