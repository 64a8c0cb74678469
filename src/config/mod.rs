//! Runtime settings (layered: defaults < TOML file < environment).

use std::path::Path;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{AgentFlowError, Result};

pub const ENV_EVENT_BUFFER: &str = "AGENTFLOW_EVENT_BUFFER";
pub const ENV_TOOL_STREAM_BUFFER: &str = "AGENTFLOW_TOOL_STREAM_BUFFER";
pub const ENV_MAX_ITERATIONS: &str = "AGENTFLOW_MAX_ITERATIONS";
pub const ENV_HISTORY_ROUNDS: &str = "AGENTFLOW_HISTORY_ROUNDS";

/// Tunables for running flows.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    /// Capacity of the per-run event pipe.
    #[builder(default = 10)]
    pub event_buffer: usize,
    /// Capacity of the secondary stream mirroring a return-directly tool.
    #[builder(default = 5)]
    pub tool_stream_buffer: usize,
    /// Upper bound on model calls in one reasoning loop.
    #[builder(default = 20)]
    pub max_iterations: usize,
    /// History rounds sent to the model when the agent does not say.
    #[builder(default = 3)]
    pub default_history_rounds: usize,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FlowSettings {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)
            .map_err(|e| AgentFlowError::Configuration(format!("invalid settings: {e}")))?;
        Ok(settings.sanitized(&Self::default()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AgentFlowError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Defaults overridden by `AGENTFLOW_*` variables (a `.env` file is
    /// loaded first when present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::default().with_env()
    }

    /// Apply `AGENTFLOW_*` overrides on top of `self`.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Zero or unparsable values
    /// keep the current setting.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str, current: usize| {
            lookup(key)
                .and_then(|raw| raw.trim().parse::<usize>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(current)
        };
        self.event_buffer = read(ENV_EVENT_BUFFER, self.event_buffer);
        self.tool_stream_buffer = read(ENV_TOOL_STREAM_BUFFER, self.tool_stream_buffer);
        self.max_iterations = read(ENV_MAX_ITERATIONS, self.max_iterations);
        self.default_history_rounds = read(ENV_HISTORY_ROUNDS, self.default_history_rounds);
        self
    }

    fn sanitized(mut self, fallback: &Self) -> Self {
        if self.event_buffer == 0 {
            self.event_buffer = fallback.event_buffer;
        }
        if self.tool_stream_buffer == 0 {
            self.tool_stream_buffer = fallback.tool_stream_buffer;
        }
        if self.max_iterations == 0 {
            self.max_iterations = fallback.max_iterations;
        }
        if self.default_history_rounds == 0 {
            self.default_history_rounds = fallback.default_history_rounds;
        }
        self
    }
}
