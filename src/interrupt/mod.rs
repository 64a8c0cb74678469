//! Suspension and resumption of runs.
//!
//! A tool that cannot finish without outside input (an OAuth login, or a
//! sub-workflow waiting on the user) fails with a structured
//! [`ToolInterrupt`]. The loop node gathers those into an
//! [`InterruptSignal`], the executor persists a checkpoint, and the
//! translator surfaces an [`InterruptInfo`] to the caller. A later request
//! carrying a matching [`ResumeInfo`] re-enters the graph at the tool phase.

mod resume;

pub use resume::{validate_resume, RunPhase};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::graph::NodeKey;

/// Public interrupt classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum InterruptKind {
    #[serde(rename = "oauth_plugin")]
    #[strum(serialize = "oauth_plugin")]
    OAuthPlugin,
    #[serde(rename = "workflow_event")]
    #[strum(serialize = "workflow_event")]
    WorkflowEvent,
}

/// What a suspended sub-workflow is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkflowEventType {
    /// A question node asked the user something.
    Question,
    /// An input node needs form values.
    InputNode,
    /// An LLM node inside the workflow suspended.
    WorkflowLlm,
}

/// A plugin tool needs the user to authorize it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthInterrupt {
    pub tool_name: String,
    /// Human-readable authorization prompt, usually containing the login URL.
    pub message: String,
}

/// A workflow tool suspended mid-execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInterruptEvent {
    pub tool_name: String,
    pub execute_id: i64,
    pub event_id: i64,
    pub event_type: WorkflowEventType,
    /// Raw interrupt data as produced by the workflow runtime.
    #[serde(default)]
    pub data: String,
}

/// Structured payload a tool fails with when it must suspend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolInterrupt {
    OAuthPlugin(OAuthInterrupt),
    Workflow(WorkflowInterruptEvent),
}

impl ToolInterrupt {
    pub fn kind(&self) -> InterruptKind {
        match self {
            Self::OAuthPlugin(_) => InterruptKind::OAuthPlugin,
            Self::Workflow(_) => InterruptKind::WorkflowEvent,
        }
    }

    pub fn tool_name(&self) -> &str {
        match self {
            Self::OAuthPlugin(oauth) => &oauth.tool_name,
            Self::Workflow(event) => &event.tool_name,
        }
    }

    /// The prompt a client should show the user.
    ///
    /// Question events store `{"question": "..."}` style data; anything that
    /// does not decode that way is returned raw.
    pub fn display_message(&self) -> String {
        match self {
            Self::OAuthPlugin(oauth) => oauth.message.clone(),
            Self::Workflow(event) => match event.event_type {
                WorkflowEventType::Question => question_text(&event.data),
                WorkflowEventType::InputNode | WorkflowEventType::WorkflowLlm => {
                    event.data.clone()
                }
            },
        }
    }
}

fn question_text(data: &str) -> String {
    serde_json::from_str::<serde_json::Value>(data)
        .ok()
        .and_then(|value| {
            let question = match &value {
                serde_json::Value::Array(items) => items.first()?.get("question")?,
                other => other.get("question")?,
            };
            question.as_str().map(str::to_string)
        })
        .unwrap_or_else(|| data.to_string())
}

/// A tool call that is waiting on an interrupt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInterrupt {
    pub tool_call_id: String,
    pub interrupt: ToolInterrupt,
}

/// Raised by a node that suspended; carries everything needed to resume it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptSignal {
    pub node: NodeKey,
    /// Pending interrupts in tool-call order.
    pub interrupts: Vec<PendingInterrupt>,
    /// Node-local snapshot restored on resume.
    pub state: serde_json::Value,
}

impl InterruptSignal {
    /// The first pending interrupt, keyed by tool-call id.
    pub fn first(&self) -> Option<(&String, &ToolInterrupt)> {
        self.interrupts
            .first()
            .map(|pending| (&pending.tool_call_id, &pending.interrupt))
    }

    pub fn find(&self, tool_call_id: &str) -> Option<&ToolInterrupt> {
        self.interrupts
            .iter()
            .find(|pending| pending.tool_call_id == tool_call_id)
            .map(|pending| &pending.interrupt)
    }
}

/// Interrupt surfaced to the caller as the terminal event of a suspended run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptInfo {
    /// Equal to the run's checkpoint id.
    pub interrupt_id: String,
    pub tool_call_id: String,
    pub kind: InterruptKind,
    /// Every pending payload of the run, keyed by tool-call id.
    pub payloads: Vec<PendingInterrupt>,
}

impl InterruptInfo {
    /// Build from a signal, selecting its first pending interrupt.
    pub fn from_signal(interrupt_id: impl Into<String>, signal: &InterruptSignal) -> Option<Self> {
        let (tool_call_id, interrupt) = signal.first()?;
        Some(Self {
            interrupt_id: interrupt_id.into(),
            tool_call_id: tool_call_id.clone(),
            kind: interrupt.kind(),
            payloads: signal.interrupts.clone(),
        })
    }

    pub fn payload(&self) -> Option<&ToolInterrupt> {
        self.payloads
            .iter()
            .find(|pending| pending.tool_call_id == self.tool_call_id)
            .map(|pending| &pending.interrupt)
    }

    pub fn display_message(&self) -> String {
        self.payload()
            .map(ToolInterrupt::display_message)
            .unwrap_or_default()
    }
}

/// Supplied by the caller to continue a suspended run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeInfo {
    /// Must equal the `interrupt_id` the suspended run reported.
    pub interrupt_id: String,
    pub tool_call_id: String,
    pub kind: InterruptKind,
    /// Newly supplied input: the user's answer, form values, or empty for
    /// OAuth after the login completed.
    #[serde(default)]
    pub resume_data: String,
}

impl ResumeInfo {
    pub fn new(info: &InterruptInfo, resume_data: impl Into<String>) -> Self {
        Self {
            interrupt_id: info.interrupt_id.clone(),
            tool_call_id: info.tool_call_id.clone(),
            kind: info.kind,
            resume_data: resume_data.into(),
        }
    }
}

/// Options threaded into a workflow tool that is being resumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeOptions {
    pub tool_call_id: String,
    /// The interrupt the workflow raised last time.
    pub interrupt: WorkflowInterruptEvent,
    pub resume_data: String,
}
