use serde::{Deserialize, Serialize};
use strum::Display;

use super::{InterruptSignal, ResumeInfo, ResumeOptions, ToolInterrupt};
use crate::error::{AgentFlowError, Result};

/// Lifecycle of one run.
///
/// `Running` or `Resumed` at start; exactly one of `Completed`, `Suspended`
/// or `Aborted` at the end. Only a suspended run leaves a checkpoint behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RunPhase {
    Running,
    Resumed,
    Suspended,
    Completed,
    Aborted,
}

impl RunPhase {
    pub fn start(resuming: bool) -> Self {
        if resuming {
            Self::Resumed
        } else {
            Self::Running
        }
    }

    /// Terminal phase for a run outcome. Calling this on a terminal phase
    /// returns it unchanged.
    pub fn finish<T>(self, outcome: &Result<T>) -> Self {
        if self.is_terminal() {
            return self;
        }
        match outcome {
            Ok(_) => Self::Completed,
            Err(err) if err.is_interrupt() => Self::Suspended,
            Err(_) => Self::Aborted,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Suspended | Self::Completed | Self::Aborted)
    }

    /// Whether the checkpoint must survive this phase.
    pub fn keeps_checkpoint(self) -> bool {
        self == Self::Suspended
    }
}

/// Check a resume request against the interrupt stored in the checkpoint and
/// derive the execution options for the resumed tool.
///
/// OAuth resumes carry no options; the tool simply runs again now that the
/// user has authorized it.
pub fn validate_resume(
    resume: &ResumeInfo,
    signal: &InterruptSignal,
) -> Result<Option<ResumeOptions>> {
    let interrupt = signal.find(&resume.tool_call_id).ok_or_else(|| {
        AgentFlowError::ResumeMismatch(format!(
            "tool call '{}' is not pending in checkpoint '{}'",
            resume.tool_call_id, resume.interrupt_id
        ))
    })?;

    if interrupt.kind() != resume.kind {
        return Err(AgentFlowError::ResumeMismatch(format!(
            "tool call '{}' is waiting on {}, not {}",
            resume.tool_call_id,
            interrupt.kind(),
            resume.kind
        )));
    }

    Ok(match interrupt {
        ToolInterrupt::OAuthPlugin(_) => None,
        ToolInterrupt::Workflow(event) => Some(ResumeOptions {
            tool_call_id: resume.tool_call_id.clone(),
            interrupt: event.clone(),
            resume_data: resume.resume_data.clone(),
        }),
    })
}
