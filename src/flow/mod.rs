//! The agent execution flow: build a graph for the turn, run it on a
//! background task, and hand the caller a stream of [`AgentEvent`]s.
//!
//! ```no_run
//! # use agentflow::prelude::*;
//! # async fn demo(collaborators: Collaborators, config: AgentConfiguration) -> agentflow::Result<()> {
//! use futures::StreamExt;
//!
//! let flow = AgentFlow::new(collaborators);
//! let request = ExecutionRequest::builder()
//!     .user_id("u-1")
//!     .input(Message::user("What's on my calendar?"))
//!     .build();
//! let mut events = flow.execute(&config, request).await?;
//! while let Some(event) = events.next().await {
//!     match event? {
//!         AgentEvent::ChatModelAnswer(mut answer) => {
//!             while let Some(chunk) = answer.next().await {
//!                 print!("{}", chunk?.content);
//!             }
//!         }
//!         AgentEvent::Interrupt(info) => println!("waiting: {}", info.display_message()),
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`AgentEvent`]: crate::events::AgentEvent

pub mod builder;
mod nodes;
mod pre_tools;
mod react;
mod runner;

#[cfg(test)]
mod tests;

pub use builder::{build, BuiltAgent};

use tokio_util::sync::CancellationToken;

use crate::config::FlowSettings;
use crate::error::{AgentFlowError, Result};
use crate::events::AgentEventStream;
use crate::graph::{CheckpointSnapshot, ResumePoint};
use crate::interrupt::{validate_resume, ResumeInfo};
use crate::services::Collaborators;
use crate::types::{AgentConfiguration, ExecutionRequest};

/// Entry point for executing agent turns.
#[derive(Debug, Clone)]
pub struct AgentFlow {
    collaborators: Collaborators,
    settings: FlowSettings,
}

impl AgentFlow {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            settings: FlowSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: FlowSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Build the graph for a turn without running it.
    pub async fn build(
        &self,
        config: &AgentConfiguration,
        request: &ExecutionRequest,
    ) -> Result<BuiltAgent> {
        build(config, request, &self.collaborators, &self.settings).await
    }

    /// Execute one turn.
    ///
    /// Build and resume validation errors are returned directly. Once the
    /// stream is handed back, every outcome arrives through it: the run
    /// ends when the stream closes, after an `Interrupt` event, or after an
    /// `Err` item.
    pub async fn execute(
        &self,
        config: &AgentConfiguration,
        request: ExecutionRequest,
    ) -> Result<AgentEventStream> {
        self.execute_with_cancel(config, request, CancellationToken::new())
            .await
    }

    /// Like [`execute`](Self::execute), with a token that aborts the run.
    pub async fn execute_with_cancel(
        &self,
        config: &AgentConfiguration,
        request: ExecutionRequest,
        cancel: CancellationToken,
    ) -> Result<AgentEventStream> {
        let built = self.build(config, &request).await?;
        let resume = match &request.resume_info {
            Some(info) => Some(resume_point(&built, info).await?),
            None => None,
        };
        Ok(runner::spawn_run(built, resume, &self.settings, cancel))
    }
}

/// Load the checkpoint a resume refers to and check the request against it.
async fn resume_point(built: &BuiltAgent, info: &ResumeInfo) -> Result<ResumePoint> {
    let store = built.graph.checkpoint_store().ok_or_else(|| {
        AgentFlowError::ResumeMismatch(format!(
            "checkpoint '{}' cannot be resumed: the agent has no tools",
            info.interrupt_id
        ))
    })?;
    let snapshot = CheckpointSnapshot::load(store.as_ref(), &info.interrupt_id).await?;
    let options = validate_resume(info, &snapshot.signal)?;
    Ok(ResumePoint {
        snapshot,
        tool_call_id: info.tool_call_id.clone(),
        options,
    })
}
