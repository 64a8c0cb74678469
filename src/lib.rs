//! AgentFlow: per-request agent execution graphs.
//!
//! Turns one conversational turn (persona, model, knowledge, tools and
//! history) into a live stream of typed [`AgentEvent`](events::AgentEvent)s.
//! The graph shape depends on the agent: a bare model call when it has no
//! tools, a reasoning/acting loop when it does. A tool that needs outside
//! input (an OAuth login, a workflow question) suspends the run behind a
//! checkpoint that a later request can resume.
//!
//! # Quick Start
//!
//! ```no_run
//! use agentflow::prelude::*;
//! use futures::StreamExt;
//!
//! # async fn example(collaborators: Collaborators) -> agentflow::Result<()> {
//! let config = AgentConfiguration::builder()
//!     .persona("You are {{name}}, a travel assistant.")
//!     .model(ModelRef::new("gpt-4o"))
//!     .build();
//! let request = ExecutionRequest::builder()
//!     .user_id("u-1")
//!     .input(Message::user("Find me a hotel in Oslo"))
//!     .build();
//!
//! let flow = AgentFlow::new(collaborators).with_settings(FlowSettings::from_env());
//! let mut events = flow.execute(&config, request).await?;
//! while let Some(event) = events.next().await {
//!     println!("{:?}", event?.kind());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod flow;
pub mod graph;
pub mod interrupt;
pub mod modality;
pub mod models;
pub mod prelude;
pub mod prompt;
pub mod provider;
pub mod retriever;
pub mod services;
pub mod stream;
pub mod tools;
pub mod types;

pub use error::{AgentFlowError, Result};
pub use flow::AgentFlow;
