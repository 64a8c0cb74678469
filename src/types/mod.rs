//! Core types for AgentFlow.

pub mod agent;
pub mod message;
pub mod request;
pub mod state;

pub use agent::*;
pub use message::*;
pub use request::*;
pub use state::*;
