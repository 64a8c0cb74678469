//! Streaming plumbing: pipes, tool output reassembly, event translation.

pub mod collector;
pub mod pipe;
pub mod translator;

pub use collector::ToolOutputCollector;
pub use pipe::{pipe, unbounded_pipe, PipeWriter};
pub use translator::{decode_suggestions, EventTranslator, DIRECT_REPLY_ACK};
