//! Reassembly of streamed tool output.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::{concat_messages, Message};

/// Accumulates tool output chunks per tool-call index.
#[derive(Debug, Default)]
pub struct ToolOutputCollector {
    chunks: BTreeMap<usize, Vec<Message>>,
}

impl ToolOutputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, index: usize, chunk: Message) {
        self.chunks.entry(index).or_default().push(chunk);
    }

    /// One concatenated message per index that produced output, in index
    /// order. Chunks keep their arrival order.
    pub fn finish(self) -> Result<Vec<Message>> {
        self.chunks
            .into_values()
            .map(|chunks| concat_messages(&chunks))
            .collect()
    }

    /// Like [`finish`](Self::finish) but keyed by index.
    pub fn finish_indexed(self) -> Result<BTreeMap<usize, Message>> {
        self.chunks
            .into_iter()
            .map(|(index, chunks)| concat_messages(&chunks).map(|message| (index, message)))
            .collect()
    }
}
