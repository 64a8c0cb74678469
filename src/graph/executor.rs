//! Concurrent execution of a compiled graph.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tracing::{debug, info};

use super::builder::CompiledGraph;
use super::checkpoint::CheckpointSnapshot;
use super::{NodeContext, NodeInputs, NodeKey, NodeResume, NodeValue};
use crate::error::{AgentFlowError, Result};
use crate::interrupt::ResumeOptions;

/// Where a resumed run picks up.
#[derive(Debug, Clone)]
pub struct ResumePoint {
    pub snapshot: CheckpointSnapshot,
    pub tool_call_id: String,
    pub options: Option<ResumeOptions>,
}

impl CompiledGraph {
    /// Run every node once, in dependency order.
    ///
    /// A node is started as soon as all of its predecessors have completed;
    /// independent nodes run concurrently. On resume, nodes recorded in the
    /// snapshot are not run again and the suspended node receives its saved
    /// state. When a node suspends and a checkpoint store is attached, the
    /// snapshot is written under the run's checkpoint id before the
    /// interrupt is returned.
    pub async fn run(
        &self,
        ctx: &NodeContext,
        resume: Option<ResumePoint>,
    ) -> Result<BTreeMap<NodeKey, NodeValue>> {
        let (mut completed, mut pending_resume) = match resume {
            Some(point) => {
                let node = point.snapshot.signal.node;
                let resume = NodeResume {
                    state: point.snapshot.signal.state,
                    tool_call_id: point.tool_call_id,
                    options: point.options,
                };
                (point.snapshot.completed, Some((node, resume)))
            }
            None => (BTreeMap::new(), None),
        };
        completed.retain(|key, _| self.contains(*key));

        let mut waiting: BTreeMap<NodeKey, usize> = self
            .nodes
            .keys()
            .filter(|key| !completed.contains_key(*key))
            .map(|key| {
                let open = self
                    .predecessors(*key)
                    .iter()
                    .filter(|pred| !completed.contains_key(*pred))
                    .count();
                (*key, open)
            })
            .collect();
        let mut in_flight = FuturesUnordered::new();

        loop {
            let ready: Vec<NodeKey> = waiting
                .iter()
                .filter(|(_, open)| **open == 0)
                .map(|(key, _)| *key)
                .collect();
            for key in ready {
                waiting.remove(&key);
                let inputs = NodeInputs::new(
                    self.predecessors(key)
                        .iter()
                        .filter_map(|pred| completed.get(pred).map(|value| (*pred, value.clone())))
                        .collect(),
                );
                let mut node_ctx = ctx.clone();
                let resumes_here = matches!(&pending_resume, Some((node, _)) if *node == key);
                node_ctx.resume = if resumes_here {
                    pending_resume.take().map(|(_, resume)| resume)
                } else {
                    None
                };

                debug!(checkpoint_id = %ctx.checkpoint_id, node = %key, "node started");
                ctx.observer.on_node_start(key).await;
                let node = Arc::clone(&self.nodes[&key]);
                in_flight.push(
                    async move {
                        let outcome = node.run(inputs, &node_ctx).await;
                        (key, outcome)
                    }
                    .boxed(),
                );
            }

            if in_flight.is_empty() {
                break;
            }
            let next = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => return Err(AgentFlowError::Canceled),
                next = in_flight.next() => next,
            };
            let Some((key, outcome)) = next else {
                break;
            };

            match outcome {
                Ok(value) => {
                    debug!(checkpoint_id = %ctx.checkpoint_id, node = %key, "node finished");
                    ctx.observer.on_node_end(key, &value).await;
                    for next in self.successors(key) {
                        if let Some(open) = waiting.get_mut(next) {
                            *open = open.saturating_sub(1);
                        }
                    }
                    completed.insert(key, value);
                }
                Err(AgentFlowError::Interrupted(signal)) => {
                    info!(
                        checkpoint_id = %ctx.checkpoint_id,
                        node = %key,
                        pending = signal.interrupts.len(),
                        "node suspended"
                    );
                    if let Some(store) = &self.checkpoints {
                        let snapshot = CheckpointSnapshot {
                            completed: completed.clone(),
                            signal: (*signal).clone(),
                        };
                        snapshot.save(store.as_ref(), &ctx.checkpoint_id).await?;
                    }
                    return Err(AgentFlowError::Interrupted(signal));
                }
                Err(err) => return Err(err),
            }
        }

        if !waiting.is_empty() {
            return Err(AgentFlowError::Internal(format!(
                "{} nodes never became ready",
                waiting.len()
            )));
        }
        Ok(completed)
    }
}
