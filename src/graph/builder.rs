//! Graph construction and validation.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use super::{Node, NodeKey};
use crate::error::{AgentFlowError, Result};
use crate::services::CheckpointStore;

/// Collects nodes and edges before compilation.
#[derive(Default)]
pub struct GraphBuilder {
    nodes: BTreeMap<NodeKey, Arc<dyn Node>>,
    edges: BTreeSet<(NodeKey, NodeKey)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, key: NodeKey, node: Arc<dyn Node>) -> Result<&mut Self> {
        if self.nodes.insert(key, node).is_some() {
            return Err(AgentFlowError::InvalidGraph(format!("node {key} added twice")));
        }
        Ok(self)
    }

    /// `to` fires only after `from` (and every other predecessor) completes.
    pub fn add_edge(&mut self, from: NodeKey, to: NodeKey) -> &mut Self {
        self.edges.insert((from, to));
        self
    }

    /// Validate the graph. A checkpoint store is attached only when given.
    pub fn compile(self, checkpoints: Option<Arc<dyn CheckpointStore>>) -> Result<CompiledGraph> {
        if self.nodes.is_empty() {
            return Err(AgentFlowError::InvalidGraph("graph has no nodes".to_string()));
        }

        let mut predecessors: BTreeMap<NodeKey, Vec<NodeKey>> =
            self.nodes.keys().map(|key| (*key, Vec::new())).collect();
        let mut successors = predecessors.clone();
        for (from, to) in &self.edges {
            if from == to {
                return Err(AgentFlowError::InvalidGraph(format!("node {from} depends on itself")));
            }
            for endpoint in [from, to] {
                if !self.nodes.contains_key(endpoint) {
                    return Err(AgentFlowError::InvalidGraph(format!(
                        "edge {from} -> {to} references unknown node {endpoint}"
                    )));
                }
            }
            predecessors.entry(*to).or_default().push(*from);
            successors.entry(*from).or_default().push(*to);
        }

        let order = topological_order(&predecessors, &successors)?;
        Ok(CompiledGraph {
            nodes: self.nodes,
            predecessors,
            successors,
            order,
            checkpoints,
        })
    }
}

/// Kahn's algorithm; fails when a cycle leaves nodes unvisited.
fn topological_order(
    predecessors: &BTreeMap<NodeKey, Vec<NodeKey>>,
    successors: &BTreeMap<NodeKey, Vec<NodeKey>>,
) -> Result<Vec<NodeKey>> {
    let mut remaining: BTreeMap<NodeKey, usize> = predecessors
        .iter()
        .map(|(key, preds)| (*key, preds.len()))
        .collect();
    let mut queue: VecDeque<NodeKey> = remaining
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(key, _)| *key)
        .collect();
    let mut order = Vec::with_capacity(remaining.len());

    while let Some(key) = queue.pop_front() {
        order.push(key);
        for next in successors.get(&key).into_iter().flatten() {
            if let Some(count) = remaining.get_mut(next) {
                *count -= 1;
                if *count == 0 {
                    queue.push_back(*next);
                }
            }
        }
    }

    if order.len() != predecessors.len() {
        return Err(AgentFlowError::InvalidGraph("graph contains a cycle".to_string()));
    }
    Ok(order)
}

/// A validated graph ready to run.
pub struct CompiledGraph {
    pub(super) nodes: BTreeMap<NodeKey, Arc<dyn Node>>,
    pub(super) predecessors: BTreeMap<NodeKey, Vec<NodeKey>>,
    pub(super) successors: BTreeMap<NodeKey, Vec<NodeKey>>,
    order: Vec<NodeKey>,
    pub(super) checkpoints: Option<Arc<dyn CheckpointStore>>,
}

impl CompiledGraph {
    /// Node keys in a valid execution order.
    pub fn order(&self) -> &[NodeKey] {
        &self.order
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub fn predecessors(&self, key: NodeKey) -> &[NodeKey] {
        self.predecessors.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn successors(&self, key: NodeKey) -> &[NodeKey] {
        self.successors.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_checkpoint_store(&self) -> bool {
        self.checkpoints.is_some()
    }

    pub fn checkpoint_store(&self) -> Option<&Arc<dyn CheckpointStore>> {
        self.checkpoints.as_ref()
    }
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("order", &self.order)
            .field("predecessors", &self.predecessors)
            .field("checkpointed", &self.checkpoints.is_some())
            .finish()
    }
}
