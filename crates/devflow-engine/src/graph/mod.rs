//! Workflow graph: a registry of stages plus directed edges, with the
//! entire topology validated when the graph is built. Traversal can
//! fail on an external verdict, never on graph shape.

pub mod edge;
pub mod executor;
pub mod node;

use std::collections::{HashMap, HashSet, VecDeque};

use devflow_core::error::{DevflowError, Result};

use crate::stages::Stage;

pub use edge::{BranchLabel, Decision, EdgeKind, Target};
pub use node::NodeId;

/// A validated, immutable workflow graph.
pub struct WorkflowGraph {
    stages: HashMap<NodeId, Box<dyn Stage>>,
    edges: HashMap<NodeId, EdgeKind>,
    entry: NodeId,
}

impl std::fmt::Debug for WorkflowGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowGraph")
            .field("stages", &self.stages.keys().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .field("entry", &self.entry)
            .finish()
    }
}

impl WorkflowGraph {
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub fn stage(&self, node: NodeId) -> Option<&dyn Stage> {
        self.stages.get(&node).map(|s| s.as_ref())
    }

    pub fn edge_kind(&self, node: NodeId) -> Option<&EdgeKind> {
        self.edges.get(&node)
    }
}

/// Builder with build-time structural validation.
pub struct GraphBuilder {
    stages: HashMap<NodeId, Box<dyn Stage>>,
    edges: HashMap<NodeId, EdgeKind>,
    entry: Option<NodeId>,
    errors: Vec<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            stages: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
            errors: Vec::new(),
        }
    }

    /// Register a node with its stage.
    pub fn stage(mut self, node: NodeId, stage: Box<dyn Stage>) -> Self {
        if self.stages.insert(node, stage).is_some() {
            self.errors.push(format!("node '{}' registered twice", node));
        }
        self
    }

    /// Set the entry node.
    pub fn entry(mut self, node: NodeId) -> Self {
        if self.entry.replace(node).is_some() {
            self.errors.push("entry node set twice".to_string());
        }
        self
    }

    /// Add the unconditional edge out of `from`.
    pub fn edge(mut self, from: NodeId, to: NodeId) -> Self {
        self.insert_edge(from, EdgeKind::Unconditional(Target::Node(to)));
        self
    }

    /// Add the conditional edge set out of `from`.
    pub fn conditional(
        mut self,
        from: NodeId,
        decision: Decision,
        branches: impl IntoIterator<Item = (BranchLabel, Target)>,
    ) -> Self {
        self.insert_edge(
            from,
            EdgeKind::Conditional {
                decision,
                branches: branches.into_iter().collect(),
            },
        );
        self
    }

    fn insert_edge(&mut self, from: NodeId, kind: EdgeKind) {
        if self.edges.insert(from, kind).is_some() {
            self.errors
                .push(format!("node '{}' has more than one outgoing edge", from));
        }
    }

    /// Validate the topology and produce the graph.
    ///
    /// Checks: one entry node, every node has exactly one edge kind,
    /// every edge target is registered, every node is reachable from
    /// the entry, and every decision label has a branch. All failures
    /// are configuration errors here, never at run time.
    pub fn build(mut self) -> Result<WorkflowGraph> {
        let entry = match self.entry {
            Some(entry) => entry,
            None => {
                self.errors.push("no entry node".to_string());
                return Err(config_error(self.errors));
            }
        };

        if !self.stages.contains_key(&entry) {
            self.errors
                .push(format!("entry node '{}' is not registered", entry));
        }

        for node in self.stages.keys() {
            match self.edges.get(node) {
                None => self
                    .errors
                    .push(format!("node '{}' has no outgoing edge", node)),
                Some(EdgeKind::Unconditional(target)) => {
                    check_target(&self.stages, &mut self.errors, *node, *target)
                }
                Some(EdgeKind::Conditional { decision, branches }) => {
                    for label in decision.labels() {
                        if !branches.contains_key(&label) {
                            self.errors.push(format!(
                                "node '{}': decision label '{}' has no branch",
                                node, label
                            ));
                        }
                    }
                    for target in branches.values() {
                        check_target(&self.stages, &mut self.errors, *node, *target);
                    }
                }
            }
        }

        for from in self.edges.keys() {
            if !self.stages.contains_key(from) {
                self.errors
                    .push(format!("edge out of unregistered node '{}'", from));
            }
        }

        // Reachability from the entry node
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut queue = VecDeque::from([entry]);
        while let Some(node) = queue.pop_front() {
            if !seen.insert(node) {
                continue;
            }
            match self.edges.get(&node) {
                Some(EdgeKind::Unconditional(Target::Node(next))) => queue.push_back(*next),
                Some(EdgeKind::Conditional { branches, .. }) => {
                    for target in branches.values() {
                        if let Target::Node(next) = target {
                            queue.push_back(*next);
                        }
                    }
                }
                _ => {}
            }
        }
        for node in self.stages.keys() {
            if !seen.contains(node) {
                self.errors
                    .push(format!("node '{}' is unreachable from the entry", node));
            }
        }

        if !self.errors.is_empty() {
            return Err(config_error(self.errors));
        }

        Ok(WorkflowGraph {
            stages: self.stages,
            edges: self.edges,
            entry,
        })
    }
}

fn check_target(
    stages: &HashMap<NodeId, Box<dyn Stage>>,
    errors: &mut Vec<String>,
    from: NodeId,
    target: Target,
) {
    if let Target::Node(to) = target {
        if !stages.contains_key(&to) {
            errors.push(format!(
                "edge '{}' -> '{}' targets an unregistered node",
                from, to
            ));
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn config_error(errors: Vec<String>) -> DevflowError {
    DevflowError::Config(format!("invalid workflow graph: {}", errors.join("; ")))
}
