use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use devflow_core::error::{DevflowError, Result};
use devflow_core::state::{PipelineState, ReviewStatus};

use super::edge::{EdgeKind, Target};
use super::node::NodeId;
use super::WorkflowGraph;

/// One visited node: identifier plus a snapshot of the verdict fields
/// as they stood right after the stage ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub seq: usize,
    pub node: NodeId,
    pub status: ReviewStatus,
    pub feedback: String,
    pub at: DateTime<Utc>,
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub run_id: String,
    /// Final pipeline state at the terminal node.
    pub state: PipelineState,
    /// Node visits in execution order.
    pub trace: Vec<TraceEntry>,
    pub total_elapsed_ms: u64,
}

/// A run that ended on a fatal error. Carries the trace gathered up to
/// the failure point for diagnosis.
#[derive(Debug)]
pub struct RunFailure {
    pub error: DevflowError,
    pub trace: Vec<TraceEntry>,
}

impl RunFailure {
    fn new(error: DevflowError, trace: Vec<TraceEntry>) -> Self {
        Self { error, trace }
    }
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (after {} node visits)", self.error, self.trace.len())
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Walks a `WorkflowGraph` from its entry node.
///
/// One node at a time, one owner of the state: a stage is an atomic
/// unit once started, and cancellation is observed only between node
/// visits. The trace is exactly the visit sequence.
pub struct Executor {
    graph: WorkflowGraph,
    max_visits: usize,
    cancel: CancellationToken,
}

impl Executor {
    pub fn new(graph: WorkflowGraph, max_visits: usize) -> Self {
        Self {
            graph,
            max_visits,
            cancel: CancellationToken::new(),
        }
    }

    /// Get a cancellation token for this executor. Cancellation takes
    /// effect at the next node boundary.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the graph to its terminal node.
    pub async fn run(
        &self,
        initial_state: PipelineState,
    ) -> std::result::Result<ExecutionReport, RunFailure> {
        let run_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        let mut state = initial_state;
        let mut trace: Vec<TraceEntry> = Vec::new();
        let mut current = self.graph.entry();

        info!(run_id = %run_id, entry = %current, "Starting pipeline run");

        loop {
            if self.cancel.is_cancelled() {
                info!(run_id = %run_id, node = %current, "Run cancelled at node boundary");
                return Err(RunFailure::new(DevflowError::Cancelled, trace));
            }

            if trace.len() >= self.max_visits {
                error!(
                    run_id = %run_id,
                    limit = self.max_visits,
                    "Visit ceiling reached, aborting run"
                );
                return Err(RunFailure::new(
                    DevflowError::LoopLimitExceeded {
                        limit: self.max_visits,
                    },
                    trace,
                ));
            }

            info!(run_id = %run_id, node = %current, "Executing stage");

            if let Err(e) = self.execute_stage(current, &mut state).await {
                error!(run_id = %run_id, node = %current, error = %e, "Stage failed");
                return Err(RunFailure::new(e, trace));
            }

            trace.push(TraceEntry {
                seq: trace.len(),
                node: current,
                status: state.status,
                feedback: state.feedback.clone(),
                at: Utc::now(),
            });

            let next = match self.graph.edge_kind(current) {
                Some(EdgeKind::Unconditional(target)) => *target,
                Some(EdgeKind::Conditional { decision, branches }) => {
                    let label = decision.decide(&state);
                    debug!(run_id = %run_id, node = %current, label = %label, "Decision");
                    match branches.get(&label) {
                        Some(target) => *target,
                        None => {
                            return Err(RunFailure::new(
                                DevflowError::UnknownBranch {
                                    node: current.to_string(),
                                    label: label.to_string(),
                                },
                                trace,
                            ));
                        }
                    }
                }
                // Build-time validation guarantees an edge per node
                None => {
                    return Err(RunFailure::new(
                        DevflowError::Config(format!("node '{}' has no outgoing edge", current)),
                        trace,
                    ));
                }
            };

            match next {
                Target::Node(node) => current = node,
                Target::End => break,
            }
        }

        let total_elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            visits = trace.len(),
            total_elapsed_ms,
            "Pipeline run complete"
        );

        Ok(ExecutionReport {
            run_id,
            state,
            trace,
            total_elapsed_ms,
        })
    }

    async fn execute_stage(&self, node: NodeId, state: &mut PipelineState) -> Result<()> {
        let stage = self
            .graph
            .stage(node)
            .ok_or_else(|| DevflowError::Config(format!("node '{}' has no stage", node)))?;
        stage.execute(state).await
    }
}
