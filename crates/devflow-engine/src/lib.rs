//! Workflow orchestration engine for the delivery pipeline.
//!
//! A run walks a fixed graph of stages (story, design, code, security,
//! test, QA) with approval gates after every review stage. Rejections
//! loop back to the stage that produced the failing artifact; the
//! executor enforces a total-visit ceiling because nothing structural
//! guarantees the review verdicts ever converge.

pub mod artifacts;
pub mod bundle;
pub mod graph;
pub mod stages;
pub mod workflow;

pub use artifacts::FsArtifactStore;
pub use bundle::{parse_code_bundle, SourceFile};
pub use graph::executor::{ExecutionReport, Executor, RunFailure, TraceEntry};
pub use graph::{BranchLabel, Decision, EdgeKind, GraphBuilder, NodeId, Target, WorkflowGraph};
pub use stages::Stage;
pub use workflow::Pipeline;
