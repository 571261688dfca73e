//! The fixed delivery-pipeline topology and the run entry point.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use devflow_core::error::{DevflowError, Result};
use devflow_core::state::PipelineState;
use devflow_core::traits::{ArtifactStore, ContentService};

use crate::graph::executor::{ExecutionReport, Executor, RunFailure};
use crate::graph::{BranchLabel, Decision, GraphBuilder, NodeId, Target, WorkflowGraph};
use crate::stages;

/// Wire the full delivery pipeline.
///
/// Note the asymmetry on the code path: the fix stages after code
/// review, security review, and QA all loop back into GenerateCode
/// rather than continuing from the fix. Code rejections trigger a
/// fresh generation pass with the stored feedback as context
/// (re-generation, not patching).
pub fn build_workflow(
    service: Arc<dyn ContentService>,
    store: Arc<dyn ArtifactStore>,
) -> Result<WorkflowGraph> {
    use BranchLabel::*;
    use NodeId::*;

    let approve = Decision::APPROVE_OR_FEEDBACK;
    let qa = Decision::PASS_OR_FAIL;

    GraphBuilder::new()
        .entry(GenerateUserStories)
        .stage(
            GenerateUserStories,
            Box::new(stages::GenerateUserStories::new(service.clone())),
        )
        .stage(
            ProductOwnerReview,
            Box::new(stages::ProductOwnerReview::new(service.clone())),
        )
        .stage(
            ReviseUserStories,
            Box::new(stages::ReviseUserStories::new(service.clone())),
        )
        .stage(
            CreateDesignDocument,
            Box::new(stages::CreateDesignDocument::new(service.clone())),
        )
        .stage(DesignReview, Box::new(stages::DesignReview::new(service.clone())))
        .stage(
            ReviseDesignDocument,
            Box::new(stages::ReviseDesignDocument::new(service.clone())),
        )
        .stage(
            GenerateCode,
            Box::new(stages::GenerateCode::new(service.clone(), store.clone())),
        )
        .stage(CodeReview, Box::new(stages::CodeReview::new(service.clone())))
        .stage(
            FixCodeAfterCodeReview,
            Box::new(stages::FixCodeAfterCodeReview::new(
                service.clone(),
                store.clone(),
            )),
        )
        .stage(
            SecurityReview,
            Box::new(stages::SecurityReview::new(service.clone())),
        )
        .stage(
            FixCodeAfterSecurityReview,
            Box::new(stages::FixCodeAfterSecurityReview::new(
                service.clone(),
                store,
            )),
        )
        .stage(
            WriteTestCases,
            Box::new(stages::WriteTestCases::new(service.clone())),
        )
        .stage(
            TestCasesReview,
            Box::new(stages::TestCasesReview::new(service.clone())),
        )
        .stage(FixTestCases, Box::new(stages::FixTestCases::new(service.clone())))
        .stage(QaTesting, Box::new(stages::QaTesting::new(service.clone())))
        .stage(FixCodeAfterQa, Box::new(stages::FixCodeAfterQa::new(service)))
        .edge(GenerateUserStories, ProductOwnerReview)
        .conditional(
            ProductOwnerReview,
            approve,
            [
                (Approved, Target::Node(CreateDesignDocument)),
                (Feedback, Target::Node(ReviseUserStories)),
            ],
        )
        .edge(ReviseUserStories, GenerateUserStories)
        .edge(CreateDesignDocument, DesignReview)
        .conditional(
            DesignReview,
            approve,
            [
                (Approved, Target::Node(GenerateCode)),
                (Feedback, Target::Node(ReviseDesignDocument)),
            ],
        )
        .edge(ReviseDesignDocument, DesignReview)
        .edge(GenerateCode, CodeReview)
        .conditional(
            CodeReview,
            approve,
            [
                (Approved, Target::Node(SecurityReview)),
                (Feedback, Target::Node(FixCodeAfterCodeReview)),
            ],
        )
        .edge(FixCodeAfterCodeReview, GenerateCode)
        .conditional(
            SecurityReview,
            approve,
            [
                (Approved, Target::Node(WriteTestCases)),
                (Feedback, Target::Node(FixCodeAfterSecurityReview)),
            ],
        )
        .edge(FixCodeAfterSecurityReview, GenerateCode)
        .edge(WriteTestCases, TestCasesReview)
        .conditional(
            TestCasesReview,
            approve,
            [
                (Approved, Target::Node(QaTesting)),
                (Feedback, Target::Node(FixTestCases)),
            ],
        )
        .edge(FixTestCases, WriteTestCases)
        .conditional(
            QaTesting,
            qa,
            [
                (Passed, Target::End),
                (Failed, Target::Node(FixCodeAfterQa)),
            ],
        )
        .edge(FixCodeAfterQa, GenerateCode)
        .build()
}

/// A ready-to-run pipeline: the fixed workflow plus an executor.
pub struct Pipeline {
    executor: Executor,
}

impl Pipeline {
    pub fn new(
        service: Arc<dyn ContentService>,
        store: Arc<dyn ArtifactStore>,
        max_visits: usize,
    ) -> Result<Self> {
        let graph = build_workflow(service, store)?;
        Ok(Self {
            executor: Executor::new(graph, max_visits),
        })
    }

    /// Token to cancel an in-flight run at the next node boundary.
    pub fn cancel_token(&self) -> CancellationToken {
        self.executor.cancel_token()
    }

    /// Run the pipeline for one requirements text.
    ///
    /// Empty or whitespace-only requirements never start a run.
    pub async fn run(
        &self,
        requirements: &str,
    ) -> std::result::Result<ExecutionReport, RunFailure> {
        if requirements.trim().is_empty() {
            return Err(RunFailure {
                error: DevflowError::InvalidInput(
                    "requirements text must not be empty".to_string(),
                ),
                trace: Vec::new(),
            });
        }

        info!(requirements_len = requirements.len(), "Accepted requirements");
        self.executor.run(PipelineState::new(requirements)).await
    }
}
