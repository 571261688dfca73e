//! The stage set.
//!
//! A stage is a named unit of work over the pipeline state with no
//! control flow of its own. Generation stages write exactly their
//! content field and leave the verdict fields alone; review stages
//! write `status` and `feedback` and never touch the content they
//! review. All content synthesis is delegated to the injected
//! `ContentService`.

pub mod code;
pub mod design;
pub mod stories;
pub mod testing;

use futures::future::BoxFuture;
use tracing::debug;

use devflow_core::content::ContentRequest;
use devflow_core::error::Result;
use devflow_core::state::PipelineState;
use devflow_core::traits::ContentService;

pub use code::{
    CodeReview, FixCodeAfterCodeReview, FixCodeAfterQa, FixCodeAfterSecurityReview, GenerateCode,
    SecurityReview,
};
pub use design::{CreateDesignDocument, DesignReview, ReviseDesignDocument};
pub use stories::{GenerateUserStories, ProductOwnerReview, ReviseUserStories};
pub use testing::{FixTestCases, QaTesting, TestCasesReview, WriteTestCases};

/// One unit of work in the pipeline.
///
/// `execute` mutates the state in place; given identical input state
/// and identical content-service responses it must produce identical
/// output (no side state beyond what `PipelineState` carries).
pub trait Stage: Send + Sync + 'static {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>>;
}

/// Run a review request and write the verdict into the state.
pub(crate) async fn run_review(
    service: &dyn ContentService,
    state: &mut PipelineState,
    request: ContentRequest,
) -> Result<()> {
    let template = request.template;
    let (status, feedback) = service.generate(&request).await?.into_verdict(template)?;
    debug!(template = %template, status = %status, "Review verdict");
    state.status = status;
    state.feedback = feedback;
    Ok(())
}

/// The design document rendered for a prompt, with a fixed fallback
/// when no document exists yet.
pub(crate) fn design_text(state: &PipelineState) -> String {
    state
        .design_document
        .as_ref()
        .map(|doc| doc.render())
        .unwrap_or_else(|| "No design available.".to_string())
}
