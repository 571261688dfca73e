use std::sync::Arc;

use futures::future::BoxFuture;

use devflow_core::content::{ContentRequest, TemplateId};
use devflow_core::error::Result;
use devflow_core::state::PipelineState;
use devflow_core::traits::ContentService;

use super::{design_text, run_review, Stage};

/// Turn the approved stories into functional + technical design docs.
///
/// Reads: user_stories. Writes: design_document.
pub struct CreateDesignDocument {
    service: Arc<dyn ContentService>,
}

impl CreateDesignDocument {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }
}

impl Stage for CreateDesignDocument {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = ContentRequest::new(TemplateId::DesignGeneration)
                .var("user_stories", state.stories_text());
            let document = self
                .service
                .generate(&request)
                .await?
                .into_design(TemplateId::DesignGeneration)?;
            state.design_document = Some(document);
            Ok(())
        })
    }
}

/// Architect review of both design sections.
///
/// Reads: design_document. Writes: status, feedback.
pub struct DesignReview {
    service: Arc<dyn ContentService>,
}

impl DesignReview {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }
}

impl Stage for DesignReview {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = ContentRequest::new(TemplateId::DesignReview)
                .var("design_document", design_text(state));
            run_review(self.service.as_ref(), state, request).await
        })
    }
}

/// Rework the design documents against the review feedback.
///
/// Reads: feedback, design_document. Writes: design_document.
pub struct ReviseDesignDocument {
    service: Arc<dyn ContentService>,
}

impl ReviseDesignDocument {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }
}

impl Stage for ReviseDesignDocument {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = ContentRequest::new(TemplateId::DesignRevision)
                .var("feedback", &state.feedback)
                .var("design_document", design_text(state));
            let document = self
                .service
                .generate(&request)
                .await?
                .into_design(TemplateId::DesignRevision)?;
            state.design_document = Some(document);
            Ok(())
        })
    }
}
