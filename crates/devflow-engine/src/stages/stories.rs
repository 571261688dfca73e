use std::sync::Arc;

use futures::future::BoxFuture;

use devflow_core::content::{ContentRequest, TemplateId};
use devflow_core::error::{DevflowError, Result};
use devflow_core::state::PipelineState;
use devflow_core::traits::ContentService;

use super::{run_review, Stage};

/// Generate user stories from the requirements text.
///
/// Reads: requirements. Writes: user_stories.
pub struct GenerateUserStories {
    service: Arc<dyn ContentService>,
}

impl GenerateUserStories {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }
}

impl Stage for GenerateUserStories {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if state.requirements.trim().is_empty() {
                return Err(DevflowError::InvalidInput(
                    "requirements must be set before generating user stories".to_string(),
                ));
            }
            let request = ContentRequest::new(TemplateId::StoryGeneration)
                .var("requirements", &state.requirements);
            state.user_stories = self
                .service
                .generate(&request)
                .await?
                .into_stories(TemplateId::StoryGeneration)?;
            Ok(())
        })
    }
}

/// Regenerate the stories from the Product Owner's feedback.
///
/// Reads: feedback, user_stories. Writes: user_stories.
pub struct ReviseUserStories {
    service: Arc<dyn ContentService>,
}

impl ReviseUserStories {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }
}

impl Stage for ReviseUserStories {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = ContentRequest::new(TemplateId::StoryRevision)
                .var("feedback", &state.feedback)
                .var("user_stories", state.stories_text());
            state.user_stories = self
                .service
                .generate(&request)
                .await?
                .into_stories(TemplateId::StoryRevision)?;
            Ok(())
        })
    }
}

/// INVEST review of the story set.
///
/// Reads: user_stories. Writes: status, feedback.
pub struct ProductOwnerReview {
    service: Arc<dyn ContentService>,
}

impl ProductOwnerReview {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }
}

impl Stage for ProductOwnerReview {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = ContentRequest::new(TemplateId::StoryReview)
                .var("user_stories", state.stories_text());
            run_review(self.service.as_ref(), state, request).await
        })
    }
}
