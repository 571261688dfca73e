pub mod openai;
pub mod retry;
pub mod templates;

use std::sync::Arc;

use devflow_core::config::{ModelConfig, RetryConfig};
use devflow_core::traits::ContentService;

pub use openai::OpenAiContentService;
pub use retry::RetryingService;

/// Create a content service for the configured provider, wrapped with
/// the collaborator-boundary retry policy.
pub fn create_service(model: &ModelConfig, retry: &RetryConfig) -> Arc<dyn ContentService> {
    // Every supported provider speaks the OpenAI chat-completions API
    let inner = OpenAiContentService::new(model.clone());
    Arc::new(RetryingService::new(Box::new(inner), retry.clone()))
}
