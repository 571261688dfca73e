//! Deterministic doubles for pipeline tests.
//!
//! `ScriptedContentService` answers every request from a canned table:
//! per-template FIFO scripts take precedence, then a deterministic
//! default for the template's payload kind. Identical request
//! sequences always produce identical responses, which is what the
//! engine's idempotence property is tested against.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use futures::future::BoxFuture;

use devflow_core::content::{ContentPayload, ContentRequest, PayloadKind, TemplateId};
use devflow_core::error::Result;
use devflow_core::state::{DesignDocument, ReviewStatus};
use devflow_core::traits::{ArtifactStore, ContentService};

/// A content service double driven by canned payloads.
pub struct ScriptedContentService {
    scripts: Mutex<HashMap<TemplateId, VecDeque<ContentPayload>>>,
    requests: Mutex<Vec<ContentRequest>>,
    default_status: ReviewStatus,
}

impl ScriptedContentService {
    /// Every unscripted review returns `Approved`.
    pub fn approving() -> Self {
        Self::with_default_status(ReviewStatus::Approved)
    }

    /// Every unscripted review returns `Not Approved`.
    pub fn rejecting() -> Self {
        Self::with_default_status(ReviewStatus::NotApproved)
    }

    fn with_default_status(default_status: ReviewStatus) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            default_status,
        }
    }

    /// Queue a payload for a template (FIFO, consumed before defaults).
    pub fn script(&self, template: TemplateId, payload: ContentPayload) {
        self.scripts
            .lock()
            .unwrap()
            .entry(template)
            .or_default()
            .push_back(payload);
    }

    /// Queue a verdict for a review template.
    pub fn script_verdict(&self, template: TemplateId, status: ReviewStatus, review: &str) {
        self.script(
            template,
            ContentPayload::Verdict {
                review: review.to_string(),
                status,
            },
        );
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<ContentRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// How many requests were made for a template.
    pub fn calls(&self, template: TemplateId) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.template == template)
            .count()
    }

    fn default_payload(&self, template: TemplateId) -> ContentPayload {
        match template.payload_kind() {
            PayloadKind::Stories => ContentPayload::Stories {
                stories: vec![
                    "As a user, I want to add items so that I can track my work.".to_string(),
                    "As an admin, I want to manage users so that access stays controlled."
                        .to_string(),
                ],
            },
            PayloadKind::Verdict => ContentPayload::Verdict {
                review: match self.default_status {
                    ReviewStatus::Approved => "Meets the bar.".to_string(),
                    _ => "Does not meet the bar.".to_string(),
                },
                status: self.default_status,
            },
            PayloadKind::Design => ContentPayload::Design {
                document: DesignDocument {
                    functional: vec!["Item CRUD flows".to_string()],
                    technical: vec!["REST API over SQLite".to_string()],
                },
            },
            PayloadKind::Code => ContentPayload::Code {
                generated_code: "Filename: main.py\nCode:\n```python\nprint('app')\n```\n"
                    .to_string(),
            },
            PayloadKind::Cases => ContentPayload::Cases {
                cases: vec!["Add item persists the item".to_string()],
            },
        }
    }
}

impl ContentService for ScriptedContentService {
    fn generate(&self, request: &ContentRequest) -> BoxFuture<'_, Result<ContentPayload>> {
        self.requests.lock().unwrap().push(request.clone());
        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&request.template)
            .and_then(|queue| queue.pop_front());
        let payload = scripted.unwrap_or_else(|| self.default_payload(request.template));
        Box::pin(async move { Ok(payload) })
    }
}

/// An artifact store that records saves in memory.
#[derive(Default)]
pub struct MemoryArtifactStore {
    saves: Mutex<Vec<(String, String)>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<(String, String)> {
        self.saves.lock().unwrap().clone()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn save(&self, name: &str, content: &str) -> BoxFuture<'_, Result<()>> {
        self.saves
            .lock()
            .unwrap()
            .push((name.to_string(), content.to_string()));
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_payload_takes_precedence() {
        let service = ScriptedContentService::approving();
        service.script_verdict(
            TemplateId::StoryReview,
            ReviewStatus::NotApproved,
            "needs acceptance criteria",
        );

        let request = ContentRequest::new(TemplateId::StoryReview).var("user_stories", "s");
        let first = futures::executor::block_on(service.generate(&request)).unwrap();
        let (status, _) = first.into_verdict(TemplateId::StoryReview).unwrap();
        assert_eq!(status, ReviewStatus::NotApproved);

        // Script exhausted, defaults kick in
        let second = futures::executor::block_on(service.generate(&request)).unwrap();
        let (status, _) = second.into_verdict(TemplateId::StoryReview).unwrap();
        assert_eq!(status, ReviewStatus::Approved);

        assert_eq!(service.calls(TemplateId::StoryReview), 2);
    }

    #[test]
    fn test_memory_store_records() {
        let store = MemoryArtifactStore::new();
        futures::executor::block_on(store.save("a.py", "x")).unwrap();
        assert_eq!(store.saved(), vec![("a.py".to_string(), "x".to_string())]);
    }
}
