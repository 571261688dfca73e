use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::info;

use devflow_core::content::{ContentRequest, TemplateId};
use devflow_core::error::Result;
use devflow_core::state::PipelineState;
use devflow_core::traits::{ArtifactStore, ContentService};

use super::{design_text, run_review, Stage};
use crate::bundle::parse_code_bundle;

/// Parse the generated bundle and persist each file.
///
/// Zero well-formed blocks is lenient (warning inside the parser, no
/// artifacts, run proceeds).
async fn persist_bundle(store: &dyn ArtifactStore, code: &str) -> Result<()> {
    let files = parse_code_bundle(code);
    info!(files = files.len(), "Persisting code bundle");
    for file in &files {
        store.save(&file.filename, &file.code).await?;
    }
    Ok(())
}

/// Fresh code generation from the design documents.
///
/// Reads: design_document. Writes: code (+ artifact side channel).
pub struct GenerateCode {
    service: Arc<dyn ContentService>,
    store: Arc<dyn ArtifactStore>,
}

impl GenerateCode {
    pub fn new(service: Arc<dyn ContentService>, store: Arc<dyn ArtifactStore>) -> Self {
        Self { service, store }
    }
}

impl Stage for GenerateCode {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = ContentRequest::new(TemplateId::CodeGeneration)
                .var("design_document", design_text(state));
            let code = self
                .service
                .generate(&request)
                .await?
                .into_code(TemplateId::CodeGeneration)?;
            persist_bundle(self.store.as_ref(), &code).await?;
            state.code = code;
            Ok(())
        })
    }
}

/// Reviews generated code for quality and best practices.
///
/// Reads: code. Writes: status, feedback.
pub struct CodeReview {
    service: Arc<dyn ContentService>,
}

impl CodeReview {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }
}

impl Stage for CodeReview {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = ContentRequest::new(TemplateId::CodeReview).var("code", &state.code);
            run_review(self.service.as_ref(), state, request).await
        })
    }
}

/// Rework the code against code-review feedback. The result is context
/// for the fresh generation pass the loopback triggers, not a patch
/// applied in place.
///
/// Reads: code, feedback. Writes: code (+ artifact side channel).
pub struct FixCodeAfterCodeReview {
    service: Arc<dyn ContentService>,
    store: Arc<dyn ArtifactStore>,
}

impl FixCodeAfterCodeReview {
    pub fn new(service: Arc<dyn ContentService>, store: Arc<dyn ArtifactStore>) -> Self {
        Self { service, store }
    }
}

impl Stage for FixCodeAfterCodeReview {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = ContentRequest::new(TemplateId::CodeFix)
                .var("code", &state.code)
                .var("feedback", &state.feedback);
            let code = self
                .service
                .generate(&request)
                .await?
                .into_code(TemplateId::CodeFix)?;
            persist_bundle(self.store.as_ref(), &code).await?;
            state.code = code;
            Ok(())
        })
    }
}

/// Vulnerability assessment of the generated code.
///
/// Reads: code. Writes: status, feedback.
pub struct SecurityReview {
    service: Arc<dyn ContentService>,
}

impl SecurityReview {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }
}

impl Stage for SecurityReview {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = ContentRequest::new(TemplateId::SecurityReview).var("code", &state.code);
            run_review(self.service.as_ref(), state, request).await
        })
    }
}

/// Rework the code against security findings.
///
/// Reads: code, feedback. Writes: code (+ artifact side channel).
pub struct FixCodeAfterSecurityReview {
    service: Arc<dyn ContentService>,
    store: Arc<dyn ArtifactStore>,
}

impl FixCodeAfterSecurityReview {
    pub fn new(service: Arc<dyn ContentService>, store: Arc<dyn ArtifactStore>) -> Self {
        Self { service, store }
    }
}

impl Stage for FixCodeAfterSecurityReview {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = ContentRequest::new(TemplateId::SecurityFix)
                .var("code", &state.code)
                .var("feedback", &state.feedback);
            let code = self
                .service
                .generate(&request)
                .await?
                .into_code(TemplateId::SecurityFix)?;
            persist_bundle(self.store.as_ref(), &code).await?;
            state.code = code;
            Ok(())
        })
    }
}

/// Rework the code against QA findings. Does not persist: the loopback
/// re-enters GenerateCode, which regenerates and persists.
///
/// Reads: code, test_cases, feedback, design_document. Writes: code.
pub struct FixCodeAfterQa {
    service: Arc<dyn ContentService>,
}

impl FixCodeAfterQa {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }
}

impl Stage for FixCodeAfterQa {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = ContentRequest::new(TemplateId::QaFix)
                .var("code", &state.code)
                .var("test_cases", state.test_cases_text())
                .var("feedback", &state.feedback)
                .var("design_document", design_text(state));
            state.code = self
                .service
                .generate(&request)
                .await?
                .into_code(TemplateId::QaFix)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use devflow_core::content::ContentPayload;
    use devflow_core::state::{DesignDocument, ReviewStatus};
    use devflow_test_utils::{MemoryArtifactStore, ScriptedContentService};

    use super::*;

    fn two_file_bundle() -> String {
        "Filename: main.py\nCode:\n```python\nprint('a')\n```\n\
         Filename: util.py\nCode:\n```python\nprint('b')\n```\n"
            .to_string()
    }

    #[tokio::test]
    async fn test_generate_code_persists_each_file() {
        let service = Arc::new(ScriptedContentService::approving());
        service.script(
            TemplateId::CodeGeneration,
            ContentPayload::Code {
                generated_code: two_file_bundle(),
            },
        );
        let store = Arc::new(MemoryArtifactStore::new());
        let stage = GenerateCode::new(service, store.clone());

        let mut state = PipelineState::new("req");
        state.design_document = Some(DesignDocument::default());
        stage.execute(&mut state).await.unwrap();

        assert!(state.code.contains("Filename: main.py"));
        let saved = store.saved();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].0, "main.py");
        assert_eq!(saved[1].0, "util.py");
    }

    #[tokio::test]
    async fn test_generate_code_lenient_on_unparseable_bundle() {
        let service = Arc::new(ScriptedContentService::approving());
        service.script(
            TemplateId::CodeGeneration,
            ContentPayload::Code {
                generated_code: "no file blocks here".to_string(),
            },
        );
        let store = Arc::new(MemoryArtifactStore::new());
        let stage = GenerateCode::new(service, store.clone());

        let mut state = PipelineState::new("req");
        stage.execute(&mut state).await.unwrap();

        assert_eq!(state.code, "no file blocks here");
        assert!(store.saved().is_empty());
    }

    #[tokio::test]
    async fn test_code_review_reads_code_writes_verdict() {
        let service = Arc::new(ScriptedContentService::approving());
        service.script_verdict(TemplateId::CodeReview, ReviewStatus::NotApproved, "smells");
        let stage = CodeReview::new(service.clone());

        let mut state = PipelineState::new("req");
        state.code = "some code".to_string();
        stage.execute(&mut state).await.unwrap();

        assert_eq!(state.status, ReviewStatus::NotApproved);
        assert_eq!(state.feedback, "smells");
        assert_eq!(state.code, "some code");
        assert_eq!(
            service.requests()[0].variables.get("code").map(String::as_str),
            Some("some code")
        );
    }

    #[tokio::test]
    async fn test_qa_fix_does_not_persist() {
        let service = Arc::new(ScriptedContentService::approving());
        service.script(
            TemplateId::QaFix,
            ContentPayload::Code {
                generated_code: two_file_bundle(),
            },
        );
        let stage = FixCodeAfterQa::new(service.clone());

        let mut state = PipelineState::new("req");
        state.code = "old".to_string();
        state.test_cases = vec!["case".to_string()];
        state.feedback = "failing".to_string();
        stage.execute(&mut state).await.unwrap();

        assert!(state.code.contains("Filename: main.py"));
        let variables = &service.requests()[0].variables;
        assert!(variables.contains_key("test_cases"));
        assert!(variables.contains_key("design_document"));
    }

    #[tokio::test]
    async fn test_security_fix_persists() {
        let service = Arc::new(ScriptedContentService::approving());
        service.script(
            TemplateId::SecurityFix,
            ContentPayload::Code {
                generated_code: two_file_bundle(),
            },
        );
        let store = Arc::new(MemoryArtifactStore::new());
        let stage = FixCodeAfterSecurityReview::new(service, store.clone());

        let mut state = PipelineState::new("req");
        state.code = "old".to_string();
        state.feedback = "sql injection".to_string();
        stage.execute(&mut state).await.unwrap();

        assert_eq!(store.saved().len(), 2);
    }
}
