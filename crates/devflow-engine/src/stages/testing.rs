use std::sync::Arc;

use futures::future::BoxFuture;

use devflow_core::content::{ContentRequest, TemplateId};
use devflow_core::error::Result;
use devflow_core::state::PipelineState;
use devflow_core::traits::ContentService;

use super::{run_review, Stage};

// Fallback wording when a design section is missing.
fn functional_text(state: &PipelineState) -> String {
    match &state.design_document {
        Some(doc) if !doc.functional.is_empty() => doc.functional.join("\n"),
        _ => "No functional design available.".to_string(),
    }
}

fn technical_text(state: &PipelineState) -> String {
    match &state.design_document {
        Some(doc) if !doc.technical.is_empty() => doc.technical.join("\n"),
        _ => "No technical design available.".to_string(),
    }
}

/// Generate the test suite from code plus both design sections.
///
/// Reads: code, design_document. Writes: test_cases.
pub struct WriteTestCases {
    service: Arc<dyn ContentService>,
}

impl WriteTestCases {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }
}

impl Stage for WriteTestCases {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = ContentRequest::new(TemplateId::TestGeneration)
                .var("code", &state.code)
                .var("functional_design", functional_text(state))
                .var("technical_design", technical_text(state));
            state.test_cases = self
                .service
                .generate(&request)
                .await?
                .into_cases(TemplateId::TestGeneration)?;
            Ok(())
        })
    }
}

/// Test-strategy review of the case list.
///
/// Reads: test_cases. Writes: status, feedback.
pub struct TestCasesReview {
    service: Arc<dyn ContentService>,
}

impl TestCasesReview {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }
}

impl Stage for TestCasesReview {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = ContentRequest::new(TemplateId::TestReview)
                .var("test_cases", state.test_cases_text());
            run_review(self.service.as_ref(), state, request).await
        })
    }
}

/// Rework the test cases against review feedback.
///
/// Reads: test_cases, feedback. Writes: test_cases.
pub struct FixTestCases {
    service: Arc<dyn ContentService>,
}

impl FixTestCases {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }
}

impl Stage for FixTestCases {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = ContentRequest::new(TemplateId::TestFix)
                .var("test_cases", state.test_cases_text())
                .var("feedback", &state.feedback);
            state.test_cases = self
                .service
                .generate(&request)
                .await?
                .into_cases(TemplateId::TestFix)?;
            Ok(())
        })
    }
}

/// QA evaluation of the code against its test cases.
///
/// Reads: code, test_cases. Writes: status, feedback.
pub struct QaTesting {
    service: Arc<dyn ContentService>,
}

impl QaTesting {
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }
}

impl Stage for QaTesting {
    fn execute<'a>(&'a self, state: &'a mut PipelineState) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = ContentRequest::new(TemplateId::QaEvaluation)
                .var("code", &state.code)
                .var("test_cases", state.test_cases_text());
            run_review(self.service.as_ref(), state, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use devflow_core::state::{DesignDocument, ReviewStatus};
    use devflow_test_utils::ScriptedContentService;

    use super::*;

    #[tokio::test]
    async fn test_write_cases_uses_both_design_sections() {
        let service = Arc::new(ScriptedContentService::approving());
        let stage = WriteTestCases::new(service.clone());

        let mut state = PipelineState::new("req");
        state.code = "code".to_string();
        state.design_document = Some(DesignDocument {
            functional: vec!["f".to_string()],
            technical: vec!["t".to_string()],
        });
        stage.execute(&mut state).await.unwrap();

        assert!(!state.test_cases.is_empty());
        let variables = &service.requests()[0].variables;
        assert_eq!(variables.get("functional_design").map(String::as_str), Some("f"));
        assert_eq!(variables.get("technical_design").map(String::as_str), Some("t"));
    }

    #[tokio::test]
    async fn test_write_cases_fallback_without_design() {
        let service = Arc::new(ScriptedContentService::approving());
        let stage = WriteTestCases::new(service.clone());

        let mut state = PipelineState::new("req");
        stage.execute(&mut state).await.unwrap();

        let variables = &service.requests()[0].variables;
        assert_eq!(
            variables.get("functional_design").map(String::as_str),
            Some("No functional design available.")
        );
        assert_eq!(
            variables.get("technical_design").map(String::as_str),
            Some("No technical design available.")
        );
    }

    #[tokio::test]
    async fn test_qa_review_reads_code_and_cases() {
        let service = Arc::new(ScriptedContentService::approving());
        service.script_verdict(TemplateId::QaEvaluation, ReviewStatus::NotApproved, "2 failing");
        let stage = QaTesting::new(service.clone());

        let mut state = PipelineState::new("req");
        state.code = "code".to_string();
        state.test_cases = vec!["c1".to_string(), "c2".to_string()];
        stage.execute(&mut state).await.unwrap();

        assert_eq!(state.status, ReviewStatus::NotApproved);
        assert_eq!(state.feedback, "2 failing");
        let variables = &service.requests()[0].variables;
        assert_eq!(variables.get("test_cases").map(String::as_str), Some("c1\nc2"));
    }

    #[tokio::test]
    async fn test_fix_cases_replaces_list() {
        let service = Arc::new(ScriptedContentService::approving());
        service.script(
            TemplateId::TestFix,
            devflow_core::content::ContentPayload::Cases {
                cases: vec!["fixed case".to_string()],
            },
        );
        let stage = FixTestCases::new(service);

        let mut state = PipelineState::new("req");
        state.test_cases = vec!["broken case".to_string()];
        state.feedback = "tighten assertions".to_string();
        stage.execute(&mut state).await.unwrap();

        assert_eq!(state.test_cases, vec!["fixed case"]);
    }
}
