use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DevflowError, Result};
use crate::state::{DesignDocument, ReviewStatus};

/// Every prompt role the pipeline can ask the content service to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    StoryGeneration,
    StoryRevision,
    StoryReview,
    DesignGeneration,
    DesignRevision,
    DesignReview,
    CodeGeneration,
    CodeReview,
    CodeFix,
    SecurityReview,
    SecurityFix,
    TestGeneration,
    TestReview,
    TestFix,
    QaEvaluation,
    QaFix,
}

impl TemplateId {
    /// The payload shape this template must produce.
    pub fn payload_kind(self) -> PayloadKind {
        use TemplateId::*;
        match self {
            StoryGeneration | StoryRevision => PayloadKind::Stories,
            StoryReview | DesignReview | CodeReview | SecurityReview | TestReview
            | QaEvaluation => PayloadKind::Verdict,
            DesignGeneration | DesignRevision => PayloadKind::Design,
            CodeGeneration | CodeFix | SecurityFix | QaFix => PayloadKind::Code,
            TestGeneration | TestFix => PayloadKind::Cases,
        }
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TemplateId::StoryGeneration => "story_generation",
            TemplateId::StoryRevision => "story_revision",
            TemplateId::StoryReview => "story_review",
            TemplateId::DesignGeneration => "design_generation",
            TemplateId::DesignRevision => "design_revision",
            TemplateId::DesignReview => "design_review",
            TemplateId::CodeGeneration => "code_generation",
            TemplateId::CodeReview => "code_review",
            TemplateId::CodeFix => "code_fix",
            TemplateId::SecurityReview => "security_review",
            TemplateId::SecurityFix => "security_fix",
            TemplateId::TestGeneration => "test_generation",
            TemplateId::TestReview => "test_review",
            TemplateId::TestFix => "test_fix",
            TemplateId::QaEvaluation => "qa_evaluation",
            TemplateId::QaFix => "qa_fix",
        };
        write!(f, "{}", name)
    }
}

/// The shape of a structured content result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Stories,
    Verdict,
    Design,
    Code,
    Cases,
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PayloadKind::Stories => "stories",
            PayloadKind::Verdict => "verdict",
            PayloadKind::Design => "design",
            PayloadKind::Code => "code",
            PayloadKind::Cases => "cases",
        };
        write!(f, "{}", name)
    }
}

/// One request to the content service.
///
/// Variables are ordered (`BTreeMap`) so identical inputs render to
/// identical prompts — replaying a run with a scripted service must be
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    pub template: TemplateId,
    pub variables: BTreeMap<String, String>,
}

impl ContentRequest {
    pub fn new(template: TemplateId) -> Self {
        Self {
            template,
            variables: BTreeMap::new(),
        }
    }

    pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }
}

/// A structured result from the content service, one variant per role.
///
/// The accessor methods enforce the collaborator-boundary schema: a
/// payload of the wrong shape is a `SchemaMismatch` fault, never
/// silently propagated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentPayload {
    Stories { stories: Vec<String> },
    Verdict { review: String, status: ReviewStatus },
    Design { document: DesignDocument },
    Code { generated_code: String },
    Cases { cases: Vec<String> },
}

impl ContentPayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            ContentPayload::Stories { .. } => PayloadKind::Stories,
            ContentPayload::Verdict { .. } => PayloadKind::Verdict,
            ContentPayload::Design { .. } => PayloadKind::Design,
            ContentPayload::Code { .. } => PayloadKind::Code,
            ContentPayload::Cases { .. } => PayloadKind::Cases,
        }
    }

    pub fn into_stories(self, template: TemplateId) -> Result<Vec<String>> {
        match self {
            ContentPayload::Stories { stories } => Ok(stories),
            other => Err(mismatch(template, PayloadKind::Stories, other)),
        }
    }

    pub fn into_verdict(self, template: TemplateId) -> Result<(ReviewStatus, String)> {
        match self {
            ContentPayload::Verdict { review, status } => Ok((status, review)),
            other => Err(mismatch(template, PayloadKind::Verdict, other)),
        }
    }

    pub fn into_design(self, template: TemplateId) -> Result<DesignDocument> {
        match self {
            ContentPayload::Design { document } => Ok(document),
            other => Err(mismatch(template, PayloadKind::Design, other)),
        }
    }

    pub fn into_code(self, template: TemplateId) -> Result<String> {
        match self {
            ContentPayload::Code { generated_code } => Ok(generated_code),
            other => Err(mismatch(template, PayloadKind::Code, other)),
        }
    }

    pub fn into_cases(self, template: TemplateId) -> Result<Vec<String>> {
        match self {
            ContentPayload::Cases { cases } => Ok(cases),
            other => Err(mismatch(template, PayloadKind::Cases, other)),
        }
    }
}

fn mismatch(template: TemplateId, expected: PayloadKind, got: ContentPayload) -> DevflowError {
    DevflowError::SchemaMismatch {
        template: format!("{} (got {})", template, got.kind()),
        expected: expected.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_payload_kinds() {
        assert_eq!(
            TemplateId::StoryGeneration.payload_kind(),
            PayloadKind::Stories
        );
        assert_eq!(TemplateId::QaEvaluation.payload_kind(), PayloadKind::Verdict);
        assert_eq!(TemplateId::QaFix.payload_kind(), PayloadKind::Code);
        assert_eq!(TemplateId::TestFix.payload_kind(), PayloadKind::Cases);
        assert_eq!(
            TemplateId::DesignRevision.payload_kind(),
            PayloadKind::Design
        );
    }

    #[test]
    fn test_request_variables_are_ordered() {
        let a = ContentRequest::new(TemplateId::CodeFix)
            .var("feedback", "f")
            .var("code", "c");
        let b = ContentRequest::new(TemplateId::CodeFix)
            .var("code", "c")
            .var("feedback", "f");
        assert_eq!(a, b);
    }

    #[test]
    fn test_accessor_rejects_wrong_shape() {
        let payload = ContentPayload::Code {
            generated_code: "fn main() {}".into(),
        };
        let err = payload.into_stories(TemplateId::StoryGeneration).unwrap_err();
        assert!(matches!(err, DevflowError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_accessor_accepts_right_shape() {
        let payload = ContentPayload::Verdict {
            review: "looks good".into(),
            status: ReviewStatus::Approved,
        };
        let (status, review) = payload.into_verdict(TemplateId::CodeReview).unwrap();
        assert_eq!(status, ReviewStatus::Approved);
        assert_eq!(review, "looks good");
    }
}
