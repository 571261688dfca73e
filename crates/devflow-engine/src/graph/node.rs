use serde::{Deserialize, Serialize};

/// Every working node in the pipeline graph.
///
/// A closed enum rather than string identifiers: the edge table is
/// checked exhaustively at build time, so an "unknown node" can never
/// surface during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    GenerateUserStories,
    ProductOwnerReview,
    ReviseUserStories,
    CreateDesignDocument,
    DesignReview,
    ReviseDesignDocument,
    GenerateCode,
    CodeReview,
    FixCodeAfterCodeReview,
    SecurityReview,
    FixCodeAfterSecurityReview,
    WriteTestCases,
    TestCasesReview,
    FixTestCases,
    QaTesting,
    FixCodeAfterQa,
}

impl NodeId {
    pub const ALL: [NodeId; 16] = [
        NodeId::GenerateUserStories,
        NodeId::ProductOwnerReview,
        NodeId::ReviseUserStories,
        NodeId::CreateDesignDocument,
        NodeId::DesignReview,
        NodeId::ReviseDesignDocument,
        NodeId::GenerateCode,
        NodeId::CodeReview,
        NodeId::FixCodeAfterCodeReview,
        NodeId::SecurityReview,
        NodeId::FixCodeAfterSecurityReview,
        NodeId::WriteTestCases,
        NodeId::TestCasesReview,
        NodeId::FixTestCases,
        NodeId::QaTesting,
        NodeId::FixCodeAfterQa,
    ];

    /// Human-readable name, as shown in the trace.
    pub fn name(self) -> &'static str {
        match self {
            NodeId::GenerateUserStories => "Generate User Stories",
            NodeId::ProductOwnerReview => "Product Owner Review",
            NodeId::ReviseUserStories => "Revise User Stories",
            NodeId::CreateDesignDocument => "Create Design Document",
            NodeId::DesignReview => "Design Review",
            NodeId::ReviseDesignDocument => "Revise Design Document",
            NodeId::GenerateCode => "Generate Code",
            NodeId::CodeReview => "Code Review",
            NodeId::FixCodeAfterCodeReview => "Fix Code after Code Review",
            NodeId::SecurityReview => "Security Review",
            NodeId::FixCodeAfterSecurityReview => "Fix Code after Security Review",
            NodeId::WriteTestCases => "Write Test Cases",
            NodeId::TestCasesReview => "Test Cases Review",
            NodeId::FixTestCases => "Fix Test Cases after Review",
            NodeId::QaTesting => "QA Testing",
            NodeId::FixCodeAfterQa => "Fix Code after QA Feedback",
        }
    }

    /// Whether this node only runs when a review rejected an artifact.
    pub fn is_revision(self) -> bool {
        matches!(
            self,
            NodeId::ReviseUserStories
                | NodeId::ReviseDesignDocument
                | NodeId::FixCodeAfterCodeReview
                | NodeId::FixCodeAfterSecurityReview
                | NodeId::FixTestCases
                | NodeId::FixCodeAfterQa
        )
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
