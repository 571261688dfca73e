use serde::{Deserialize, Serialize};

/// Verdict set by every review stage and consumed by the next decision.
///
/// The wire form of `NotApproved` is `"Not Approved"` (with a space) —
/// that is the vocabulary review prompts are written against. `Unset`
/// never appears on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewStatus {
    Approved,
    #[serde(rename = "Not Approved")]
    NotApproved,
    /// No review has run yet (or the last verdict was consumed).
    /// Never produced by the content service.
    #[default]
    Unset,
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewStatus::Approved => write!(f, "Approved"),
            ReviewStatus::NotApproved => write!(f, "Not Approved"),
            ReviewStatus::Unset => write!(f, "Unset"),
        }
    }
}

/// Functional + technical design sections, both present once created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
    pub functional: Vec<String>,
    pub technical: Vec<String>,
}

impl DesignDocument {
    /// Render the document as prompt-ready text.
    pub fn render(&self) -> String {
        let mut out = String::from("Functional Design Document:\n");
        for item in &self.functional {
            out.push_str("- ");
            out.push_str(item);
            out.push('\n');
        }
        out.push_str("\nTechnical Design Document:\n");
        for item in &self.technical {
            out.push_str("- ");
            out.push_str(item);
            out.push('\n');
        }
        out
    }
}

/// The mutable record threaded through every stage of a run.
///
/// Single-writer aggregate: the executor owns it for the lifetime of a
/// run and never hands it to two stages at once. `Clone` exists so the
/// executor can snapshot verdict fields into the trace without
/// disturbing the live state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineState {
    pub requirements: String,
    #[serde(default)]
    pub user_stories: Vec<String>,
    #[serde(default)]
    pub design_document: Option<DesignDocument>,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub test_cases: Vec<String>,
    #[serde(default)]
    pub status: ReviewStatus,
    #[serde(default)]
    pub feedback: String,
}

impl PipelineState {
    /// Partial initialization: only requirements populated.
    pub fn new(requirements: impl Into<String>) -> Self {
        Self {
            requirements: requirements.into(),
            ..Self::default()
        }
    }

    /// The stories joined one-per-line, as review/design prompts expect.
    pub fn stories_text(&self) -> String {
        self.user_stories.join("\n")
    }

    /// The test cases joined one-per-line.
    pub fn test_cases_text(&self) -> String {
        self.test_cases.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_init() {
        let state = PipelineState::new("Build a to-do list app");
        assert_eq!(state.requirements, "Build a to-do list app");
        assert!(state.user_stories.is_empty());
        assert!(state.design_document.is_none());
        assert_eq!(state.status, ReviewStatus::Unset);
        assert!(state.feedback.is_empty());
    }

    #[test]
    fn test_status_wire_form() {
        let json = serde_json::to_string(&ReviewStatus::NotApproved).unwrap();
        assert_eq!(json, r#""Not Approved""#);
        let parsed: ReviewStatus = serde_json::from_str(r#""Approved""#).unwrap();
        assert_eq!(parsed, ReviewStatus::Approved);
    }

    #[test]
    fn test_snapshot_does_not_alias() {
        let mut state = PipelineState::new("req");
        let snapshot = state.clone();
        state.feedback = "needs work".into();
        assert!(snapshot.feedback.is_empty());
    }

    #[test]
    fn test_design_render_has_both_sections() {
        let doc = DesignDocument {
            functional: vec!["login flow".into()],
            technical: vec!["REST API".into()],
        };
        let text = doc.render();
        assert!(text.contains("Functional Design Document:"));
        assert!(text.contains("- login flow"));
        assert!(text.contains("Technical Design Document:"));
        assert!(text.contains("- REST API"));
    }
}
