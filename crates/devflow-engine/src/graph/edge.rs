use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use devflow_core::state::{PipelineState, ReviewStatus};

use super::node::NodeId;

/// A branch label returned by a decision. Finite so a typo cannot
/// silently create an unreachable branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BranchLabel {
    Approved,
    Feedback,
    Passed,
    Failed,
}

impl std::fmt::Display for BranchLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BranchLabel::Approved => "Approved",
            BranchLabel::Feedback => "Feedback",
            BranchLabel::Passed => "Passed",
            BranchLabel::Failed => "Failed",
        };
        write!(f, "{}", name)
    }
}

/// A two-way decision keyed off the review verdict.
///
/// Both decision families in the pipeline (approve/revise and the QA
/// pass/fail variant) are the same branch under different label
/// names, so one table-driven type covers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub on_approved: BranchLabel,
    pub on_rejected: BranchLabel,
}

impl Decision {
    /// Approved → `Approved`, anything else → `Feedback`.
    pub const APPROVE_OR_FEEDBACK: Decision = Decision {
        on_approved: BranchLabel::Approved,
        on_rejected: BranchLabel::Feedback,
    };

    /// Approved → `Passed`, anything else → `Failed` (QA gate).
    pub const PASS_OR_FAIL: Decision = Decision {
        on_approved: BranchLabel::Passed,
        on_rejected: BranchLabel::Failed,
    };

    /// Pure function of the verdict field.
    pub fn decide(&self, state: &PipelineState) -> BranchLabel {
        if state.status == ReviewStatus::Approved {
            self.on_approved
        } else {
            self.on_rejected
        }
    }

    /// Every label this decision can return.
    pub fn labels(&self) -> [BranchLabel; 2] {
        [self.on_approved, self.on_rejected]
    }
}

/// Where an edge leads: another node, or the end of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Node(NodeId),
    End,
}

/// The single outgoing edge of a node. A node has either one
/// unconditional edge or one conditional edge set, never both.
#[derive(Debug, Clone)]
pub enum EdgeKind {
    Unconditional(Target),
    Conditional {
        decision: Decision,
        branches: HashMap<BranchLabel, Target>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide_approved() {
        let mut state = PipelineState::new("req");
        state.status = ReviewStatus::Approved;
        assert_eq!(
            Decision::APPROVE_OR_FEEDBACK.decide(&state),
            BranchLabel::Approved
        );
        assert_eq!(Decision::PASS_OR_FAIL.decide(&state), BranchLabel::Passed);
    }

    #[test]
    fn test_decide_rejected() {
        let mut state = PipelineState::new("req");
        state.status = ReviewStatus::NotApproved;
        assert_eq!(
            Decision::APPROVE_OR_FEEDBACK.decide(&state),
            BranchLabel::Feedback
        );
        assert_eq!(Decision::PASS_OR_FAIL.decide(&state), BranchLabel::Failed);
    }

    #[test]
    fn test_unset_counts_as_rejected() {
        let state = PipelineState::new("req");
        assert_eq!(
            Decision::APPROVE_OR_FEEDBACK.decide(&state),
            BranchLabel::Feedback
        );
    }
}
