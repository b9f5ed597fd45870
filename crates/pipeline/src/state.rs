//! Workflow states and the review transition rule.
//!
//! ```text
//! Researching → Drafting → Optimizing → Reviewing ─┬─ approved ──────────────→ Approved
//!                  ↑                               ├─ rejected, budget left ─→ Regenerating ─┐
//!                  └───────────────────────────────┼─────────────────────────────────────────┘
//!                                                  └─ rejected, no budget ───→ RetriesExhausted
//! any non-terminal state ── stage error / cancellation ──→ Failed
//! ```
//!
//! The rule deciding what follows a review lives here, free of I/O, so that
//! it can be tested in isolation from the orchestrator that applies it.

use serde::{Deserialize, Serialize};

use crate::{ReviewVerdict, StageKind};

/// Position of a run in the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Researching,
    Drafting,
    Optimizing,
    Reviewing,
    /// Review rejected the draft and retry budget remains; drafting restarts.
    Regenerating,
    Approved,
    RetriesExhausted,
    Failed,
}

impl WorkflowState {
    /// Returns `true` for states that end a run.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkflowState::Approved | WorkflowState::RetriesExhausted | WorkflowState::Failed
        )
    }

    /// The stage invoked while in this state, if any.
    pub fn stage(self) -> Option<StageKind> {
        match self {
            WorkflowState::Researching => Some(StageKind::Researcher),
            WorkflowState::Drafting => Some(StageKind::Copywriter),
            WorkflowState::Optimizing => Some(StageKind::Manager),
            WorkflowState::Reviewing => Some(StageKind::Reviewer),
            WorkflowState::Regenerating
            | WorkflowState::Approved
            | WorkflowState::RetriesExhausted
            | WorkflowState::Failed => None,
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkflowState::Researching => "researching",
            WorkflowState::Drafting => "drafting",
            WorkflowState::Optimizing => "optimizing",
            WorkflowState::Reviewing => "reviewing",
            WorkflowState::Regenerating => "regenerating",
            WorkflowState::Approved => "approved",
            WorkflowState::RetriesExhausted => "retries exhausted",
            WorkflowState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What follows a successful review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The draft is approved; the run ends.
    Approve,
    /// Rejected with budget left; draft again.
    Regenerate,
    /// Rejected with the budget spent; the run ends.
    Exhaust,
}

impl ReviewOutcome {
    /// The state entered after this outcome.
    pub fn next_state(self) -> WorkflowState {
        match self {
            ReviewOutcome::Approve => WorkflowState::Approved,
            ReviewOutcome::Regenerate => WorkflowState::Regenerating,
            ReviewOutcome::Exhaust => WorkflowState::RetriesExhausted,
        }
    }
}

/// Decides the transition after `verdict`, given how many regenerations have
/// already happened.
pub fn decide_after_review(
    verdict: &ReviewVerdict,
    retry_count: u32,
    max_retries: u32,
) -> ReviewOutcome {
    if verdict.approved {
        ReviewOutcome::Approve
    } else if retry_count < max_retries {
        ReviewOutcome::Regenerate
    } else {
        ReviewOutcome::Exhaust
    }
}

/// A state change, as published to progress listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: WorkflowState,
    pub to: WorkflowState,
    /// Current attempt number (0 before the first draft).
    pub attempt: u32,
    pub retry_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_wins_regardless_of_budget() {
        let verdict = ReviewVerdict::approve("great");
        assert_eq!(decide_after_review(&verdict, 0, 2), ReviewOutcome::Approve);
        assert_eq!(decide_after_review(&verdict, 2, 2), ReviewOutcome::Approve);
    }

    #[test]
    fn rejection_regenerates_until_the_budget_is_spent() {
        let verdict = ReviewVerdict::reject(["too long"]);
        assert_eq!(decide_after_review(&verdict, 0, 2), ReviewOutcome::Regenerate);
        assert_eq!(decide_after_review(&verdict, 1, 2), ReviewOutcome::Regenerate);
        assert_eq!(decide_after_review(&verdict, 2, 2), ReviewOutcome::Exhaust);
    }

    #[test]
    fn zero_budget_exhausts_on_first_rejection() {
        let verdict = ReviewVerdict::reject(["off brand"]);
        assert_eq!(decide_after_review(&verdict, 0, 0), ReviewOutcome::Exhaust);
    }

    #[test]
    fn terminal_states_have_no_stage() {
        for state in [
            WorkflowState::Approved,
            WorkflowState::RetriesExhausted,
            WorkflowState::Failed,
        ] {
            assert!(state.is_terminal());
            assert_eq!(state.stage(), None);
        }
        assert_eq!(WorkflowState::Optimizing.stage(), Some(StageKind::Manager));
        assert!(!WorkflowState::Regenerating.is_terminal());
    }
}
