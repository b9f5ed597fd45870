//! The immutable outcome of a workflow run.

use serde::{Deserialize, Serialize};

use crate::{
    Attempt, ContentDraft, OptimizationStrategy, ResearchInsight, ReviewVerdict, Timestamp,
    WorkflowContext, WorkflowError, WorkflowRequest, WorkflowRunId,
};

/// Overall status of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// The reviewer approved a draft.
    Approved,
    /// Every allowed draft was rejected.
    ExhaustedRetries,
    /// A stage failed or the run was cancelled.
    Failed,
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkflowStatus::Approved => "approved",
            WorkflowStatus::ExhaustedRetries => "exhausted retries",
            WorkflowStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// How a run ended; the input to [`WorkflowResult::from_context`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Approved,
    ExhaustedRetries,
    Failed(WorkflowError),
}

/// Final snapshot of a run.
///
/// Created exactly once, when the orchestrator reaches a terminal state. All
/// fields are private; the value cannot be changed after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    run_id: WorkflowRunId,
    status: WorkflowStatus,
    failure: Option<WorkflowError>,
    request: WorkflowRequest,
    research: Option<ResearchInsight>,
    history: Vec<Attempt>,
    retries_used: u32,
    started_at: Timestamp,
    completed_at: Timestamp,
}

impl WorkflowResult {
    /// Consumes the context and freezes it into a result.
    pub fn from_context(
        run_id: WorkflowRunId,
        started_at: Timestamp,
        context: WorkflowContext,
        completion: Completion,
    ) -> Self {
        let (request, research, history, retries_used) = context.into_parts();
        let (status, failure) = match completion {
            Completion::Approved => (WorkflowStatus::Approved, None),
            Completion::ExhaustedRetries => (WorkflowStatus::ExhaustedRetries, None),
            Completion::Failed(err) => (WorkflowStatus::Failed, Some(err)),
        };

        Self {
            run_id,
            status,
            failure,
            request,
            research,
            history,
            retries_used,
            started_at,
            completed_at: Timestamp::now(),
        }
    }

    pub fn run_id(&self) -> WorkflowRunId {
        self.run_id
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    /// Why the run failed; `Some` exactly when the status is
    /// [`WorkflowStatus::Failed`].
    pub fn failure(&self) -> Option<&WorkflowError> {
        self.failure.as_ref()
    }

    pub fn request(&self) -> &WorkflowRequest {
        &self.request
    }

    pub fn research(&self) -> Option<&ResearchInsight> {
        self.research.as_ref()
    }

    /// Every attempt, oldest first.
    pub fn history(&self) -> &[Attempt] {
        &self.history
    }

    /// Regenerations performed after the first draft.
    pub fn retries_used(&self) -> u32 {
        self.retries_used
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn completed_at(&self) -> Timestamp {
        self.completed_at
    }

    /// Wall-clock duration of the run in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.completed_at.millis_since(self.started_at)
    }

    /// The approved draft, or the last one attempted.
    pub fn final_draft(&self) -> Option<&ContentDraft> {
        self.history.last().map(|a| &a.draft)
    }

    /// Strategy computed for the final draft, if optimisation ran.
    pub fn final_strategy(&self) -> Option<&OptimizationStrategy> {
        self.history.last().and_then(|a| a.strategy.as_ref())
    }

    /// Verdict on the final draft, if review ran.
    pub fn final_verdict(&self) -> Option<&ReviewVerdict> {
        self.history.last().and_then(|a| a.verdict.as_ref())
    }

    /// Renders the result as pretty-printed JSON for export.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialisation fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
