//! The accumulating state of one workflow run.
//!
//! A [`WorkflowContext`] is created by the orchestrator at the start of a run
//! and mutated only by it. Stages never see the context itself; they receive
//! owned projections built by the `for_*` accessors.
//!
//! ## Invariants
//!
//! - `retry_count <= max_retries`.
//! - Once the first draft is recorded, `attempts.len() == retry_count + 1`.
//!   A retry is counted when its draft is recorded, so a run that stops
//!   between granting a regeneration and receiving the new draft still
//!   satisfies this.
//! - Attempts are only ever appended; earlier drafts are kept for traceability.

use serde::{Deserialize, Serialize};

use crate::{
    ContentDraft, DraftingInput, OptimizationInput, OptimizationStrategy, ResearchInput,
    ResearchInsight, ReviewInput, ReviewVerdict, RevisionGuidance, Timestamp, WorkflowRequest,
};

/// One drafting attempt and what later stages made of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-based attempt number.
    pub number: u32,
    pub draft: ContentDraft,
    /// Set once the manager has run for this draft.
    pub strategy: Option<OptimizationStrategy>,
    /// Set once the reviewer has run for this draft.
    pub verdict: Option<ReviewVerdict>,
    pub drafted_at: Timestamp,
}

/// Mutable accumulator for a single run.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    request: WorkflowRequest,
    research: Option<ResearchInsight>,
    attempts: Vec<Attempt>,
    retry_count: u32,
    max_retries: u32,
    regeneration_granted: bool,
}

impl WorkflowContext {
    /// Starts an empty context for `request`.
    pub fn new(request: WorkflowRequest, max_retries: u32) -> Self {
        Self {
            request,
            research: None,
            attempts: Vec::new(),
            retry_count: 0,
            max_retries,
            regeneration_granted: false,
        }
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn request(&self) -> &WorkflowRequest {
        &self.request
    }

    pub fn research(&self) -> Option<&ResearchInsight> {
        self.research.as_ref()
    }

    /// Every attempt so far, oldest first.
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// The most recent attempt.
    pub fn current_attempt(&self) -> Option<&Attempt> {
        self.attempts.last()
    }

    /// Number of regenerations so far.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    // -----------------------------------------------------------------------
    // Stage projections
    // -----------------------------------------------------------------------

    /// Input for the researcher.
    pub fn for_researcher(&self) -> ResearchInput {
        let r = &self.request;
        ResearchInput {
            topic: r.topic().clone(),
            platform: r.platform(),
            audience: r.audience().to_string(),
            industry: r.industry_or_default().to_string(),
        }
    }

    /// Input for the copywriter. `None` until research has been recorded.
    ///
    /// When the latest attempt has been reviewed, its copy and feedback are
    /// included as [`RevisionGuidance`].
    pub fn for_copywriter(&self) -> Option<DraftingInput> {
        let research = self.research.clone()?;
        let r = &self.request;
        let revision = self.current_attempt().and_then(|attempt| {
            attempt.verdict.as_ref().map(|verdict| RevisionGuidance {
                previous_attempt: attempt.number,
                previous_copy: attempt.draft.copy.clone(),
                feedback: verdict.feedback.clone(),
            })
        });

        Some(DraftingInput {
            topic: r.topic().clone(),
            platform: r.platform(),
            audience: r.audience().to_string(),
            content_type: r.content_type().to_string(),
            tone: r.tone().to_string(),
            call_to_action: r.call_to_action().to_string(),
            research,
            personal_style: r.personal_style().map(str::to_string),
            revision,
        })
    }

    /// Input for the manager. `None` until a draft exists.
    pub fn for_manager(&self) -> Option<OptimizationInput> {
        let attempt = self.current_attempt()?;
        let r = &self.request;
        Some(OptimizationInput {
            topic: r.topic().clone(),
            platform: r.platform(),
            audience: r.audience().to_string(),
            goals: r.goals().to_string(),
            budget: r.budget().to_string(),
            brand_guidelines: r.brand_guidelines().to_string(),
            draft: attempt.draft.clone(),
        })
    }

    /// Input for the reviewer. `None` until the current draft has a strategy.
    pub fn for_reviewer(&self) -> Option<ReviewInput> {
        let attempt = self.current_attempt()?;
        let strategy = attempt.strategy.clone()?;
        let r = &self.request;
        Some(ReviewInput {
            topic: r.topic().clone(),
            platform: r.platform(),
            audience: r.audience().to_string(),
            brand_guidelines: r.brand_guidelines().to_string(),
            compliance: r.compliance().to_string(),
            draft: attempt.draft.clone(),
            strategy: Some(strategy),
        })
    }

    // -----------------------------------------------------------------------
    // Mutation (orchestrator only)
    // -----------------------------------------------------------------------

    /// Stores the research insight.
    pub fn record_research(&mut self, insight: ResearchInsight) {
        self.research = Some(insight);
    }

    /// Appends a new attempt holding `draft` and returns its number.
    ///
    /// Must be called once at the start and once after every successful
    /// [`Self::begin_regeneration`]. Every draft after the first counts as
    /// one retry.
    pub fn push_draft(&mut self, draft: ContentDraft) -> u32 {
        if !self.attempts.is_empty() {
            debug_assert!(
                self.regeneration_granted,
                "a draft was already recorded for this retry"
            );
            self.retry_count += 1;
            self.regeneration_granted = false;
            tracing::debug!(
                retry_count = self.retry_count,
                max_retries = self.max_retries,
                "retry budget consumed"
            );
        }
        let number = self.attempts.len() as u32 + 1;
        self.attempts.push(Attempt {
            number,
            draft,
            strategy: None,
            verdict: None,
            drafted_at: Timestamp::now(),
        });
        number
    }

    /// Attaches `strategy` to the current attempt.
    ///
    /// Returns `false` (and changes nothing) if there is no attempt yet.
    pub fn attach_strategy(&mut self, strategy: OptimizationStrategy) -> bool {
        match self.attempts.last_mut() {
            Some(attempt) => {
                attempt.strategy = Some(strategy);
                true
            }
            None => false,
        }
    }

    /// Attaches `verdict` to the current attempt.
    ///
    /// Returns `false` (and changes nothing) if there is no attempt yet.
    pub fn attach_verdict(&mut self, verdict: ReviewVerdict) -> bool {
        match self.attempts.last_mut() {
            Some(attempt) => {
                attempt.verdict = Some(verdict);
                true
            }
            None => false,
        }
    }

    /// Grants one regeneration if budget remains. The retry is counted when
    /// the regenerated draft is recorded by [`Self::push_draft`].
    ///
    /// Returns `false` without changing anything if the budget is already spent.
    pub fn begin_regeneration(&mut self) -> bool {
        if self.retry_count >= self.max_retries {
            return false;
        }
        self.regeneration_granted = true;
        true
    }

    /// Breaks the context into its parts for result assembly.
    pub fn into_parts(self) -> (WorkflowRequest, Option<ResearchInsight>, Vec<Attempt>, u32) {
        (self.request, self.research, self.attempts, self.retry_count)
    }
}
