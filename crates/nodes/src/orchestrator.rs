//! The workflow state machine.
//!
//! [`Orchestrator::run`] drives one request through
//! Researching → Drafting → Optimizing → Reviewing, looping back through
//! Regenerating while the reviewer withholds approval and retry budget
//! remains. Each run owns its own [`WorkflowContext`]; an orchestrator can
//! serve any number of concurrent runs.
//!
//! The cancellation token is checked before entering every non-terminal
//! state. A model call already in flight is allowed to finish; its record is
//! kept in the history and the run then ends as cancelled.
//!
//! [`Orchestrator::review_post`] runs the reviewer alone on copy written
//! outside a workflow.

use std::sync::Arc;

use pipeline::{
    decide_after_review, Completion, ConfigError, DraftingStage, ModelClient, OptimizationStage,
    ResearchStage, ReviewInput, ReviewStage, ReviewVerdict, StageError, StageKind, StateTransition, Timestamp,
    WorkflowConfig, WorkflowContext, WorkflowError, WorkflowRequest, WorkflowResult,
    WorkflowRunId, WorkflowState,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

use crate::stages::{Copywriter, Manager, ModelCall, Researcher, Reviewer};

// ---------------------------------------------------------------------------
// StageSet
// ---------------------------------------------------------------------------

/// The four stages a run invokes.
#[derive(Clone)]
pub struct StageSet {
    pub researcher: Arc<ResearchStage>,
    pub copywriter: Arc<DraftingStage>,
    pub manager: Arc<OptimizationStage>,
    pub reviewer: Arc<ReviewStage>,
}

impl StageSet {
    /// Model-backed stages sharing `client`, configured from `config`.
    pub fn model_backed(client: Arc<dyn ModelClient>, config: &WorkflowConfig) -> Self {
        let call = |stage| ModelCall::for_stage(Arc::clone(&client), config, stage);
        Self {
            researcher: Arc::new(Researcher::new(call(StageKind::Researcher))),
            copywriter: Arc::new(Copywriter::new(call(StageKind::Copywriter))),
            manager: Arc::new(Manager::new(call(StageKind::Manager))),
            reviewer: Arc::new(Reviewer::new(call(StageKind::Reviewer))),
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Sequences the stages for each request and produces its [`WorkflowResult`].
pub struct Orchestrator {
    stages: StageSet,
    config: WorkflowConfig,
    progress: Option<UnboundedSender<StateTransition>>,
}

impl Orchestrator {
    /// Creates an orchestrator over `stages`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` fails validation.
    pub fn new(stages: StageSet, config: WorkflowConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            stages,
            config,
            progress: None,
        })
    }

    /// Creates an orchestrator whose stages all call `client`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` fails validation.
    pub fn from_model_client(
        client: Arc<dyn ModelClient>,
        config: WorkflowConfig,
    ) -> Result<Self, ConfigError> {
        let stages = StageSet::model_backed(client, &config);
        Self::new(stages, config)
    }

    /// Publishes every state change to `sender`. Send failures are ignored.
    #[must_use]
    pub fn with_progress(mut self, sender: UnboundedSender<StateTransition>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// The validated configuration this orchestrator runs with.
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Runs `request` to a terminal state.
    ///
    /// Never returns an error: stage failures and cancellation are reported
    /// through [`WorkflowResult::status`] and [`WorkflowResult::failure`].
    pub async fn run(&self, request: WorkflowRequest, cancel: &CancellationToken) -> WorkflowResult {
        let run_id = WorkflowRunId::new_random();
        let span = tracing::info_span!(
            "workflow",
            run_id = %run_id,
            topic = %request.topic(),
            platform = %request.platform()
        );

        async move {
            let started_at = Timestamp::now();
            let mut ctx = WorkflowContext::new(request, self.config.max_retries());
            info!(max_retries = ctx.max_retries(), "workflow started");

            let completion = self.drive(&mut ctx, cancel).await;
            let result = WorkflowResult::from_context(run_id, started_at, ctx, completion);

            match result.failure() {
                None => info!(
                    status = %result.status(),
                    attempts = result.history().len(),
                    retries_used = result.retries_used(),
                    elapsed_ms = result.elapsed_ms(),
                    "workflow finished"
                ),
                Some(err) => warn!(
                    error = %err,
                    attempts = result.history().len(),
                    elapsed_ms = result.elapsed_ms(),
                    "workflow failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn drive(&self, ctx: &mut WorkflowContext, cancel: &CancellationToken) -> Completion {
        let mut state = WorkflowState::Researching;
        loop {
            if cancel.is_cancelled() {
                info!(before = %state, "cancellation observed");
                self.publish(ctx, state, WorkflowState::Failed);
                return Completion::Failed(WorkflowError::Cancelled { before: state });
            }

            let next = match self.step(state, ctx).await {
                Ok(next) => next,
                Err(err) => {
                    self.publish(ctx, state, WorkflowState::Failed);
                    return Completion::Failed(WorkflowError::from_stage(err));
                }
            };
            self.publish(ctx, state, next);

            match next {
                WorkflowState::Approved => return Completion::Approved,
                WorkflowState::RetriesExhausted => return Completion::ExhaustedRetries,
                other => state = other,
            }
        }
    }

    /// Reviews `copy` that was not produced by [`Self::run`], using only the
    /// reviewer stage. `request` supplies the platform, audience, brand and
    /// compliance context.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::Cancelled`] if `cancel` fired before the review began.
    /// - [`WorkflowError::ReviewFailed`] if the reviewer stage fails.
    pub async fn review_post(
        &self,
        request: &WorkflowRequest,
        copy: &str,
        cancel: &CancellationToken,
    ) -> Result<ReviewVerdict, WorkflowError> {
        let span = tracing::info_span!(
            "review",
            topic = %request.topic(),
            platform = %request.platform()
        );

        async move {
            if cancel.is_cancelled() {
                return Err(WorkflowError::Cancelled {
                    before: WorkflowState::Reviewing,
                });
            }
            let input = ReviewInput::for_existing_post(request, copy);
            let verdict = self
                .stages
                .reviewer
                .execute(input)
                .await
                .map_err(WorkflowError::from_stage)?;
            info!(
                decision = %verdict.decision,
                feedback_items = verdict.feedback.len(),
                "existing post reviewed"
            );
            Ok(verdict)
        }
        .instrument(span)
        .await
    }

    /// Performs the work of `state` and returns the state that follows.
    async fn step(
        &self,
        state: WorkflowState,
        ctx: &mut WorkflowContext,
    ) -> Result<WorkflowState, StageError> {
        match state {
            WorkflowState::Researching => {
                let insight = self.stages.researcher.execute(ctx.for_researcher()).await?;
                ctx.record_research(insight);
                Ok(WorkflowState::Drafting)
            }
            WorkflowState::Drafting => {
                let input = ctx
                    .for_copywriter()
                    .ok_or_else(|| StageError::missing_input(StageKind::Copywriter, "research insight"))?;
                let draft = self.stages.copywriter.execute(input).await?;
                let attempt = ctx.push_draft(draft);
                info!(attempt, "draft recorded");
                Ok(WorkflowState::Optimizing)
            }
            WorkflowState::Optimizing => {
                let input = ctx
                    .for_manager()
                    .ok_or_else(|| StageError::missing_input(StageKind::Manager, "draft"))?;
                let strategy = self.stages.manager.execute(input).await?;
                if !ctx.attach_strategy(strategy) {
                    return Err(StageError::missing_input(StageKind::Manager, "draft"));
                }
                Ok(WorkflowState::Reviewing)
            }
            WorkflowState::Reviewing => {
                let input = ctx.for_reviewer().ok_or_else(|| {
                    StageError::missing_input(StageKind::Reviewer, "optimization strategy")
                })?;
                let verdict = self.stages.reviewer.execute(input).await?;
                let outcome = decide_after_review(&verdict, ctx.retry_count(), ctx.max_retries());
                info!(
                    decision = %verdict.decision,
                    approved = verdict.approved,
                    retry_count = ctx.retry_count(),
                    "review recorded"
                );
                if !ctx.attach_verdict(verdict) {
                    return Err(StageError::missing_input(StageKind::Reviewer, "draft"));
                }
                Ok(outcome.next_state())
            }
            WorkflowState::Regenerating => {
                if ctx.begin_regeneration() {
                    Ok(WorkflowState::Drafting)
                } else {
                    Ok(WorkflowState::RetriesExhausted)
                }
            }
            terminal @ (WorkflowState::Approved
            | WorkflowState::RetriesExhausted
            | WorkflowState::Failed) => Ok(terminal),
        }
    }

    fn publish(&self, ctx: &WorkflowContext, from: WorkflowState, to: WorkflowState) {
        tracing::debug!(from = %from, to = %to, "state transition");
        if let Some(sender) = &self.progress {
            let _ = sender.send(StateTransition {
                from,
                to,
                attempt: ctx.current_attempt().map_or(0, |a| a.number),
                retry_count: ctx.retry_count(),
            });
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}
