//! Error and retry-policy types for the Social Agent workflow domain.
//!
//! The taxonomy is layered:
//!
//! - [`ModelError`] - the model client could not produce text (auth, rate
//!   limit, timeout, transport). Carries a [`RetryPolicy`] so the client can
//!   apply its own transient back-off.
//! - [`StageError`] - a stage could not produce its structured record.
//! - [`WorkflowError`] - the run ended in `Failed`; names the phase that broke
//!   (or cancellation) and wraps the stage error.
//!
//! Review rejection is **not** an error. A successful review that disapproves
//! content is a normal state transition (see [`crate::state`]).
//!
//! [`RequestError`] and [`ConfigError`] are raised before a run starts.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{StageKind, WorkflowState};

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// Returned by [`ModelError`] to let the model client decide whether to
/// re-issue a request. The orchestrator never retries on errors; its only
/// loop is review-driven regeneration.
///
/// ## Rules
///
/// - `Retryable` errors: timeouts, rate-limit responses, server-side (5xx)
///   transport failures.
/// - `NonRetryable` errors: authentication failures, malformed requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    ///
    /// `after` optionally specifies the minimum delay before retrying (e.g.
    /// derived from a `Retry-After` response header).
    Retryable {
        /// Minimum back-off before the next attempt. `None` means apply the
        /// caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Model boundary
// ---------------------------------------------------------------------------

/// Category of a [`ModelError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelErrorKind {
    /// Credentials were missing or refused.
    Auth,
    /// The provider throttled the request.
    RateLimit,
    /// The request did not complete within its deadline.
    Timeout,
    /// Any other network, protocol, or provider failure.
    Transport,
}

impl std::fmt::Display for ModelErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ModelErrorKind::Auth => "auth",
            ModelErrorKind::RateLimit => "rate limit",
            ModelErrorKind::Timeout => "timeout",
            ModelErrorKind::Transport => "transport",
        };
        f.write_str(s)
    }
}

/// Failure of a [`crate::ModelClient::generate`] call.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("model {kind} error: {message}")]
pub struct ModelError {
    /// What went wrong.
    pub kind: ModelErrorKind,
    /// Provider- or transport-supplied detail.
    pub message: String,
    /// Server-requested delay before retrying, when one was given.
    pub retry_after: Option<Duration>,
    /// Whether the failure is transient. Set by the adapter that observed it;
    /// defaults from [`ModelErrorKind`].
    pub transient: bool,
}

impl ModelError {
    /// Creates an error whose transience follows its kind: rate limits and
    /// timeouts are transient, auth and transport failures are not.
    pub fn new(kind: ModelErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
            transient: matches!(kind, ModelErrorKind::RateLimit | ModelErrorKind::Timeout),
        }
    }

    /// Sets the server-requested retry delay.
    #[must_use]
    pub fn with_retry_after(mut self, after: Option<Duration>) -> Self {
        self.retry_after = after;
        self
    }

    /// Overrides whether this error is transient (e.g. a 5xx transport failure).
    #[must_use]
    pub fn with_transient(mut self, transient: bool) -> Self {
        self.transient = transient;
        self
    }

    /// Returns the retry decision for this error.
    ///
    /// Authentication failures are never retryable, whatever the adapter set.
    pub fn retry_policy(&self) -> RetryPolicy {
        if self.transient && self.kind != ModelErrorKind::Auth {
            RetryPolicy::Retryable {
                after: self.retry_after,
            }
        } else {
            RetryPolicy::NonRetryable
        }
    }
}

// ---------------------------------------------------------------------------
// Stage errors
// ---------------------------------------------------------------------------

/// Category of a [`StageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageErrorKind {
    /// The model client failed (auth, rate limit, transport).
    ModelUnavailable,
    /// The model call exceeded the per-stage timeout, or the client itself
    /// reported a timeout.
    Timeout,
    /// The response could not be turned into any usable record (empty or
    /// whitespace-only text).
    MalformedResponse,
    /// The workflow context did not hold the record this stage consumes.
    /// Indicates a sequencing defect rather than a model problem.
    MissingInput,
}

impl std::fmt::Display for StageErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StageErrorKind::ModelUnavailable => "model unavailable",
            StageErrorKind::Timeout => "timeout",
            StageErrorKind::MalformedResponse => "malformed response",
            StageErrorKind::MissingInput => "missing input",
        };
        f.write_str(s)
    }
}

/// A stage could not produce its structured record.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{stage} stage failed ({kind}): {message}")]
pub struct StageError {
    /// The stage that failed.
    pub stage: StageKind,
    /// Failure category.
    pub kind: StageErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl StageError {
    /// Creates a stage error.
    pub fn new(stage: StageKind, kind: StageErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    /// Maps a model failure observed by `stage` onto the stage taxonomy.
    pub fn from_model(stage: StageKind, err: &ModelError) -> Self {
        let kind = match err.kind {
            ModelErrorKind::Timeout => StageErrorKind::Timeout,
            ModelErrorKind::Auth | ModelErrorKind::RateLimit | ModelErrorKind::Transport => {
                StageErrorKind::ModelUnavailable
            }
        };
        Self::new(stage, kind, err.to_string())
    }

    /// The stage's per-call deadline elapsed.
    pub fn timed_out(stage: StageKind, after: Duration) -> Self {
        Self::new(
            stage,
            StageErrorKind::Timeout,
            format!("no response within {} ms", after.as_millis()),
        )
    }

    /// The response contained no usable text.
    pub fn malformed(stage: StageKind, message: impl Into<String>) -> Self {
        Self::new(stage, StageErrorKind::MalformedResponse, message)
    }

    /// The context lacked a record the stage needs.
    pub fn missing_input(stage: StageKind, what: &str) -> Self {
        Self::new(
            stage,
            StageErrorKind::MissingInput,
            format!("workflow context has no {what}"),
        )
    }
}

// ---------------------------------------------------------------------------
// Workflow errors
// ---------------------------------------------------------------------------

/// Why a workflow run ended in the `Failed` state.
///
/// Every variant except [`WorkflowError::Cancelled`] wraps the [`StageError`]
/// that stopped the run. None of them is retried at the workflow level.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum WorkflowError {
    /// Research failed; nothing was drafted.
    #[error("research failed: {0}")]
    ResearchFailed(#[source] StageError),

    /// Drafting (or regeneration) failed.
    #[error("drafting failed: {0}")]
    DraftingFailed(#[source] StageError),

    /// Platform optimisation failed for the current draft.
    #[error("optimization failed: {0}")]
    OptimizationFailed(#[source] StageError),

    /// The reviewer failed. Never interpreted as approval or rejection.
    #[error("review failed: {0}")]
    ReviewFailed(#[source] StageError),

    /// An external cancellation signal was observed at a state boundary.
    #[error("workflow cancelled before {before}")]
    Cancelled {
        /// The state the run was about to enter.
        before: WorkflowState,
    },
}

impl WorkflowError {
    /// Wraps `err` in the variant matching the stage that produced it.
    pub fn from_stage(err: StageError) -> Self {
        match err.stage {
            StageKind::Researcher => WorkflowError::ResearchFailed(err),
            StageKind::Copywriter => WorkflowError::DraftingFailed(err),
            StageKind::Manager => WorkflowError::OptimizationFailed(err),
            StageKind::Reviewer => WorkflowError::ReviewFailed(err),
        }
    }

    /// The underlying stage error, if the run failed inside a stage.
    pub fn stage_error(&self) -> Option<&StageError> {
        match self {
            WorkflowError::ResearchFailed(e)
            | WorkflowError::DraftingFailed(e)
            | WorkflowError::OptimizationFailed(e)
            | WorkflowError::ReviewFailed(e) => Some(e),
            WorkflowError::Cancelled { .. } => None,
        }
    }

    /// Returns `true` if the run was cancelled rather than broken.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkflowError::Cancelled { .. })
    }
}

// ---------------------------------------------------------------------------
// Pre-run validation
// ---------------------------------------------------------------------------

/// A [`crate::WorkflowRequest`] could not be built from the supplied fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// No topic, or a blank one, was supplied.
    #[error("a non-empty topic is required")]
    MissingTopic,

    /// The platform name is not one of the supported platforms.
    #[error("unknown platform '{name}' (expected one of Instagram, LinkedIn, Twitter/X, Facebook, TikTok, YouTube)")]
    UnknownPlatform {
        /// The name as supplied.
        name: String,
    },
}

/// The workflow or model configuration is invalid.
///
/// Produced at construction time; an orchestrator never starts with an
/// invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid configuration for '{field}': {message}")]
pub struct ConfigError {
    /// The configuration key at fault.
    pub field: String,
    /// Description of the problem.
    pub message: String,
}

impl ConfigError {
    /// Creates a configuration error for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
