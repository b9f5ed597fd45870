//! Core workflow domain for Social Agent.
//!
//! This crate contains every domain concept used throughout the content
//! pipeline: the request, the records each stage produces, the accumulating
//! workflow context, the state rules, the final result, and the error
//! taxonomy. Infrastructure crates implement the traits defined here; they
//! never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed ([`ModelClient`], [`Stage`]); the `nodes` and
//! `llm` crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`WorkflowRunId`, `Topic`, `DeploymentName`) |
//! | [`types`] | Shared value types (`Platform`, `Temperature`, `Timestamp`) |
//! | [`errors`] | Model, stage, workflow, request, and configuration errors |
//! | [`request`] | [`WorkflowRequest`] and its builder |
//! | [`records`] | Stage outputs (`ResearchInsight`, `ContentDraft`, ...) |
//! | [`model`] | The [`ModelClient`] port and [`ModelOptions`] |
//! | [`stage`] | The [`Stage`] port and per-stage input projections |
//! | [`context`] | [`WorkflowContext`] and its history of [`Attempt`]s |
//! | [`state`] | [`WorkflowState`] and the review transition rule |
//! | [`config`] | [`WorkflowConfig`] |
//! | [`result`] | [`WorkflowResult`] |

pub mod config;
pub mod context;
pub mod errors;
pub mod identifiers;
pub mod model;
pub mod records;
pub mod request;
pub mod result;
pub mod stage;
pub mod state;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{WorkflowConfig, DEFAULT_MAX_RETRIES, DEFAULT_WORKFLOW_TIMEOUT};
pub use context::{Attempt, WorkflowContext};
pub use errors::{
    ConfigError, ModelError, ModelErrorKind, RequestError, RetryPolicy, StageError,
    StageErrorKind, WorkflowError,
};
pub use identifiers::{DeploymentName, Topic, WorkflowRunId};
pub use model::{ModelClient, ModelOptions, DEFAULT_MAX_TOKENS, DEFAULT_MODEL_TIMEOUT_MS};
pub use records::{
    ContentDraft, DraftMetadata, OptimizationStrategy, ResearchInsight, ReviewDecision,
    ReviewVerdict,
};
pub use request::{WorkflowRequest, WorkflowRequestBuilder};
pub use result::{Completion, WorkflowResult, WorkflowStatus};
pub use stage::{
    DraftingInput, DraftingStage, OptimizationInput, OptimizationStage, ResearchInput,
    ResearchStage, ReviewInput, ReviewStage, RevisionGuidance, Stage, StageKind,
};
pub use state::{decide_after_review, ReviewOutcome, StateTransition, WorkflowState};
pub use types::{Platform, Temperature, Timestamp};
