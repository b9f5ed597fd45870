//! The stage port and the per-stage input projections.
//!
//! A [`Stage`] turns one input projection into one structured record. Each
//! input type holds exactly the fields its prompt template needs and is built
//! by a read-only accessor on [`crate::WorkflowContext`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    ContentDraft, OptimizationStrategy, Platform, ResearchInsight, StageError, Topic,
    WorkflowRequest,
};

/// Identifies one of the four stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Trend research.
    Researcher,
    /// Post copywriting.
    Copywriter,
    /// Platform optimisation (the "social media manager").
    Manager,
    /// Quality and compliance review.
    Reviewer,
}

impl StageKind {
    /// Stable lowercase name used in logs and configuration keys.
    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Researcher => "researcher",
            StageKind::Copywriter => "copywriter",
            StageKind::Manager => "manager",
            StageKind::Reviewer => "reviewer",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "researcher" | "research" => Ok(StageKind::Researcher),
            "copywriter" | "drafting" => Ok(StageKind::Copywriter),
            "manager" | "optimization" => Ok(StageKind::Manager),
            "reviewer" | "review" => Ok(StageKind::Reviewer),
            other => Err(format!("unknown stage '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Stage contract
// ---------------------------------------------------------------------------

/// One AI-backed transformation step.
///
/// Stages are stateless across invocations; the only side effect allowed is
/// the model call.
#[async_trait]
pub trait Stage: Send + Sync {
    /// The projection of the workflow context this stage consumes.
    type Input: Send + 'static;
    /// The structured record this stage produces.
    type Output: Send + 'static;

    /// Which stage this is.
    fn kind(&self) -> StageKind;

    /// Runs the stage.
    ///
    /// # Errors
    ///
    /// Returns a [`StageError`] if the model is unavailable, the call times
    /// out, or the response holds no usable text.
    async fn execute(&self, input: Self::Input) -> Result<Self::Output, StageError>;
}

/// Shared handle to the researcher.
pub type ResearchStage = dyn Stage<Input = ResearchInput, Output = ResearchInsight>;
/// Shared handle to the copywriter.
pub type DraftingStage = dyn Stage<Input = DraftingInput, Output = ContentDraft>;
/// Shared handle to the manager.
pub type OptimizationStage = dyn Stage<Input = OptimizationInput, Output = OptimizationStrategy>;
/// Shared handle to the reviewer.
pub type ReviewStage = dyn Stage<Input = ReviewInput, Output = crate::ReviewVerdict>;

// ---------------------------------------------------------------------------
// Input projections
// ---------------------------------------------------------------------------

/// What the researcher needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchInput {
    pub topic: Topic,
    pub platform: Platform,
    pub audience: String,
    pub industry: String,
}

/// Guidance carried into a regeneration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionGuidance {
    /// The attempt number being replaced (1-based).
    pub previous_attempt: u32,
    /// Copy of the rejected draft.
    pub previous_copy: String,
    /// Reviewer notes on the rejected draft.
    pub feedback: Vec<String>,
}

/// What the copywriter needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftingInput {
    pub topic: Topic,
    pub platform: Platform,
    pub audience: String,
    pub content_type: String,
    pub tone: String,
    pub call_to_action: String,
    pub research: ResearchInsight,
    /// The author's writing-style guidelines, when supplied.
    pub personal_style: Option<String>,
    /// Present when regenerating after a rejected review.
    pub revision: Option<RevisionGuidance>,
}

/// What the manager needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationInput {
    pub topic: Topic,
    pub platform: Platform,
    pub audience: String,
    pub goals: String,
    pub budget: String,
    pub brand_guidelines: String,
    pub draft: ContentDraft,
}

/// What the reviewer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInput {
    pub topic: Topic,
    pub platform: Platform,
    pub audience: String,
    pub brand_guidelines: String,
    pub compliance: String,
    pub draft: ContentDraft,
    /// Always present inside a workflow run; `None` when reviewing a post
    /// written elsewhere.
    pub strategy: Option<OptimizationStrategy>,
}

impl ReviewInput {
    /// Input for reviewing `copy` that was not produced by a workflow run.
    /// Audience, brand and compliance context come from `request`.
    pub fn for_existing_post(request: &WorkflowRequest, copy: impl Into<String>) -> Self {
        Self {
            topic: request.topic().clone(),
            platform: request.platform(),
            audience: request.audience().to_string(),
            brand_guidelines: request.brand_guidelines().to_string(),
            compliance: request.compliance().to_string(),
            draft: ContentDraft::from_copy(copy),
            strategy: None,
        }
    }
}
