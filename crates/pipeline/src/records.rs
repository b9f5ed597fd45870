//! Structured records produced by the four stages.
//!
//! Each record has one *primary* field that is always populated (the whole
//! model response when no labelled section could be found) and optional
//! secondary fields that stay empty when the response did not provide them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Research
// ---------------------------------------------------------------------------

/// Trend analysis produced once per run by the researcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchInsight {
    /// Summary of current trends (primary field).
    pub trend_summary: String,
    /// Who to target and how, when the response called it out.
    pub audience_recommendations: Option<String>,
    /// Statistics and facts, in the order given.
    pub data_points: Vec<String>,
}

impl ResearchInsight {
    /// An insight holding only a trend summary.
    pub fn from_summary(summary: impl Into<String>) -> Self {
        Self {
            trend_summary: summary.into(),
            audience_recommendations: None,
            data_points: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

/// Metadata accompanying a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftMetadata {
    /// Hashtags, normalised to start with `#`, de-duplicated.
    pub hashtags: BTreeSet<String>,
    /// Suggested media (e.g. `"carousel"`, `"short vertical video"`).
    pub media_type: Option<String>,
}

/// One version of the post copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDraft {
    /// The post text (primary field).
    pub copy: String,
    pub metadata: DraftMetadata,
}

impl ContentDraft {
    /// A draft with copy only.
    pub fn from_copy(copy: impl Into<String>) -> Self {
        Self {
            copy: copy.into(),
            metadata: DraftMetadata::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Optimisation
// ---------------------------------------------------------------------------

/// Platform strategy computed for one specific draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationStrategy {
    /// Overall optimisation advice (primary field).
    pub summary: String,
    /// When to post.
    pub posting_time: Option<String>,
    /// Which hashtags to use and why.
    pub hashtag_strategy: Option<String>,
    /// Engagement tactics, in the order given.
    pub engagement_tactics: Vec<String>,
}

impl OptimizationStrategy {
    /// A strategy holding only a summary.
    pub fn from_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            posting_time: None,
            hashtag_strategy: None,
            engagement_tactics: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

/// The reviewer's recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Ready to publish.
    Approved,
    /// Acceptable only after the listed changes; triggers regeneration.
    ApprovedWithModifications,
    /// Not publishable.
    Rejected,
    /// The response named no recommendation; treated as not approved.
    Undetermined,
}

impl std::fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReviewDecision::Approved => "approved",
            ReviewDecision::ApprovedWithModifications => "approved with modifications",
            ReviewDecision::Rejected => "rejected",
            ReviewDecision::Undetermined => "undetermined",
        };
        f.write_str(s)
    }
}

/// The outcome of one review.
///
/// `approved` is derived from `decision` at construction and is `true` only
/// for [`ReviewDecision::Approved`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    pub decision: ReviewDecision,
    pub approved: bool,
    /// Improvement notes, in the order given.
    pub feedback: Vec<String>,
    /// Compliance concerns raised.
    pub compliance_flags: BTreeSet<String>,
    /// The reviewer's full assessment.
    pub summary: String,
}

impl ReviewVerdict {
    /// Builds a verdict, deriving `approved` from `decision`.
    pub fn new(
        decision: ReviewDecision,
        feedback: Vec<String>,
        compliance_flags: BTreeSet<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            decision,
            approved: decision == ReviewDecision::Approved,
            feedback,
            compliance_flags,
            summary: summary.into(),
        }
    }

    /// An approval with no notes.
    pub fn approve(summary: impl Into<String>) -> Self {
        Self::new(ReviewDecision::Approved, Vec::new(), BTreeSet::new(), summary)
    }

    /// A rejection carrying `feedback`.
    pub fn reject<I, S>(feedback: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let feedback: Vec<String> = feedback.into_iter().map(Into::into).collect();
        let summary = feedback.join("\n");
        Self::new(ReviewDecision::Rejected, feedback, BTreeSet::new(), summary)
    }
}
