use std::collections::BTreeSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use pipeline::{ReviewDecision, ReviewInput, ReviewVerdict, Stage, StageError, StageKind};
use regex::Regex;

use super::ModelCall;
use crate::extract::{list_items, Sections};
use crate::prompts;

const DECISION: &[&str] = &["decision", "recommendation", "verdict"];
const FEEDBACK: &[&str] = &["improvement", "feedback", "suggestion"];
const COMPLIANCE: &[&str] = &["compliance", "risk"];

static WITH_MODIFICATIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bapproved?\s+with\s+(?:minor\s+|some\s+)?(?:modifications?|changes|edits)\b|\bconditional(?:ly)?\s+approv")
        .expect("modifications pattern is valid")
});

static REJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:reject(?:ed)?|not\s+approved?)\b").expect("reject pattern is valid")
});

static APPROVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bapproved?\b").expect("approve pattern is valid"));

/// Compliance entries that mean "nothing to report".
const NO_FLAGS: &[&str] = &["none", "n/a", "na", "no concerns", "no issues", "nothing"];

/// Produces a [`ReviewVerdict`] for the current draft and its strategy.
#[derive(Debug, Clone)]
pub struct Reviewer {
    call: ModelCall,
}

impl Reviewer {
    pub fn new(call: ModelCall) -> Self {
        Self { call }
    }
}

#[async_trait]
impl Stage for Reviewer {
    type Input = ReviewInput;
    type Output = ReviewVerdict;

    fn kind(&self) -> StageKind {
        StageKind::Reviewer
    }

    async fn execute(&self, input: ReviewInput) -> Result<ReviewVerdict, StageError> {
        let prompt = prompts::reviewer(&input);
        let text = self.call.complete(self.kind(), &prompt).await?;
        let verdict = parse(&text);
        tracing::debug!(
            decision = %verdict.decision,
            feedback_items = verdict.feedback.len(),
            compliance_flags = verdict.compliance_flags.len(),
            "review parsed"
        );
        Ok(verdict)
    }
}

pub(crate) fn parse(text: &str) -> ReviewVerdict {
    let labels = [DECISION, FEEDBACK, COMPLIANCE].concat();
    let sections = Sections::parse(text, &labels);
    let summary = text.trim();

    let decision = sections
        .find(DECISION)
        .and_then(earliest_decision)
        .unwrap_or_else(|| decision_by_priority(text));

    let mut feedback = sections.find(FEEDBACK).map(list_items).unwrap_or_default();
    if feedback.is_empty() && decision != ReviewDecision::Approved {
        feedback.push(summary.to_string());
    }

    let compliance_flags: BTreeSet<String> = sections
        .find(COMPLIANCE)
        .map(list_items)
        .unwrap_or_default()
        .into_iter()
        .filter(|flag| !is_empty_flag(flag))
        .collect();

    ReviewVerdict::new(decision, feedback, compliance_flags, summary)
}

/// Within a decision section the first recommendation named wins.
fn earliest_decision(section: &str) -> Option<ReviewDecision> {
    [
        (&*WITH_MODIFICATIONS, ReviewDecision::ApprovedWithModifications),
        (&*REJECT, ReviewDecision::Rejected),
        (&*APPROVE, ReviewDecision::Approved),
    ]
    .into_iter()
    .enumerate()
    .filter_map(|(rank, (pattern, decision))| {
        pattern.find(section).map(|m| ((m.start(), rank), decision))
    })
    .min_by_key(|(key, _)| *key)
    .map(|(_, decision)| decision)
}

/// Without a decision section the whole response is scanned, and the most
/// cautious recommendation found wins.
fn decision_by_priority(text: &str) -> ReviewDecision {
    if WITH_MODIFICATIONS.is_match(text) {
        ReviewDecision::ApprovedWithModifications
    } else if REJECT.is_match(text) {
        ReviewDecision::Rejected
    } else if APPROVE.is_match(text) {
        ReviewDecision::Approved
    } else {
        ReviewDecision::Undetermined
    }
}

fn is_empty_flag(flag: &str) -> bool {
    let normalised = flag
        .trim_end_matches(|c: char| c == '.' || c == '!')
        .trim()
        .to_lowercase();
    NO_FLAGS
        .iter()
        .any(|none| normalised == *none || normalised.starts_with(&format!("{none} ")))
}
