use async_trait::async_trait;
use pipeline::{OptimizationInput, OptimizationStrategy, Stage, StageError, StageKind};

use super::ModelCall;
use crate::extract::{list_items, Sections};
use crate::prompts;

const SUMMARY: &[&str] = &["optimization", "optimisation", "summary", "strategy overview"];
const POSTING_TIME: &[&str] = &["posting time", "timing", "schedule", "when to post"];
const HASHTAGS: &[&str] = &["hashtag"];
const TACTICS: &[&str] = &["engagement", "tactic"];

/// Computes an [`OptimizationStrategy`] for the current draft.
#[derive(Debug, Clone)]
pub struct Manager {
    call: ModelCall,
}

impl Manager {
    pub fn new(call: ModelCall) -> Self {
        Self { call }
    }
}

#[async_trait]
impl Stage for Manager {
    type Input = OptimizationInput;
    type Output = OptimizationStrategy;

    fn kind(&self) -> StageKind {
        StageKind::Manager
    }

    async fn execute(&self, input: OptimizationInput) -> Result<OptimizationStrategy, StageError> {
        let prompt = prompts::manager(&input);
        let text = self.call.complete(self.kind(), &prompt).await?;
        Ok(parse(&text))
    }
}

pub(crate) fn parse(text: &str) -> OptimizationStrategy {
    let labels = [SUMMARY, POSTING_TIME, HASHTAGS, TACTICS].concat();
    let sections = Sections::parse(text, &labels);

    OptimizationStrategy {
        summary: sections.find(SUMMARY).unwrap_or_else(|| text.trim()).to_string(),
        posting_time: sections.find(POSTING_TIME).map(str::to_string),
        hashtag_strategy: sections.find(HASHTAGS).map(str::to_string),
        engagement_tactics: sections.find(TACTICS).map(list_items).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_labels_are_recognised() {
        let text = "**Optimization Summary:** Lead with the statistic.\n**Posting Time:** Tuesday 8-10am\n**Hashtag Strategy:** 3 niche + 1 branded\n**Engagement Tactics**\n1. Ask a question\n2. Reply within an hour";
        let strategy = parse(text);

        assert_eq!(strategy.summary, "Lead with the statistic.");
        assert_eq!(strategy.posting_time.as_deref(), Some("Tuesday 8-10am"));
        assert_eq!(strategy.hashtag_strategy.as_deref(), Some("3 niche + 1 branded"));
        assert_eq!(
            strategy.engagement_tactics,
            vec!["Ask a question", "Reply within an hour"]
        );
    }

    #[test]
    fn partial_response_leaves_secondary_fields_empty() {
        let strategy = parse("Post it on weekday mornings.");
        assert_eq!(strategy.summary, "Post it on weekday mornings.");
        assert!(strategy.posting_time.is_none());
        assert!(strategy.hashtag_strategy.is_none());
        assert!(strategy.engagement_tactics.is_empty());
    }
}
