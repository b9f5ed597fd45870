//! Prompt templates for the four stages.
//!
//! Templates live under `prompts/` as plain markdown and are compiled into
//! the binary. Placeholders are written `{name}` and substituted in a single
//! pass, so user text that happens to contain `{topic}` is never expanded.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use pipeline::{
    DraftingInput, OptimizationInput, OptimizationStrategy, ResearchInput, ResearchInsight,
    ReviewInput, RevisionGuidance,
};
use regex::{Captures, Regex};

const RESEARCHER: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/researcher.md"));
const COPYWRITER: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/copywriter.md"));
const COPYWRITER_REVISION: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/copywriter_revision.md"
));
const PERSONAL_STYLE: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/personal_style.md"));
const MANAGER: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/manager.md"));
const REVIEWER: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/reviewer.md"));

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"));

/// Substitutes `{name}` placeholders from `values`. Unknown placeholders are
/// left as written.
pub(crate) fn render(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            values
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

// ---------------------------------------------------------------------------
// Per-stage prompts
// ---------------------------------------------------------------------------

pub(crate) fn researcher(input: &ResearchInput) -> String {
    render(
        RESEARCHER,
        &[
            ("topic", input.topic.as_str()),
            ("audience", &input.audience),
            ("platform", input.platform.display_name()),
            ("industry", &input.industry),
        ],
    )
}

pub(crate) fn copywriter(input: &DraftingInput) -> String {
    let research = research_brief(&input.research);
    let revision = input
        .revision
        .as_ref()
        .map(revision_brief)
        .unwrap_or_default();
    let style = input
        .personal_style
        .as_deref()
        .map(|style| render(PERSONAL_STYLE, &[("style", style)]))
        .unwrap_or_default();

    render(
        COPYWRITER,
        &[
            ("content_type", &input.content_type),
            ("platform", input.platform.display_name()),
            ("topic", input.topic.as_str()),
            ("audience", &input.audience),
            ("tone", &input.tone),
            ("call_to_action", &input.call_to_action),
            ("research", &research),
            ("style", &style),
            ("revision", &revision),
        ],
    )
}

pub(crate) fn manager(input: &OptimizationInput) -> String {
    let hashtags = tag_list(&input.draft.metadata.hashtags);
    render(
        MANAGER,
        &[
            ("platform", input.platform.display_name()),
            ("topic", input.topic.as_str()),
            ("audience", &input.audience),
            ("goals", &input.goals),
            ("budget", &input.budget),
            ("brand_guidelines", &input.brand_guidelines),
            ("copy", &input.draft.copy),
            ("hashtags", &hashtags),
        ],
    )
}

pub(crate) fn reviewer(input: &ReviewInput) -> String {
    let strategy = input
        .strategy
        .as_ref()
        .map(strategy_brief)
        .unwrap_or_else(|| "(none prepared; judge the post on its own)".to_string());
    render(
        REVIEWER,
        &[
            ("platform", input.platform.display_name()),
            ("topic", input.topic.as_str()),
            ("audience", &input.audience),
            ("brand_guidelines", &input.brand_guidelines),
            ("compliance", &input.compliance),
            ("copy", &input.draft.copy),
            ("strategy", &strategy),
        ],
    )
}

// ---------------------------------------------------------------------------
// Record summaries embedded in later prompts
// ---------------------------------------------------------------------------

fn research_brief(insight: &ResearchInsight) -> String {
    let mut out = insight.trend_summary.clone();
    if let Some(audience) = &insight.audience_recommendations {
        out.push_str("\n\nAudience: ");
        out.push_str(audience);
    }
    for point in &insight.data_points {
        out.push_str("\n- ");
        out.push_str(point);
    }
    out
}

fn revision_brief(guidance: &RevisionGuidance) -> String {
    let feedback = if guidance.feedback.is_empty() {
        "- (no specific feedback was given)".to_string()
    } else {
        guidance
            .feedback
            .iter()
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let attempt = (guidance.previous_attempt + 1).to_string();
    render(
        COPYWRITER_REVISION,
        &[
            ("attempt", &attempt),
            ("previous_copy", &guidance.previous_copy),
            ("feedback", &feedback),
        ],
    )
}

fn strategy_brief(strategy: &OptimizationStrategy) -> String {
    let mut out = strategy.summary.clone();
    if let Some(time) = &strategy.posting_time {
        out.push_str("\nPosting time: ");
        out.push_str(time);
    }
    if let Some(tags) = &strategy.hashtag_strategy {
        out.push_str("\nHashtags: ");
        out.push_str(tags);
    }
    for tactic in &strategy.engagement_tactics {
        out.push_str("\n- ");
        out.push_str(tactic);
    }
    out
}

fn tag_list(tags: &BTreeSet<String>) -> String {
    if tags.is_empty() {
        "(none)".to_string()
    } else {
        tags.iter().cloned().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{ContentDraft, Platform, WorkflowContext, WorkflowRequest};

    fn request() -> WorkflowRequest {
        WorkflowRequest::builder("sustainable fashion trends")
            .platform(Platform::LinkedIn)
            .audience("eco-conscious millennials")
            .build()
            .unwrap()
    }

    #[test]
    fn render_is_single_pass() {
        let out = render("{a} and {b} and {missing}", &[("a", "{b}"), ("b", "two")]);
        assert_eq!(out, "{b} and two and {missing}");
    }

    #[test]
    fn researcher_prompt_fills_every_placeholder() {
        let ctx = WorkflowContext::new(request(), 2);
        let prompt = researcher(&ctx.for_researcher());

        assert!(prompt.contains("sustainable fashion trends"));
        assert!(prompt.contains("eco-conscious millennials"));
        assert!(prompt.contains("LinkedIn"));
        assert!(!PLACEHOLDER.is_match(&prompt));
    }

    #[test]
    fn first_draft_prompt_has_no_revision_block() {
        let mut ctx = WorkflowContext::new(request(), 2);
        ctx.record_research(ResearchInsight::from_summary("thrifting is up"));
        let prompt = copywriter(&ctx.for_copywriter().unwrap());

        assert!(prompt.contains("thrifting is up"));
        assert!(!prompt.contains("Reviewer feedback"));
        assert!(!PLACEHOLDER.is_match(&prompt));
    }

    #[test]
    fn revision_prompt_includes_previous_copy_and_feedback() {
        let mut ctx = WorkflowContext::new(request(), 2);
        ctx.record_research(ResearchInsight::from_summary("insight"));
        ctx.push_draft(ContentDraft::from_copy("first try"));
        ctx.attach_strategy(OptimizationStrategy::from_summary("s"));
        ctx.attach_verdict(pipeline::ReviewVerdict::reject(["add a question"]));
        ctx.begin_regeneration();

        let prompt = copywriter(&ctx.for_copywriter().unwrap());
        assert!(prompt.contains("This is revision 2"));
        assert!(prompt.contains("first try"));
        assert!(prompt.contains("- add a question"));
    }

    #[test]
    fn personal_style_is_added_to_every_draft_prompt() {
        let request = WorkflowRequest::builder("sustainable fashion trends")
            .personal_style("Short sentences. One question at the end.")
            .build()
            .unwrap();
        let mut ctx = WorkflowContext::new(request, 2);
        ctx.record_research(ResearchInsight::from_summary("insight"));

        let prompt = copywriter(&ctx.for_copywriter().unwrap());
        assert!(prompt.contains("personal style:\nShort sentences. One question at the end."));
        assert!(!PLACEHOLDER.is_match(&prompt));

        let mut plain = WorkflowContext::new(self::request(), 2);
        plain.record_research(ResearchInsight::from_summary("insight"));
        assert!(!copywriter(&plain.for_copywriter().unwrap()).contains("personal style"));
    }

    #[test]
    fn existing_post_review_prompt_has_no_strategy() {
        let input = ReviewInput::for_existing_post(&request(), "my old post");
        let prompt = reviewer(&input);

        assert!(prompt.contains("my old post"));
        assert!(prompt.contains("(none prepared; judge the post on its own)"));
        assert!(!PLACEHOLDER.is_match(&prompt));
    }

    #[test]
    fn reviewer_prompt_embeds_draft_and_strategy() {
        let mut ctx = WorkflowContext::new(request(), 2);
        ctx.record_research(ResearchInsight::from_summary("insight"));
        ctx.push_draft(ContentDraft::from_copy("the post"));
        let mut strategy = OptimizationStrategy::from_summary("shorter intro");
        strategy.posting_time = Some("Tuesday 9am".to_string());
        ctx.attach_strategy(strategy);

        let prompt = reviewer(&ctx.for_reviewer().unwrap());
        assert!(prompt.contains("the post"));
        assert!(prompt.contains("Posting time: Tuesday 9am"));
        assert!(!PLACEHOLDER.is_match(&prompt));
    }
}
