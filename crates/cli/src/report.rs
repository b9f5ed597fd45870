//! Human-readable summaries and JSON export of a [`WorkflowResult`] or a
//! standalone [`ReviewVerdict`].

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use pipeline::{Attempt, ReviewVerdict, StateTransition, WorkflowResult, WorkflowStatus};

/// Exit status for a finished run: success unless the run failed.
pub fn exit_code(result: &WorkflowResult) -> u8 {
    match result.status() {
        WorkflowStatus::Approved | WorkflowStatus::ExhaustedRetries => 0,
        WorkflowStatus::Failed => 1,
    }
}

/// One progress line for a state change.
pub fn progress_line(t: &StateTransition) -> String {
    if t.attempt == 0 {
        format!("  {} -> {}", t.from, t.to)
    } else {
        format!("  {} -> {} (attempt {})", t.from, t.to, t.attempt)
    }
}

/// Renders the end-of-run summary.
pub fn render(result: &WorkflowResult) -> String {
    let mut out = String::new();
    let request = result.request();

    let _ = writeln!(out, "Run:       {}", result.run_id());
    let _ = writeln!(out, "Topic:     {}", request.topic());
    let _ = writeln!(out, "Platform:  {}", request.platform().display_name());
    let _ = writeln!(out, "Status:    {}", result.status());
    let _ = writeln!(
        out,
        "Attempts:  {} ({} retries used)",
        result.history().len(),
        result.retries_used()
    );
    let _ = writeln!(out, "Elapsed:   {} ms", result.elapsed_ms());
    if let Some(err) = result.failure() {
        let _ = writeln!(out, "Failure:   {err}");
    }

    let _ = writeln!(out, "\nPhases:");
    let research = if result.research().is_some() { "done" } else { "-" };
    let _ = writeln!(out, "  research       {research}");
    for attempt in result.history() {
        let _ = writeln!(out, "  {}", phase_row(attempt));
    }

    match (result.status(), result.final_draft()) {
        (WorkflowStatus::Approved, Some(draft)) => {
            let _ = writeln!(out, "\nFinal content:\n{}", draft.copy);
            if !draft.metadata.hashtags.is_empty() {
                let tags: Vec<&str> = draft.metadata.hashtags.iter().map(String::as_str).collect();
                let _ = writeln!(out, "\nHashtags: {}", tags.join(" "));
            }
            if let Some(media) = &draft.metadata.media_type {
                let _ = writeln!(out, "Visual:   {media}");
            }
            if let Some(time) = result.final_strategy().and_then(|s| s.posting_time.as_deref()) {
                let _ = writeln!(out, "Post at:  {time}");
            }
        }
        (_, Some(draft)) => {
            let _ = writeln!(out, "\nLast draft (not approved):\n{}", draft.copy);
            if let Some(verdict) = result.final_verdict() {
                let _ = writeln!(out, "\nReviewer feedback:");
                for note in &verdict.feedback {
                    let _ = writeln!(out, "  - {note}");
                }
            }
        }
        (_, None) => {}
    }
    out
}

fn phase_row(attempt: &Attempt) -> String {
    let strategy = if attempt.strategy.is_some() { "done" } else { "-" };
    let review = attempt
        .verdict
        .as_ref()
        .map_or_else(|| "-".to_string(), |v| v.decision.to_string());
    format!(
        "attempt {:<6} draft done, strategy {strategy}, review {review}",
        attempt.number
    )
}

/// Writes `result` to `path` as pretty-printed JSON.
///
/// # Errors
///
/// Fails if serialisation or the write fails.
pub fn export(result: &WorkflowResult, path: &Path) -> anyhow::Result<()> {
    let json = result
        .to_json_pretty()
        .context("failed to serialise workflow result")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Renders the verdict on an existing post.
pub fn render_verdict(verdict: &ReviewVerdict) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Decision:  {}", verdict.decision);
    if !verdict.feedback.is_empty() {
        let _ = writeln!(out, "\nFeedback:");
        for note in &verdict.feedback {
            let _ = writeln!(out, "  - {note}");
        }
    }
    if !verdict.compliance_flags.is_empty() {
        let _ = writeln!(out, "\nCompliance flags:");
        for flag in &verdict.compliance_flags {
            let _ = writeln!(out, "  - {flag}");
        }
    }
    out
}

/// Writes `verdict` to `path` as pretty-printed JSON.
///
/// # Errors
///
/// Fails if serialisation or the write fails.
pub fn export_verdict(verdict: &ReviewVerdict, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(verdict).context("failed to serialise review verdict")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
