//! Best-effort extraction of labelled sections from free-form model text.
//!
//! Models are asked to answer with labelled sections but routinely drift:
//! markdown headings, bold labels, `Label:` lines, numbering, or no structure
//! at all. Nothing here fails. Callers look sections up by alias and fall
//! back to the whole response when a section is missing.
//!
//! A line opens a section when it is
//!
//! - a markdown heading (`## Trend Summary`),
//! - a bold line (`**Trend Summary**`, `**Decision:** APPROVE`) whose title
//!   matches one of the caller's aliases, or
//! - a `Label: text` line whose label matches one of the caller's aliases.
//!
//! Anything else stays body text, so emphasis such as `**Stop buying new.**`
//! and list items such as `1. Gen Z: 62% buy second-hand` never split a
//! section. A numbered candidate (`2. Risk: ...`) only opens a section when
//! the current one was itself opened by a numbered line, which keeps numbered
//! notes inside a `## Feedback` section together.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static MARKDOWN_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#{1,6}\s+(?P<title>.+?)\s*#*\s*$").expect("heading pattern is valid")
});

static BOLD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<num>\d+[.)]\s*)?\*\*(?P<title>[^*]+?)\*\*\s*:?\s*(?P<rest>.*)$")
        .expect("bold pattern is valid")
});

static LABEL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<num>\d+[.)]\s*)?(?P<title>[A-Za-z][A-Za-z /&'()-]{0,48}):\s*(?P<rest>.*)$")
        .expect("label pattern is valid")
});

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•+]\s+|\d+[.)]\s+)").expect("list pattern is valid")
});

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[\p{L}\p{N}_]+").expect("hashtag pattern is valid"));

/// Longest label, in words, accepted for a bold or `Label:` heading.
const MAX_LABEL_WORDS: usize = 6;

/// One labelled section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Section {
    /// Lowercased heading with numbering and markup removed.
    pub heading: String,
    /// Trimmed section text.
    pub body: String,
}

/// The labelled sections found in a response, in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Sections {
    sections: Vec<Section>,
}

impl Sections {
    /// Splits `text` into sections. `aliases` lists every label the caller
    /// may look up; it decides which plain `Label:` lines count as headings.
    pub fn parse(text: &str, aliases: &[&str]) -> Self {
        let mut sections: Vec<Section> = Vec::new();
        let mut current: Option<Open> = None;

        for line in text.lines() {
            let trimmed = line.trim();
            let candidate = heading(trimmed, aliases).filter(|h| match &current {
                Some(open) if h.numbered => open.numbered && !line.starts_with(char::is_whitespace),
                _ => true,
            });
            match candidate {
                Some(found) => {
                    if let Some(open) = current.take() {
                        sections.push(open.finish());
                    }
                    let mut body = Vec::new();
                    if !found.rest.is_empty() {
                        body.push(found.rest);
                    }
                    current = Some(Open {
                        heading: found.title,
                        numbered: found.numbered,
                        body,
                    });
                }
                None => {
                    if let Some(open) = current.as_mut() {
                        open.body.push(trimmed.to_string());
                    }
                }
            }
        }
        if let Some(open) = current.take() {
            sections.push(open.finish());
        }

        Self { sections }
    }

    /// Body of the first non-empty section whose heading contains any of `aliases`.
    pub fn find(&self, aliases: &[&str]) -> Option<&str> {
        self.sections
            .iter()
            .filter(|s| !s.body.is_empty())
            .find(|s| aliases.iter().any(|a| s.heading.contains(a)))
            .map(|s| s.body.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// A section still collecting body lines.
struct Open {
    heading: String,
    numbered: bool,
    body: Vec<String>,
}

impl Open {
    fn finish(self) -> Section {
        Section {
            heading: self.heading,
            body: self.body.join("\n").trim().to_string(),
        }
    }
}

/// A line recognised as a heading.
struct Heading {
    /// Normalised title.
    title: String,
    /// Text that followed the label on the same line.
    rest: String,
    /// Whether the line carried list numbering (`2. Risk: ...`).
    numbered: bool,
}

fn heading(line: &str, aliases: &[&str]) -> Option<Heading> {
    if line.is_empty() {
        return None;
    }

    if let Some(caps) = MARKDOWN_HEADING.captures(line) {
        let title = normalise(&caps["title"]);
        if !title.is_empty() {
            return Some(Heading {
                title,
                rest: String::new(),
                numbered: false,
            });
        }
    }

    // Bold text is emphasis unless it names a known section.
    let labelled = BOLD_LINE
        .captures(line)
        .filter(|caps| !is_sentence(&caps["title"]))
        .or_else(|| LABEL_LINE.captures(line))?;
    let title = normalise(&labelled["title"]);
    if title.is_empty()
        || title.split_whitespace().count() > MAX_LABEL_WORDS
        || !matches_alias(&title, aliases)
    {
        return None;
    }
    Some(Heading {
        title,
        rest: labelled["rest"].trim().to_string(),
        numbered: labelled.name("num").is_some(),
    })
}

/// Bold text ending like a sentence is emphasis, never a heading.
fn is_sentence(title: &str) -> bool {
    title.trim_end().ends_with(['.', '!', '?'])
}

fn matches_alias(title: &str, aliases: &[&str]) -> bool {
    aliases.iter().any(|a| title.contains(a))
}

/// Lowercases a heading and strips numbering, markup, and trailing colons.
fn normalise(title: &str) -> String {
    let stripped = LIST_MARKER.replace(title.trim(), "");
    stripped
        .trim_matches(|c: char| c == '*' || c == '_' || c == ':' || c == '#' || c.is_whitespace())
        .to_lowercase()
}

/// Splits a section body into list items, removing bullet and number markers.
pub(crate) fn list_items(body: &str) -> Vec<String> {
    body.lines()
        .map(|line| LIST_MARKER.replace(line.trim(), "").trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Collects `#tags` from `text`.
pub(crate) fn hashtags(text: &str) -> BTreeSet<String> {
    HASHTAG
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Reads a hashtag section, accepting both `#tag` tokens and bare words.
pub(crate) fn hashtags_from_section(body: &str) -> BTreeSet<String> {
    let tagged = hashtags(body);
    if !tagged.is_empty() {
        return tagged;
    }
    body.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '_'))
        .filter(|w| !w.is_empty())
        .map(|w| format!("#{w}"))
        .collect()
}

/// First list item or line of `body`.
pub(crate) fn first_line(body: &str) -> Option<String> {
    list_items(body).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALIASES: &[&str] = &["trend", "audience", "data"];

    #[test]
    fn markdown_headings_split_sections() {
        let text = "Intro text\n\n## Trend Summary\nThrifting is up.\nResale too.\n\n## Data Points\n- 62% of Gen Z\n- 3x growth";
        let sections = Sections::parse(text, ALIASES);

        assert_eq!(
            sections.find(&["trend"]),
            Some("Thrifting is up.\nResale too.")
        );
        assert_eq!(sections.find(&["data"]), Some("- 62% of Gen Z\n- 3x growth"));
        assert_eq!(sections.find(&["audience"]), None);
    }

    #[test]
    fn bold_and_label_lines_with_inline_text_are_headings() {
        let text = "**Trend Summary:** Thrifting is up.\nTarget Audience: eco-minded millennials";
        let sections = Sections::parse(text, ALIASES);

        assert_eq!(sections.find(&["trend"]), Some("Thrifting is up."));
        assert_eq!(
            sections.find(&["audience"]),
            Some("eco-minded millennials")
        );
    }

    #[test]
    fn unknown_label_lines_stay_in_the_body() {
        let text = "## Data Points\n1. Gen Z: 62% buy second-hand\n2. Resale: worth $200B";
        let sections = Sections::parse(text, ALIASES);

        let body = sections.find(&["data"]).unwrap();
        assert_eq!(
            list_items(body),
            vec!["Gen Z: 62% buy second-hand", "Resale: worth $200B"]
        );
    }

    #[test]
    fn bold_emphasis_inside_a_section_stays_in_the_body() {
        let text = "## Trend Summary\n**Thrifting is booming.**\nResale grew 3x.\n**Key takeaway**\n\n## Data\n- 62%";
        let sections = Sections::parse(text, ALIASES);

        assert_eq!(
            sections.find(&["trend"]),
            Some("**Thrifting is booming.**\nResale grew 3x.\n**Key takeaway**")
        );
        assert_eq!(sections.find(&["data"]), Some("- 62%"));
    }

    #[test]
    fn bold_sentences_never_open_a_section() {
        let sections = Sections::parse("**Audience matters more than ever.**\nBody", ALIASES);
        assert!(sections.is_empty());
    }

    #[test]
    fn numbered_labels_inside_a_section_stay_in_the_body() {
        let aliases = ["feedback", "compliance", "risk"];
        let text = "## Feedback\n1. Hook: lead with the statistic\n2. Risk: the 62% claim needs a source\n3. Tone: less salesy\n\n## Compliance Flags\nNone";
        let sections = Sections::parse(text, &aliases);

        assert_eq!(
            list_items(sections.find(&["feedback"]).unwrap()),
            vec![
                "Hook: lead with the statistic",
                "Risk: the 62% claim needs a source",
                "Tone: less salesy",
            ]
        );
        assert_eq!(sections.find(&["compliance", "risk"]), Some("None"));
    }

    #[test]
    fn numbered_headings_follow_each_other() {
        let text = "1. Trend Summary: Thrifting is up.\n2. Target Audience: students\n   3. Data: nested, stays put\n3. Data Points: 62%";
        let sections = Sections::parse(text, ALIASES);

        assert_eq!(sections.find(&["trend"]), Some("Thrifting is up."));
        assert_eq!(
            sections.find(&["audience"]),
            Some("students\n3. Data: nested, stays put")
        );
        assert_eq!(sections.find(&["data"]), Some("62%"));
    }

    #[test]
    fn unstructured_text_has_no_sections() {
        let sections = Sections::parse("Just a paragraph of prose.", ALIASES);
        assert!(sections.is_empty());
        assert_eq!(sections.find(&["trend"]), None);
    }

    #[test]
    fn empty_sections_are_skipped_when_looking_up() {
        let text = "## Trend\n\n## Trend Summary\nActual content";
        let sections = Sections::parse(text, ALIASES);
        assert_eq!(sections.find(&["trend"]), Some("Actual content"));
    }

    #[test]
    fn list_items_strip_markers() {
        let body = "- one\n* two\n• three\n4) four\n\nfive";
        assert_eq!(list_items(body), vec!["one", "two", "three", "four", "five"]);
    }

    #[test]
    fn hashtags_are_collected_and_deduplicated() {
        let tags = hashtags("Love it #SlowFashion #thrift and #thrift again #été");
        let expected: BTreeSet<String> = ["#SlowFashion", "#thrift", "#été"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(tags, expected);
    }

    #[test]
    fn hashtag_sections_accept_bare_words() {
        let tags = hashtags_from_section("slowfashion, thrift; circular");
        assert!(tags.contains("#slowfashion"));
        assert!(tags.contains("#thrift"));
        assert!(tags.contains("#circular"));
    }
}
