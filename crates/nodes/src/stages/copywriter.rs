use async_trait::async_trait;
use pipeline::{ContentDraft, DraftMetadata, DraftingInput, Stage, StageError, StageKind};

use super::ModelCall;
use crate::extract::{first_line, hashtags, hashtags_from_section, Sections};
use crate::prompts;

const COPY: &[&str] = &["post", "copy", "caption", "content"];
const HASHTAGS: &[&str] = &["hashtag"];
const VISUAL: &[&str] = &["visual", "media"];

/// Writes a [`ContentDraft`]. On regeneration the input carries the previous
/// draft and the reviewer's feedback, which the prompt asks the model to fix.
#[derive(Debug, Clone)]
pub struct Copywriter {
    call: ModelCall,
}

impl Copywriter {
    pub fn new(call: ModelCall) -> Self {
        Self { call }
    }
}

#[async_trait]
impl Stage for Copywriter {
    type Input = DraftingInput;
    type Output = ContentDraft;

    fn kind(&self) -> StageKind {
        StageKind::Copywriter
    }

    async fn execute(&self, input: DraftingInput) -> Result<ContentDraft, StageError> {
        let prompt = prompts::copywriter(&input);
        let text = self.call.complete(self.kind(), &prompt).await?;
        Ok(parse(&text))
    }
}

pub(crate) fn parse(text: &str) -> ContentDraft {
    let labels = [COPY, HASHTAGS, VISUAL].concat();
    let sections = Sections::parse(text, &labels);

    let hashtags = match sections.find(HASHTAGS) {
        Some(body) => hashtags_from_section(body),
        None => hashtags(text),
    };

    ContentDraft {
        copy: sections.find(COPY).unwrap_or_else(|| text.trim()).to_string(),
        metadata: DraftMetadata {
            hashtags,
            media_type: sections.find(VISUAL).and_then(first_line),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_populate_copy_and_metadata() {
        let text = "## Post\nThrift first. Then buy.\nWhat's your best find?\n\n## Hashtags\n#thrift #SlowFashion\n\n## Visual\n- Carousel of before/after outfits";
        let draft = parse(text);

        assert_eq!(draft.copy, "Thrift first. Then buy.\nWhat's your best find?");
        assert_eq!(draft.metadata.hashtags.len(), 2);
        assert!(draft.metadata.hashtags.contains("#SlowFashion"));
        assert_eq!(
            draft.metadata.media_type.as_deref(),
            Some("Carousel of before/after outfits")
        );
    }

    #[test]
    fn bold_lines_in_the_post_are_part_of_the_copy() {
        let text = "## Post\n**Stop buying new.**\nThrift first, then buy.\n\n## Hashtags\n#thrift\n\n## Visual\nCarousel";
        let draft = parse(text);

        assert_eq!(draft.copy, "**Stop buying new.**\nThrift first, then buy.");
        assert!(draft.metadata.hashtags.contains("#thrift"));
        assert!(!draft.copy.contains("## Hashtags"));
    }

    #[test]
    fn bare_copy_falls_back_to_inline_hashtags() {
        let draft = parse("Give old clothes a new life. #upcycle #thrift");
        assert_eq!(draft.copy, "Give old clothes a new life. #upcycle #thrift");
        assert!(draft.metadata.hashtags.contains("#upcycle"));
        assert!(draft.metadata.hashtags.contains("#thrift"));
        assert!(draft.metadata.media_type.is_none());
    }
}
