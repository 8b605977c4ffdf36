//! Text extraction and prefix gating — pure functions, independent of the
//! transport.
//!
//! Extraction walks an explicit ordered list of candidate sources and takes
//! the first non-empty one. The prefix gate is a case-sensitive literal
//! match on the trimmed text; the matched prefix is stripped before the
//! prompt is forwarded.

use crate::transport::MessageContent;

type Extractor = fn(&MessageContent) -> Option<&str>;

fn conversation(content: &MessageContent) -> Option<&str> {
    content.conversation.as_deref()
}

fn extended_text(content: &MessageContent) -> Option<&str> {
    content.extended_text.as_deref()
}

fn image_caption(content: &MessageContent) -> Option<&str> {
    content.image_caption.as_deref()
}

fn video_caption(content: &MessageContent) -> Option<&str> {
    content.video_caption.as_deref()
}

/// Candidate sources in priority order: plain conversational text, extended
/// (quoted/link-preview) text, image caption, video caption.
const EXTRACTORS: &[Extractor] = &[conversation, extended_text, image_caption, video_caption];

/// First non-empty candidate in priority order, or None when the message
/// carries no usable text.
pub fn extract_text(content: &MessageContent) -> Option<&str> {
    EXTRACTORS
        .iter()
        .filter_map(|extract| extract(content))
        .find(|text| !text.is_empty())
}

/// Derive the prompt from extracted text. With a non-empty prefix, only
/// messages whose trimmed text starts with the exact literal qualify; the
/// prefix is stripped and the remainder trimmed again. An empty prefix
/// forwards the whole trimmed text. None means discard silently.
pub fn derive_prompt(text: &str, prefix: &str) -> Option<String> {
    let trimmed = text.trim();
    let prompt = if prefix.is_empty() {
        trimmed
    } else {
        trimmed.strip_prefix(prefix)?.trim()
    };
    if prompt.is_empty() {
        None
    } else {
        Some(prompt.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(
        conversation: Option<&str>,
        extended: Option<&str>,
        image: Option<&str>,
        video: Option<&str>,
    ) -> MessageContent {
        MessageContent {
            conversation: conversation.map(String::from),
            extended_text: extended.map(String::from),
            image_caption: image.map(String::from),
            video_caption: video.map(String::from),
        }
    }

    #[test]
    fn conversation_wins_over_everything() {
        let c = content(Some("plain"), Some("extended"), Some("img"), Some("vid"));
        assert_eq!(extract_text(&c), Some("plain"));
    }

    #[test]
    fn extended_text_wins_over_captions() {
        let c = content(None, Some("extended"), Some("img"), Some("vid"));
        assert_eq!(extract_text(&c), Some("extended"));
    }

    #[test]
    fn image_caption_wins_over_video_caption() {
        let c = content(None, None, Some("img"), Some("vid"));
        assert_eq!(extract_text(&c), Some("img"));
    }

    #[test]
    fn video_caption_is_last_resort() {
        let c = content(None, None, None, Some("vid"));
        assert_eq!(extract_text(&c), Some("vid"));
    }

    #[test]
    fn empty_candidates_are_skipped() {
        let c = content(Some(""), Some(""), Some("caption"), None);
        assert_eq!(extract_text(&c), Some("caption"));
    }

    #[test]
    fn no_candidates_means_no_text() {
        assert_eq!(extract_text(&MessageContent::default()), None);
        let c = content(Some(""), None, Some(""), None);
        assert_eq!(extract_text(&c), None);
    }

    #[test]
    fn prefix_match_is_stripped() {
        assert_eq!(
            derive_prompt("!gpt what is 2+2", "!gpt "),
            Some("what is 2+2".to_string())
        );
    }

    #[test]
    fn prefix_mismatch_is_discarded() {
        assert_eq!(derive_prompt("hi there", "!gpt "), None);
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        assert_eq!(derive_prompt("!GPT what is 2+2", "!gpt "), None);
    }

    #[test]
    fn empty_prefix_forwards_whole_text() {
        assert_eq!(derive_prompt("hello", ""), Some("hello".to_string()));
        assert_eq!(derive_prompt("  hello  ", ""), Some("hello".to_string()));
    }

    #[test]
    fn prompt_empty_after_strip_is_discarded() {
        assert_eq!(derive_prompt("!gpt", "!gpt"), None);
        assert_eq!(derive_prompt("!gpt    ", "!gpt"), None);
    }

    #[test]
    fn whitespace_only_text_is_discarded() {
        assert_eq!(derive_prompt("   ", ""), None);
    }

    #[test]
    fn text_is_trimmed_before_prefix_match() {
        assert_eq!(
            derive_prompt("  !gpt what is 2+2  ", "!gpt "),
            Some("what is 2+2".to_string())
        );
    }
}
