//! Splits accumulated streamed text into thinking and visible parts (C4).
//!
//! The LLM may wrap reasoning in `<thinking>...</thinking>` tags inline with
//! its regular reply. [`split_thinking`] is a pure function over the raw
//! accumulated text so far; callers run it on every chunk as more text
//! arrives and forward `thinking`/`visible` deltas to the UI separately.

/// Result of splitting accumulated text into its thinking and visible parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitThinking {
    /// Concatenated bodies of all closed `<thinking>...</thinking>` blocks, joined by `\n`.
    pub thinking: String,
    /// Text outside any thinking block.
    pub visible: String,
    /// True when the text ends mid-thinking-block (tag seen, no matching close yet).
    pub has_open_thinking: bool,
}

const OPEN_TAG_PREFIX: &str = "<thinking";
const CLOSE_TAG: &str = "</thinking>";

/// Splits `text` into thinking and visible parts.
///
/// Tag matching is case-insensitive and assumes ASCII tag text (lowercasing is
/// used only to locate `<thinking`/`</thinking>`, not to transform the output).
/// Nested thinking blocks are not supported: the first `</thinking>` found
/// after an opening tag closes it, whatever lies between is taken verbatim as
/// the block body, and scanning resumes after it.
pub fn split_thinking(text: &str) -> SplitThinking {
    let lower = text.to_lowercase();
    let mut visible = String::new();
    let mut thinking_parts: Vec<&str> = Vec::new();
    let mut cursor = 0usize;

    loop {
        let Some(open_rel) = lower[cursor..].find(OPEN_TAG_PREFIX) else {
            visible.push_str(&text[cursor..]);
            break;
        };
        let open_start = cursor + open_rel;
        visible.push_str(&text[cursor..open_start]);

        let Some(tag_close_rel) = lower[open_start..].find('>') else {
            // Opening tag itself hasn't fully streamed in yet.
            return SplitThinking {
                thinking: thinking_parts.join("\n"),
                visible,
                has_open_thinking: true,
            };
        };
        let body_start = open_start + tag_close_rel + 1;

        let Some(close_rel) = lower[body_start..].find(CLOSE_TAG) else {
            // Opening tag complete, no matching close yet: rest of text is thinking.
            thinking_parts.push(&text[body_start..]);
            return SplitThinking {
                thinking: thinking_parts.join("\n"),
                visible,
                has_open_thinking: true,
            };
        };
        let close_start = body_start + close_rel;
        thinking_parts.push(&text[body_start..close_start]);
        cursor = close_start + CLOSE_TAG.len();
    }

    SplitThinking {
        thinking: thinking_parts.join("\n"),
        visible,
        has_open_thinking: false,
    }
}
