//! Text/binary classification policy
//!
//! The single routine that turns a content type and a byte buffer into a
//! summary. Local files and downloaded bodies both go through `summarize`.

use crate::types::{AnalysisResult, BinarySummary, TextSummary};
use std::path::Path;

/// Characters of decoded text kept in a text preview
pub const TEXT_PREVIEW_CHARS: usize = 500;

/// Leading bytes hex-encoded in a binary preview
pub const HEX_PREVIEW_BYTES: usize = 32;

/// Content type reported when neither a header nor an extension helps
pub const UNKNOWN_CONTENT_TYPE: &str = "unknown";

/// Coarse text test: any content type mentioning "text"
pub fn is_text_type(content_type: &str) -> bool {
    content_type.contains("text")
}

/// Guess a MIME type from the extension of a file name or URL path
pub fn guess_content_type(path: impl AsRef<Path>) -> Option<&'static str> {
    mime_guess::from_path(path).first_raw()
}

/// Summarize `bytes` as text or binary according to `content_type`
///
/// Text is decoded as UTF-8 with invalid sequences replaced, so this never
/// fails on bad encodings.
pub fn summarize(content_type: &str, bytes: &[u8]) -> AnalysisResult {
    let byte_size = bytes.len() as u64;

    if is_text_type(content_type) {
        let text = String::from_utf8_lossy(bytes);
        AnalysisResult::Text(TextSummary {
            content_type: content_type.to_string(),
            line_count: count_lines(&text),
            word_count: text.split_whitespace().count(),
            byte_size,
            preview: text.chars().take(TEXT_PREVIEW_CHARS).collect(),
        })
    } else {
        let head = &bytes[..bytes.len().min(HEX_PREVIEW_BYTES)];
        AnalysisResult::Binary(BinarySummary {
            content_type: content_type.to_string(),
            byte_size,
            preview_bytes: hex::encode(head),
        })
    }
}

/// Characters that end a line on their own (`\r\n` counts once)
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}',
    '\u{2029}',
];

/// Count lines the way a line-splitting reader would
///
/// Every character in `LINE_BREAKS` ends a line, with `\r\n` as a single
/// break; trailing text without a terminator is one more line. Empty input
/// has zero lines.
pub fn count_lines(text: &str) -> usize {
    let mut lines = 0;
    let mut open_line = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                lines += 1;
                open_line = false;
            }
            c if LINE_BREAKS.contains(&c) => {
                lines += 1;
                open_line = false;
            }
            _ => open_line = true,
        }
    }

    lines + usize::from(open_line)
}
