//! Locates the header span inside raw file bytes.

use bstr::ByteSlice;

use super::delimiters::CommentStyle;

/// Byte and line extent of a located header.
///
/// `end` is the byte immediately after the suffix; the line range is
/// half-open, counted in newline characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSpan {
    pub start: usize,
    pub end: usize,
    pub start_line: usize,
    pub end_line: usize,
}

/// Find the first prefix...suffix span. Returns `None` when either delimiter
/// is missing (a prefix without a closing suffix reports no header).
pub fn locate(content: &[u8], style: &CommentStyle) -> Option<HeaderSpan> {
    let start = content.find(style.prefix.as_bytes())?;
    let suffix_at = content.find(style.suffix.as_bytes())?;
    let end = suffix_at + style.suffix.len();
    if end < start {
        return None;
    }

    let start_line = count_newlines(&content[..start]);
    let end_line = start_line + count_newlines(&content[start..end]);
    Some(HeaderSpan {
        start,
        end,
        start_line,
        end_line,
    })
}

/// Header body: the span with the prefix and suffix stripped. A
/// negative-length body clamps to empty.
pub fn body_of<'a>(content: &'a [u8], span: &HeaderSpan, style: &CommentStyle) -> &'a [u8] {
    let raw = &content[span.start..span.end];
    let from = style.prefix.len();
    let to = raw.len().saturating_sub(style.suffix.len());
    if to <= from {
        b""
    } else {
        &raw[from..to]
    }
}

fn count_newlines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == b'\n').count()
}
