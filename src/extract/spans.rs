//! Span utilities for citation anchoring
//!
//! This module provides deterministic identifiers, footnote marker
//! discovery, and conversion of byte offsets to line/column positions.
//!
//! All offsets are UTF-8 byte indices into the source text, half-open.

use sha2::{Digest, Sha256};

use crate::domain::CitationType;

/// Compute SHA256 hash of a byte slice, returning hex string with prefix
///
/// # Returns
/// * String in format "sha256:abc123..."
pub fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!("sha256:{}", hex::encode(result))
}

/// Compute deterministic citation ID
///
/// sha256(type + start + end + raw_text)[0:16]. The same text always
/// yields the same IDs, which keeps repeated extraction identical.
pub fn compute_citation_id(
    citation_type: CitationType,
    start: usize,
    end: usize,
    raw_text: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(citation_type.as_str().as_bytes());
    hasher.update(start.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(end.to_string().as_bytes());
    hasher.update(raw_text.as_bytes());

    let result = hasher.finalize();
    hex::encode(&result[..8]) // 16 hex chars = 8 bytes
}

/// Compute deterministic claim ID
pub fn compute_claim_id(start: usize, end: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"claim");
    hasher.update(start.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(end.to_string().as_bytes());
    hasher.update(compute_hash(text.as_bytes()).as_bytes());

    let result = hasher.finalize();
    hex::encode(&result[..8])
}

/// A footnote marker found in the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FootnoteMarker {
    pub number: u32,
    pub start: usize,
    pub end: usize,
}

/// Find footnote markers: `[n]` anywhere, `n.` or `n` at the start of a line
///
/// Markers that fall inside one of `exclude` (citation spans) are ignored,
/// so `347 U.S. 483` never reads as a footnote.
pub fn find_footnote_markers(text: &str, exclude: &[(usize, usize)]) -> Vec<FootnoteMarker> {
    let bytes = text.as_bytes();
    let mut markers = Vec::new();
    let mut line_start = true;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if b == b'[' {
            if let Some(len) = bytes[i + 1..].iter().position(|&c| c == b']') {
                let content = &text[i + 1..i + 1 + len];
                if is_marker_number(content) {
                    push_marker(&mut markers, content, i, i + len + 2, exclude);
                    i += len + 2;
                    line_start = false;
                    continue;
                }
            }
        }

        if line_start && b.is_ascii_digit() {
            let digits = bytes[i..].iter().take_while(|c| c.is_ascii_digit()).count();
            let mut end = i + digits;
            if end < bytes.len() && bytes[end] == b'.' {
                end += 1;
            }
            // Marker must be followed by space and then the footnote body
            let followed_by_text = end < bytes.len()
                && (bytes[end] == b' ' || bytes[end] == b'\t')
                && bytes[end..]
                    .iter()
                    .find(|c| !c.is_ascii_whitespace())
                    .map(|c| !c.is_ascii_digit())
                    .unwrap_or(false);
            if digits <= 3 && followed_by_text {
                push_marker(&mut markers, &text[i..i + digits], i, end, exclude);
            }
            i = end;
            line_start = false;
            continue;
        }

        if b == b'\n' {
            line_start = true;
        } else if !(b == b' ' || b == b'\t' || b == b'\r') {
            line_start = false;
        }
        i += 1;
    }

    markers
}

fn push_marker(
    markers: &mut Vec<FootnoteMarker>,
    digits: &str,
    start: usize,
    end: usize,
    exclude: &[(usize, usize)],
) {
    if exclude.iter().any(|&(s, e)| start < e && s < end) {
        return;
    }
    if let Ok(number) = digits.parse::<u32>() {
        if number > 0 {
            markers.push(FootnoteMarker { number, start, end });
        }
    }
}

fn is_marker_number(s: &str) -> bool {
    !s.is_empty() && s.len() <= 3 && s.chars().all(|c| c.is_ascii_digit())
}

/// Footnote number of the nearest marker at or before `offset`
pub fn footnote_at(markers: &[FootnoteMarker], offset: usize) -> Option<u32> {
    markers
        .iter()
        .take_while(|m| m.start <= offset)
        .last()
        .map(|m| m.number)
}

/// Extract anchor text around a span
///
/// Returns about `window` characters of context around the span, with
/// ellipses where the context was cut.
pub fn extract_anchor_text(text: &str, start: usize, end: usize, window: usize) -> String {
    let bytes = text.as_bytes();

    let span_len = end.saturating_sub(start);
    let remaining = window.saturating_sub(span_len);
    let each_side = remaining / 2;

    let mut anchor_start = start.saturating_sub(each_side);
    while anchor_start > 0 && !text.is_char_boundary(anchor_start) {
        anchor_start -= 1;
    }

    let mut anchor_end = (end + each_side).min(bytes.len());
    while anchor_end < bytes.len() && !text.is_char_boundary(anchor_end) {
        anchor_end += 1;
    }

    let anchor = text[anchor_start..anchor_end].replace('\n', " ");

    let prefix = if anchor_start > 0 { "..." } else { "" };
    let suffix = if anchor_end < bytes.len() { "..." } else { "" };

    format!("{}{}{}", prefix, anchor, suffix)
}

/// Line and column position (1-indexed for editor compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub col: usize,
}

/// Convert byte offset to line/column position
///
/// Column counts characters, not bytes.
pub fn offset_to_line_col(text: &str, offset: usize) -> LineCol {
    let mut offset = offset.min(text.len());
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    let prefix = &text[..offset];

    let line = prefix.matches('\n').count() + 1;
    let line_start = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let col = text[line_start..offset].chars().count() + 1;

    LineCol { line, col }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_hash() {
        let hash = compute_hash(b"hello");
        assert!(hash.starts_with("sha256:"));
        assert_eq!(hash.len(), 7 + 64);
    }

    #[test]
    fn test_citation_id_deterministic() {
        let id1 = compute_citation_id(CitationType::Case, 4, 30, "Brown v. Board");
        let id2 = compute_citation_id(CitationType::Case, 4, 30, "Brown v. Board");
        assert_eq!(id1, id2);
        assert_eq!(id1.len(), 16);
    }

    #[test]
    fn test_citation_id_differs_by_span() {
        let id1 = compute_citation_id(CitationType::Case, 4, 30, "Brown v. Board");
        let id2 = compute_citation_id(CitationType::Case, 40, 66, "Brown v. Board");
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_bracket_markers() {
        let text = "First point.[1] Second point.[2]";
        let markers = find_footnote_markers(text, &[]);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].number, 1);
        assert_eq!(markers[1].number, 2);
        assert_eq!(footnote_at(&markers, 20), Some(1));
        assert_eq!(footnote_at(&markers, 5), None);
    }

    #[test]
    fn test_line_start_markers() {
        let text = "Body text.\n1. See Brown v. Board.\n2 Id. at 495.";
        let markers = find_footnote_markers(text, &[]);
        let numbers: Vec<u32> = markers.iter().map(|m| m.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_markers_inside_spans_ignored() {
        let text = "347 U.S. 483";
        assert!(find_footnote_markers(text, &[(0, text.len())]).is_empty());
    }

    #[test]
    fn test_offset_to_line_col() {
        let text = "line1\nline2\nline3";

        let pos = offset_to_line_col(text, 0);
        assert_eq!((pos.line, pos.col), (1, 1));

        let pos = offset_to_line_col(text, 8);
        assert_eq!((pos.line, pos.col), (2, 3));
    }

    #[test]
    fn test_extract_anchor_text() {
        let text = "This is a long document with many words and content for testing.";
        let anchor = extract_anchor_text(text, 10, 20, 40);
        assert!(anchor.len() <= 50);
        assert!(anchor.contains("long doc"));
    }
}
