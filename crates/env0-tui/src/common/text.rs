//! Text utilities for TUI rendering.

use std::borrow::Cow;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Sanitizes a line for display by removing escape bytes and expanding tabs.
///
/// Backend output may carry raw ANSI sequences; dropping `\x1b` breaks them
/// up so they render as plain text instead of driving the terminal. Tabs
/// are expanded to four spaces since `unicode_width` reports them as zero
/// columns.
pub fn sanitize_for_display(s: &str) -> Cow<'_, str> {
    if s.contains('\x1b') || s.contains('\t') || s.contains('\r') {
        Cow::Owned(
            s.replace('\x1b', "")
                .replace('\t', "    ")
                .replace('\r', ""),
        )
    } else {
        Cow::Borrowed(s)
    }
}

/// Wraps `text` into rows no wider than `width` columns.
///
/// Breaks at the last whitespace on the row when there is one, otherwise
/// mid-word. Grapheme clusters are never split. An empty input yields a
/// single empty row so every line occupies at least one row.
pub fn wrap_line(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    if text.width() <= width {
        return vec![text.to_string()];
    }

    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_width = 0;
    // Byte index in `row` just after the last whitespace grapheme.
    let mut break_at: Option<usize> = None;

    for grapheme in text.graphemes(true) {
        let grapheme_width = grapheme.width();
        if row_width + grapheme_width > width && !row.is_empty() {
            let rest = match break_at.take() {
                Some(at) if at < row.len() => row.split_off(at),
                _ => String::new(),
            };
            rows.push(row.trim_end().to_string());
            row = rest;
            row_width = row.width();
        }
        row.push_str(grapheme);
        row_width += grapheme_width;
        if grapheme.chars().all(char::is_whitespace) {
            break_at = Some(row.len());
        }
    }
    rows.push(row);
    rows
}
