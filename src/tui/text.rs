//! Display-width helpers for stage output.
//!
//! Stage output is arbitrary text: tabs, carriage returns, escape bytes,
//! wide characters. Everything that reaches a panel goes through here first
//! so what ratatui measures is what the terminal shows.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Tab stops every 8 columns, like a terminal.
pub const TAB_WIDTH: usize = 8;

/// Display width of a string in terminal columns.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Expand tabs to spaces and drop other control characters.
pub fn sanitize(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut col = 0usize;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = TAB_WIDTH - col % TAB_WIDTH;
            out.extend(std::iter::repeat(' ').take(pad));
            col += pad;
        } else if ch.is_control() {
            continue;
        } else {
            out.push(ch);
            col += ch.width().unwrap_or(0);
        }
    }
    out
}

/// Clip to `max_width` columns, marking the cut with `…`.
pub fn clip(s: &str, max_width: usize) -> String {
    if display_width(s) <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let budget = max_width - 1;
    let mut out = String::new();
    let mut col = 0usize;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if col + w > budget {
            break;
        }
        out.push(ch);
        col += w;
    }
    out.push('…');
    out
}
