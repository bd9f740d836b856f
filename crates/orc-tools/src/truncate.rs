// SPDX-License-Identifier: MIT
use crate::tool::OutputCategory;

const HEAD_LINES: usize = 60;
const TAIL_LINES: usize = 40;
const TRUNCATION_MARKER: &str = "\n... [content truncated] ...\n";

/// Bounds a tool result to `max_bytes`, picking the extraction strategy from
/// `category` so the part of the output most useful to the model survives.
pub fn smart_truncate(text: &str, category: OutputCategory, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    match category {
        OutputCategory::Generic => truncate_at_boundary(text, max_bytes),
        OutputCategory::HeadTail | OutputCategory::FileContent => {
            head_tail_truncate(text, max_bytes, HEAD_LINES, TAIL_LINES)
        }
        OutputCategory::MatchList => truncate_lines_from_start(text, max_bytes),
    }
}

/// Hard-truncates at the last word or sentence boundary before `max_bytes`.
fn truncate_at_boundary(text: &str, max_bytes: usize) -> String {
    let budget = max_bytes.saturating_sub(TRUNCATION_MARKER.len());
    let mut cut = budget.min(text.len());
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let slice = &text[..cut];
    let boundary = slice
        .rfind(['.', '!', '?', '\n'])
        .map(|i| i + 1)
        .or_else(|| slice.rfind(' '))
        .unwrap_or(cut);
    format!("{}{}", &text[..boundary], TRUNCATION_MARKER)
}

/// Keeps `head_lines` from the start and `tail_lines` from the end, dropping
/// the middle. Suitable for terminal/process output and file reads where
/// both the preamble and the conclusion matter.
fn head_tail_truncate(text: &str, max_bytes: usize, head_lines: usize, tail_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= head_lines + tail_lines {
        return truncate_at_boundary(text, max_bytes);
    }
    let head = lines[..head_lines].join("\n");
    let tail = lines[lines.len() - tail_lines..].join("\n");
    let combined = format!("{}{}{}", head, TRUNCATION_MARKER, tail);
    if combined.len() > max_bytes {
        truncate_at_boundary(&combined, max_bytes)
    } else {
        combined
    }
}

/// Keeps leading lines, for output that is itself an ordered list of matches.
fn truncate_lines_from_start(text: &str, max_bytes: usize) -> String {
    let budget = max_bytes.saturating_sub(TRUNCATION_MARKER.len());
    let mut out = String::new();
    for line in text.lines() {
        if out.len() + line.len() + 1 > budget {
            break;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(TRUNCATION_MARKER);
    out
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
