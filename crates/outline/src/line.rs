//! Markup sniffing for a single line of generated text.

use serde::Serialize;

/// Hierarchy class of a line, decided by its leading markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// `**Title**`
    Topic,
    /// `*Title*` or any other line starting with a single `*`.
    Subtopic,
    /// Anything else.
    Detail,
}

/// A classified, non-empty line with its markup removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub title: String,
}

/// Classify one line. Returns `None` for blank lines and for lines whose
/// title is empty once the markup is stripped (e.g. `****`).
pub fn classify(raw: &str) -> Option<Line> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (kind, title) = if is_bold(trimmed) {
        (LineKind::Topic, strip_stars(trimmed))
    } else if trimmed.starts_with('*') {
        (LineKind::Subtopic, strip_stars(trimmed))
    } else {
        let detail = trimmed.strip_prefix('-').unwrap_or(trimmed).trim();
        (LineKind::Detail, detail.to_string())
    };

    if title.is_empty() {
        return None;
    }
    Some(Line { kind, title })
}

fn is_bold(line: &str) -> bool {
    line.len() > 4 && line.starts_with("**") && line.ends_with("**")
}

/// Drop the outer asterisks and any bold pairs left inside the title.
fn strip_stars(line: &str) -> String {
    line.trim_matches('*').replace("**", "").trim().to_string()
}
