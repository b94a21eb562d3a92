//! Stitching per-chunk generations back into one text.

use std::collections::HashSet;

/// Extra filtering applied on top of the always-on dedupe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Drop lines starting with a Markdown heading marker (`#`).
    pub strip_headings: bool,
}

/// Join `results` in order and keep each distinct non-empty line once, at
/// the position of its first occurrence. Lines are compared after trimming.
pub fn aggregate<S: AsRef<str>>(results: &[S], options: AggregateOptions) -> String {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut kept: Vec<&str> = Vec::new();

    for line in results.iter().flat_map(|r| r.as_ref().lines()) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if options.strip_headings && line.starts_with('#') {
            continue;
        }
        if seen.insert(line) {
            kept.push(line);
        }
    }

    kept.join("\n")
}
