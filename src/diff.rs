//! Presents a candidate's edit as a unified diff against its unmodified
//! source, for reporting a [`crate::error::RepairOutcome::Repaired`]
//! result back to a caller.

use similar::{ChangeTag, TextDiff};

/// Renders a unified-diff-style string between `original` and `patched`.
/// Context lines are unprefixed, removed lines are prefixed `-`, added
/// lines `+` — the same three-way tagging `similar`'s `ChangeTag` exposes.
pub fn render_unified_diff(file_label: &str, original: &str, patched: &str) -> String {
    let diff = TextDiff::from_lines(original, patched);
    let mut out = format!("--- {file_label}\n+++ {file_label}\n");
    for change in diff.iter_all_changes() {
        let prefix = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        out.push_str(prefix);
        out.push_str(change.as_str().unwrap_or(""));
        if !change.as_str().unwrap_or("").ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_additions_and_removals_with_unified_markers() {
        let original = "x = 1\ny = 2\n";
        let patched = "x = 1\ny = 3\n";
        let diff = render_unified_diff("a.mini", original, patched);
        assert!(diff.contains("-y = 2"));
        assert!(diff.contains("+y = 3"));
        assert!(diff.contains(" x = 1"));
    }

    #[test]
    fn identical_text_produces_only_context_lines() {
        let text = "x = 1\ny = 2\n";
        let diff = render_unified_diff("a.mini", text, text);
        let body = diff.lines().skip(2).collect::<Vec<_>>().join("\n");
        assert!(body.lines().all(|line| line.starts_with(' ')));
    }
}
