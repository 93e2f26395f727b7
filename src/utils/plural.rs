//! Counted nouns for log lines.

/// `1 file`, `0 files`, `3 changes`.
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
