use similar::{ChangeTag, TextDiff};

/// Unified diff from `original` to `rendered` with three lines of context,
/// preceded by a one-line change summary.
pub fn unified(path: &str, original: &str, rendered: &str) -> String {
    let diff = TextDiff::from_lines(original, rendered);
    let (mut added, mut removed) = (0usize, 0usize);
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => removed += 1,
            ChangeTag::Equal => {}
        }
    }
    let body = diff
        .unified_diff()
        .context_radius(3)
        .header(path, &format!("{path} (round trip)"))
        .to_string();
    format!("{path}: {}\n{body}", summary(added, removed))
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "line" } else { "lines" }
}

fn summary(added: usize, removed: usize) -> String {
    if added == removed {
        format!("changed {added} {}", plural(added))
    } else {
        format!(
            "added {added} {}, removed {removed} {}",
            plural(added),
            plural(removed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_has_summary_header_and_hunk() {
        let out = unified("a.yml", "a:\n  - x\n", "a:\n- x\n");
        assert!(out.starts_with("a.yml: changed 1 line\n"), "{out}");
        assert!(out.contains("--- a.yml\n+++ a.yml (round trip)\n"), "{out}");
        assert!(out.contains("@@ -1,2 +1,2 @@\n a:\n-  - x\n+- x\n"), "{out}");
    }

    #[test]
    fn summary_counts() {
        assert_eq!(summary(2, 2), "changed 2 lines");
        assert_eq!(summary(1, 0), "added 1 line, removed 0 lines");
    }
}
