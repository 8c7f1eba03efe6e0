use core::fmt::Display;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Input files end with this suffix; the expected output replaces it.
pub const INPUT_SUFFIX: &str = "-in.yml";

/// Environment variable that makes [`run_fixture_dir`] rewrite expected
/// outputs instead of comparing against them.
pub const UPDATE_ENV: &str = "UPDATE_FIXTURES";

/// One `<name>-in.yml` file and its expected output.
pub struct FixtureCase {
    /// File name without the input suffix, e.g. `flow-mapping`.
    pub name: String,
    pub input: String,
    pub expected_path: PathBuf,
    /// `None` if the expected-output file does not exist yet.
    pub expected: Option<String>,
}

/// Collect the fixture cases in `dir`, sorted by name.
///
/// `expected_suffix` names the expected-output file, e.g. `-out.yml` turns
/// `a-in.yml` into `a-out.yml`.
///
/// # Panics
///
/// Panics if `dir` or one of its input files cannot be read.
pub fn collect_cases(dir: &Path, expected_suffix: &str) -> Vec<FixtureCase> {
    let entries = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", dir.display()));

    let mut cases: Vec<FixtureCase> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let file_name = entry.file_name().into_string().ok()?;
            let name = file_name.strip_suffix(INPUT_SUFFIX)?.to_string();
            let input_path = entry.path();
            let input = std::fs::read_to_string(&input_path)
                .unwrap_or_else(|e| panic!("Failed to read {}: {e}", input_path.display()));
            let expected_path = dir.join(format!("{name}{expected_suffix}"));
            let expected = std::fs::read_to_string(&expected_path).ok();
            Some(FixtureCase {
                name,
                input,
                expected_path,
                expected,
            })
        })
        .collect();
    cases.sort_by(|a, b| a.name.cmp(&b.name));
    cases
}

/// Configuration for running a fixture directory.
pub struct FixtureConfig<'a> {
    /// Root path to the test fixtures (typically
    /// `Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")`).
    pub fixtures_dir: &'a Path,
    /// Suffix of the expected-output files (e.g. `"-out.yml"`).
    pub expected_suffix: &'a str,
    /// Slice of `(dir, case_name, reason)` tuples for expected failures.
    /// Only entries matching the current `dir` are used.
    pub known_failures: &'a [(&'a str, &'a str, &'a str)],
}

/// Run every fixture in a directory through `render_fn`, tracking known
/// failures.
///
/// The `render_fn` closure receives the input text and returns:
/// - `None` to skip the case
/// - `Some(Ok(output))` to compare against the expected output
/// - `Some(Err(e))` for a rendering error (counts as failure)
///
/// With `UPDATE_FIXTURES=1` in the environment, every rendered output is
/// written to its expected-output file and nothing is asserted.
///
/// # Panics
///
/// Panics if there are unexpected failures (not in `known_failures`) or
/// stale exclusions (in `known_failures` but now passing).
pub fn run_fixture_dir<F, E>(config: &FixtureConfig<'_>, dir: &str, render_fn: F)
where
    F: Fn(&str) -> Option<Result<String, E>>,
    E: Display,
{
    let cases = collect_cases(&config.fixtures_dir.join(dir), config.expected_suffix);
    assert!(!cases.is_empty(), "No fixtures found in {dir}");

    if std::env::var(UPDATE_ENV).is_ok_and(|v| v == "1" || v == "true") {
        update_expectations(dir, &cases, render_fn);
        return;
    }

    let known: HashSet<&str> = config
        .known_failures
        .iter()
        .filter(|(d, _, _)| *d == dir)
        .map(|(_, name, _)| *name)
        .collect();

    let mut counts = Counts::default();
    let mut unexpected: Vec<(String, String, String)> = Vec::new();
    let mut stale: Vec<String> = Vec::new();

    for case in &cases {
        let Some(result) = render_fn(&case.input) else {
            counts.skipped += 1;
            continue;
        };
        let expected = case.expected.as_deref().unwrap_or_default();

        let is_known = known.contains(case.name.as_str());
        let matches = case.expected.is_some() && result.as_ref().is_ok_and(|a| a == expected);

        if matches {
            counts.passed += 1;
            if is_known {
                stale.push(case.name.clone());
            }
        } else if is_known {
            counts.expected += 1;
        } else {
            counts.failed += 1;
            if unexpected.len() < 20 {
                let actual = match (&case.expected, result) {
                    (None, _) => format!("MISSING: {}", case.expected_path.display()),
                    (Some(_), Ok(actual)) => actual,
                    (Some(_), Err(e)) => format!("ERROR: {e}"),
                };
                unexpected.push((case.name.clone(), expected.to_string(), actual));
            }
        }
    }

    let total = counts.passed + counts.failed + counts.expected;
    eprintln!(
        "{dir} ({}): {}/{total} passed ({} known, {} unexpected, {} skipped)",
        config.expected_suffix, counts.passed, counts.expected, counts.failed, counts.skipped
    );
    print_failures(dir, &unexpected, &stale);

    assert!(
        unexpected.is_empty(),
        "{dir}: {} unexpected failure(s) - add to KNOWN_FAILURES, fix the emitter, or rerun with {UPDATE_ENV}=1",
        counts.failed
    );
    assert!(
        stale.is_empty(),
        "{dir}: {} stale exclusion(s) - remove from KNOWN_FAILURES",
        stale.len()
    );
}

fn update_expectations<F, E>(dir: &str, cases: &[FixtureCase], render_fn: F)
where
    F: Fn(&str) -> Option<Result<String, E>>,
    E: Display,
{
    for case in cases {
        match render_fn(&case.input) {
            Some(Ok(output)) => {
                std::fs::write(&case.expected_path, output).unwrap_or_else(|e| {
                    panic!("Failed to write {}: {e}", case.expected_path.display())
                });
            }
            Some(Err(e)) => eprintln!("{dir}/{}: not updated: {e}", case.name),
            None => {}
        }
    }
    eprintln!("{dir}: updated {} fixture(s)", cases.len());
}

#[derive(Default)]
struct Counts {
    passed: usize,
    failed: usize,
    skipped: usize,
    expected: usize,
}

fn print_failures(dir: &str, unexpected: &[(String, String, String)], stale: &[String]) {
    if !unexpected.is_empty() {
        eprintln!("\n  Unexpected failures in {dir}:");
        for (name, expected, actual) in unexpected {
            eprintln!("\n  --- {name} ---");
            if actual.starts_with("ERROR:") || actual.starts_with("MISSING:") {
                eprintln!("  {actual}");
            } else {
                for diff in diff_lines(expected, actual) {
                    eprintln!("  {diff}");
                }
            }
        }
        eprintln!();
    }
    if !stale.is_empty() {
        eprintln!("\n  Stale exclusions in {dir} (fixtures now pass, remove from KNOWN_FAILURES):");
        for name in stale {
            eprintln!("  - {name}");
        }
        eprintln!();
    }
}

/// Simple line-by-line diff for readable failure output.
///
/// Whitespace-only differences are easy to miss, so trailing spaces are
/// shown as `·`.
fn diff_lines(expected: &str, actual: &str) -> Vec<String> {
    let expected_lines: Vec<&str> = expected.lines().collect();
    let actual_lines: Vec<&str> = actual.lines().collect();
    let mut output = Vec::new();
    let max = expected_lines.len().max(actual_lines.len());

    for i in 0..max {
        let exp = expected_lines.get(i).copied().map(visible);
        let act = actual_lines.get(i).copied().map(visible);
        match (exp, act) {
            (Some(e), Some(a)) if e == a => {
                output.push(format!(" {e}"));
            }
            (Some(e), Some(a)) => {
                output.push(format!("-{e}"));
                output.push(format!("+{a}"));
            }
            (Some(e), None) => {
                output.push(format!("-{e}"));
            }
            (None, Some(a)) => {
                output.push(format!("+{a}"));
            }
            (None, None) => {}
        }
    }

    if expected.ends_with('\n') != actual.ends_with('\n') {
        output.push("  (final line break differs)".to_string());
    }
    if output.len() > 30 {
        output.truncate(30);
        output.push("  ... (diff truncated)".to_string());
    }

    output
}

fn visible(line: &str) -> String {
    let trimmed = line.trim_end_matches(' ');
    let spaces = line.len() - trimmed.len();
    format!("{trimmed}{}", "·".repeat(spaces))
}
