use std::path::{Path, PathBuf};

use yaml_comments::{AnnotatedTree, parse_stream, parse_tree, render};
use yaml_comments_test_harness::{FixtureConfig, collect_cases, run_fixture_dir};

/// Fixtures whose output is known to differ from the expectation.
const KNOWN_FAILURES: &[(&str, &str, &str)] = &[];

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[test]
fn emitter_with_comments() {
    let dir = fixtures_dir();
    let config = FixtureConfig {
        fixtures_dir: &dir,
        expected_suffix: "-out.yml",
        known_failures: KNOWN_FAILURES,
    };
    run_fixture_dir(&config, "emitter", |input| {
        Some(parse_stream(input).and_then(|annotated| render(&annotated)))
    });
}

#[test]
fn emitter_without_comments() {
    let dir = fixtures_dir();
    let config = FixtureConfig {
        fixtures_dir: &dir,
        expected_suffix: "-out-wc.yml",
        known_failures: KNOWN_FAILURES,
    };
    run_fixture_dir(&config, "emitter", |input| {
        Some(parse_tree(input).and_then(|tree| render(&AnnotatedTree::bare(tree))))
    });
}

#[test]
fn rendered_fixtures_render_to_themselves() -> anyhow::Result<()> {
    for case in collect_cases(&fixtures_dir().join("emitter"), "-out.yml") {
        let Some(expected) = case.expected else {
            continue;
        };
        let again = render(&parse_stream(&expected)?)?;
        pretty_assertions::assert_eq!(again, expected, "{}", case.name);
    }
    Ok(())
}
