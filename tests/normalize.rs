use regex::Regex;
use regex_clippy::LintEngine;
use regex_clippy::lint::{LintSettings, RuleRegistry};
use regex_clippy::normalize::{NormalizeReport, Normalizer, normalize};
use regex_clippy::parser::parse_regex;

const CORPUS: &[&str] = &[
    "a{1,1}",
    "a^^b",
    "(?:)a",
    "c|b|a",
    "(?:foo|bar)+",
    "(b)|(a)\\2",
    "x(?:(?:a+)*)y",
    "(?:a{2}){3}",
    "[x](?:y|)z",
    "(?:a|b|)c",
    "\\d{2}-(?:\\d{2})",
    "(?:ab){2}ab",
];

const SAMPLES: &[&str] = &[
    "", "a", "aa", "ab", "abab", "ababab", "b", "c", "ba", "foo", "barfoo", "xy", "xaaay", "aaaaaa",
    "xyz", "xz", "ac", "bc", "c", "12-34", "123-4",
];

fn norm(source: &str) -> String {
    normalize(parse_regex(source).expect("pattern should parse")).render()
}

fn full_match(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{pattern})$")).expect("pattern should compile")
}

#[test]
fn normalizing_twice_changes_nothing() {
    for source in CORPUS {
        let once = norm(source);
        assert_eq!(norm(&once), once, "normalizing {source:?} is not idempotent");
    }
}

#[test]
fn normal_form_accepts_the_same_strings() {
    // The regex crate has no backreferences.
    for source in CORPUS.iter().filter(|s| !s.contains("\\2")) {
        let original = full_match(source);
        let normalized = full_match(&norm(source));
        for sample in SAMPLES {
            assert_eq!(
                original.is_match(sample),
                normalized.is_match(sample),
                "{source:?} and {:?} disagree on {sample:?}",
                norm(source)
            );
        }
    }
}

#[test]
fn alternation_order_is_canonical() {
    assert_eq!(norm("cat|dog"), norm("dog|cat"));
    assert_eq!(norm("x(?:cat|dog)"), norm("x(?:dog|cat)"));
    assert_eq!(norm("a|b"), norm("b|a"));
    assert_eq!(norm("x(?:b|a)y"), "x[ab]y");
}

#[test]
fn captures_are_renumbered_after_sorting() {
    assert_eq!(norm("(y)|(x)"), "(x)|(y)");
    let tree = normalize(parse_regex("(yy)|(xx)").unwrap());
    let first = tree.capture_node(1).expect("capture 1 should exist");
    assert_eq!(tree.render_node(first), "(xx)");
}

#[test]
fn nested_quantifiers_merge_only_when_contiguous() {
    assert_eq!(norm("(?:a{2}){3}"), "a{6}");
    assert_eq!(norm("(?:a{1,2})+"), "a+");
    assert_eq!(norm("(?:a{2,3})*"), "(?:a{2,3})*");
    assert_eq!(norm("(?:a{2}){2,3}"), "(?:a{2}){2,3}");
}

#[test]
fn nested_quantifiers_multiply_their_bounds() {
    assert_eq!(norm("(?:a{1,3}){2,4}"), "a{2,12}");
    assert_eq!(norm("(?:a+)?"), "a*");
    assert_eq!(norm("(?:a*){3}"), "(?:a*){3}");

    let samples = ["", "a", "aa", "aaa", "aaaaaaaaaaaa", "aaaaaaaaaaaaa"];
    for (source, merged) in [("(?:a{1,3}){2,4}", "a{2,12}"), ("(?:a+)?", "a*")] {
        let before = Regex::new(&format!("^(?:{source})$")).unwrap();
        let after = Regex::new(&format!("^(?:{merged})$")).unwrap();
        for sample in samples {
            assert_eq!(before.is_match(sample), after.is_match(sample), "{source} on {sample:?}");
        }
    }
}

#[test]
fn zero_repetition_collapses_unless_a_capture_is_referenced() {
    assert_eq!(norm("x(?:a+){0}y"), "xy");
    assert_eq!(norm("x(?:(a)?){0}y"), "xy");
    assert_eq!(norm("(?:(a)?){0}(b)\\2"), "(b)\\1");
}

#[test]
fn every_rule_reaches_a_fixpoint() {
    let normalizer = Normalizer::default();
    let registry = RuleRegistry::default_rules();
    for source in CORPUS {
        for rule in registry.rules() {
            let mut tree = parse_regex(source).unwrap();
            let mut report = NormalizeReport::default();
            normalizer.run_rule(&mut tree, rule, &mut report);
            assert!(
                report.non_converged.is_empty(),
                "{} did not converge on {source:?}",
                rule.descriptor().name
            );
        }
    }
}

#[test]
fn engine_uses_configured_settings() {
    let settings = LintSettings {
        strip_captures: true,
        ..LintSettings::default()
    };
    let engine = LintEngine::new_with_settings(RuleRegistry::new(), settings);
    let normalized = engine.normalize_source("(a)(b)\\2").unwrap();
    assert_eq!(normalized.render(), "a(b)\\1");
    assert!(normalized.report.converged);
}
