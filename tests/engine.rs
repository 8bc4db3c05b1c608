use insta::assert_snapshot;
use itertools::Itertools;
use regex_clippy::diagnostics::Report;
use regex_clippy::error::RegexClippyError;
use regex_clippy::lint::RuleRegistry;
use regex_clippy::parser::parse_regex;
use regex_clippy::{LintEngine, apply_finding, create_default_engine};

fn format_report(report: &Report) -> String {
    report
        .entries()
        .map(|(category, e)| {
            format!(
                "{}:{}:{}..{}:{}",
                category.as_str(),
                e.problem_type,
                e.span[0],
                e.span[1],
                e.affected_node_ids.iter().join(",")
            )
        })
        .join("\n")
}

fn check(source: &str) -> String {
    let report = create_default_engine()
        .lint_source(source)
        .expect("linting should succeed");
    format_report(&report)
}

#[test]
fn doubled_circumflex() {
    assert_snapshot!(check("a^^b"), @r###"
    error:useless_circumflex_assertion:1..1:#1
    error:useless_circumflex_assertion:2..2:#2
    equivalence:repeated_assertions:2..2:#2
    "###);
}

#[test]
fn empty_group_before_literal() {
    assert_snapshot!(check("(?:)a"), @"equivalence:empty_grouping:0..3:#1");
}

#[test]
fn braced_single_repetition() {
    assert_snapshot!(check("a{1,1}"), @"equivalence:trivial_quantifier:0..5:#1");
}

#[test]
fn clean_pattern_has_no_findings() {
    assert_snapshot!(check("ab+c"), @"");
}

#[test]
fn json_report_shape() {
    let report = create_default_engine()
        .lint_source("x{1}")
        .expect("linting should succeed");
    let json = serde_json::to_string_pretty(&report).expect("report should serialize");
    assert_snapshot!(json, @r###"
    {
      "errors": [],
      "tips": [],
      "equivalences": [
        {
          "problem": "trivial_quantifier.problem",
          "solve": "trivial_quantifier.solve",
          "problem_type": "trivial_quantifier",
          "affected_node_ids": [
            1
          ],
          "span": [
            0,
            3
          ]
        }
      ]
    }
    "###);
}

#[test]
fn preview_rules_need_opt_in() {
    let none: Vec<String> = Vec::new();
    let stable = RuleRegistry::default_rules_filtered(&none, &none, &none, false).unwrap();
    let engine = LintEngine::new(stable);
    let report = engine.lint_source("(a)").unwrap();
    assert!(!report.problem_types().contains(&"useless_subpattern"));

    let only = vec!["useless_subpattern".to_string()];
    let named = RuleRegistry::default_rules_filtered(&only, &none, &none, false).unwrap();
    let report = LintEngine::new(named).lint_source("(a)").unwrap();
    assert_eq!(report.problem_types(), vec!["useless_subpattern"]);
}

#[test]
fn unknown_rule_names_are_rejected() {
    let bogus = vec!["not_a_rule".to_string()];
    let none: Vec<String> = Vec::new();
    let result = RuleRegistry::default_rules_filtered(&bogus, &none, &none, false);
    assert!(matches!(result, Err(RegexClippyError::UnknownRule(name)) if name == "not_a_rule"));
}

#[test]
fn parse_errors_surface() {
    let err = create_default_engine().lint_source("a**").unwrap_err();
    assert!(matches!(err, RegexClippyError::Parse(_)));
}

#[test]
fn apply_finding_rewrites_a_copy() {
    let tree = parse_regex("a^^b").unwrap();
    let registry = RuleRegistry::default_rules();
    let rule = registry.find("repeated_assertions").unwrap();
    let finding = rule.detect(&tree).unwrap();

    let fixed = apply_finding(&tree, "repeated_assertions", &finding).unwrap();
    assert_eq!(fixed.as_deref(), Some("a^b"));
    assert_eq!(tree.render(), "a^^b");
}

#[test]
fn apply_finding_without_rewrite_is_none() {
    let tree = parse_regex("a*").unwrap();
    let registry = RuleRegistry::default_rules();
    let finding = registry.find("nullable_regex").unwrap().detect(&tree).unwrap();
    assert_eq!(apply_finding(&tree, "nullable_regex", &finding).unwrap(), None);
}

#[test]
fn apply_finding_that_empties_the_pattern_is_none() {
    let tree = parse_regex("(?:)").unwrap();
    let registry = RuleRegistry::default_rules();
    let finding = registry.find("empty_grouping").unwrap().detect(&tree).unwrap();
    assert_eq!(apply_finding(&tree, "empty_grouping", &finding).unwrap(), None);
}

#[test]
fn stale_finding_is_an_error() {
    let tree = parse_regex("a{1}b{1}").unwrap();
    let registry = RuleRegistry::default_rules();
    let finding = registry
        .find("trivial_quantifier")
        .unwrap()
        .detect(&tree)
        .unwrap();

    let other = parse_regex("ab").unwrap();
    let err = apply_finding(&other, "trivial_quantifier", &finding).unwrap_err();
    assert!(matches!(err, RegexClippyError::StaleFinding { .. }));
}

#[test]
fn report_order_follows_registry() {
    let report = create_default_engine().lint_source("(a)(?:b){1}").unwrap();
    assert_eq!(
        report.problem_types(),
        vec!["subpattern_without_backref", "useless_grouping", "trivial_quantifier"]
    );
}
