use regex::Regex;
use regex_clippy::lint::RuleRegistry;
use regex_clippy::parser::parse_regex;
use regex_clippy::{apply_finding, create_default_engine};

fn full_match(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{pattern})$")).expect("pattern should compile")
}

fn fold(source: &str) -> Option<String> {
    create_default_engine()
        .fold_source(source)
        .expect("pattern should parse")
}

#[test]
fn folded_pattern_accepts_the_same_strings() {
    let cases = [
        ("xabababy", "x(?:ab){3}y"),
        ("(?:ab)+ab", "(?:ab){2,}"),
        ("ab(?:ab)*", "(?:ab)+"),
        ("\\d\\d:\\d\\d:", "(?:\\d\\d:){2}"),
    ];
    let samples = [
        "", "xy", "xaby", "xababy", "xabababy", "xababababy", "ab", "abab", "ababab", "12:34:",
        "12:", "12:34",
    ];

    for (source, expected) in cases {
        let folded = fold(source).unwrap_or_else(|| panic!("{source:?} should fold"));
        assert_eq!(folded, expected);

        let before = full_match(source);
        let after = full_match(&folded);
        for sample in samples {
            assert_eq!(
                before.is_match(sample),
                after.is_match(sample),
                "{source:?} and {folded:?} disagree on {sample:?}"
            );
        }
    }
}

#[test]
fn branch_order_does_not_hide_a_run() {
    assert_eq!(fold("(?:a|b)x(?:b|a)x").as_deref(), Some("(?:[ab]x){2}"));
}

#[test]
fn nested_counts_are_multiplied_before_summing() {
    assert_eq!(fold("(?:(?:ab){2}){2,3}ab").as_deref(), Some("(?:ab){5,7}"));
    assert_eq!(fold("(?:(?:ab){2}){3}ab").as_deref(), Some("(?:ab){7}"));
}

#[test]
fn nothing_to_fold() {
    assert_eq!(fold("abc"), None);
    assert_eq!(fold("a+b+"), None);
}

#[test]
fn fold_runs_as_a_preview_tip() {
    let registry = RuleRegistry::default_rules();
    let rule = registry
        .find("common_subexpression")
        .expect("rule should be registered");
    let tree = parse_regex("(?:xy){2}xy").unwrap();
    let finding = rule.detect(&tree).expect("run should be found");
    assert_eq!(finding.span.first(), 0);

    let fixed = apply_finding(&tree, "common_subexpression", &finding).unwrap();
    assert_eq!(fixed.as_deref(), Some("(?:xy){3}"));
}
