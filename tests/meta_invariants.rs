use regex::Regex;
use regex_clippy::lint::{RuleCategory, RuleRegistry, all_known_rules};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use walkdir::WalkDir;

/// `(name, file)` of every rule descriptor declared under `src/rules`.
fn declared_rules() -> Vec<(String, PathBuf)> {
    let rules_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("src")
        .join("rules");
    let descriptor =
        Regex::new(r#"static [A-Z_]+: RuleDescriptor = RuleDescriptor \{\s*name: "([a-z_]+)""#)
            .unwrap();

    let mut out = Vec::new();
    for entry in WalkDir::new(&rules_dir).sort_by_file_name() {
        let entry = entry.expect("should walk src/rules");
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "rs") {
            continue;
        }
        let content = fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
        for cap in descriptor.captures_iter(&content) {
            out.push((cap[1].to_string(), path.to_path_buf()));
        }
    }
    out
}

#[test]
fn every_declared_rule_is_registered() {
    let declared = declared_rules();
    assert!(!declared.is_empty(), "expected rule descriptors under src/rules");

    let known = all_known_rules();
    let missing: Vec<String> = declared
        .iter()
        .filter(|(name, _)| !known.contains(name.as_str()))
        .map(|(name, path)| format!("{name} ({})", path.display()))
        .collect();
    assert!(
        missing.is_empty(),
        "rules declared but not registered:\n{}",
        missing.join("\n")
    );
    assert_eq!(declared.len(), known.len());
}

#[test]
fn rule_names_are_unique() {
    let registry = RuleRegistry::default_rules();
    let mut seen = HashSet::new();
    for d in registry.descriptors() {
        assert!(seen.insert(d.name), "duplicate rule name {}", d.name);
    }
}

#[test]
fn message_keys_follow_rule_names() {
    for d in RuleRegistry::default_rules().descriptors() {
        assert_eq!(d.keys.problem, format!("{}.problem", d.name));
        assert_eq!(d.keys.solve, format!("{}.solve", d.name));
    }
}

#[test]
fn registry_lists_categories_in_report_order() {
    let categories: Vec<RuleCategory> = RuleRegistry::default_rules()
        .descriptors()
        .map(|d| d.category)
        .collect();
    let mut sorted = categories.clone();
    sorted.sort();
    assert_eq!(categories, sorted);
}

#[test]
fn every_rule_has_a_description() {
    for d in RuleRegistry::default_rules().descriptors() {
        assert!(!d.description.is_empty(), "{} has no description", d.name);
        assert_eq!(d.fix.available, !d.fix.description.is_empty(), "{}", d.name);
    }
}
