//! Regex Clippy engine and rule registry.
//!
//! A pattern is parsed into an arena tree (`ast`), checked by the rules in
//! `rules`, and rendered back to text. `LintEngine` ties the pieces
//! together: it builds categorized reports, applies a single finding,
//! normalizes a pattern to its canonical form and folds repeated runs.

pub mod ast;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fold;
pub mod lint;
pub mod normalize;
pub mod parser;
pub mod render;
pub mod rules;
pub mod telemetry;

use crate::ast::Tree;
use crate::diagnostics::{Finding, Report};
use crate::error::{ClippyResult, RegexClippyError};
use crate::fold::Folder;
use crate::lint::{LintSettings, PatternRule, RuleRegistry};
use crate::normalize::{Normalized, Normalizer};
use crate::parser::parse_regex;
use tracing::debug;

/// Engine orchestrates linting by parsing patterns and running registered rules.
pub struct LintEngine {
    registry: RuleRegistry,
    settings: LintSettings,
    normalizer: Normalizer,
    folder: Folder,
}

impl LintEngine {
    /// Create a new engine with default settings.
    pub fn new(registry: RuleRegistry) -> Self {
        Self::new_with_settings(registry, LintSettings::default())
    }

    /// Create a new engine with explicit settings (e.g. from config).
    pub fn new_with_settings(registry: RuleRegistry, settings: LintSettings) -> Self {
        Self {
            registry,
            normalizer: Normalizer::new(settings.clone()),
            folder: Folder::new(settings.clone()),
            settings,
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &LintSettings {
        &self.settings
    }

    /// Parse a pattern and report every finding, grouped by category.
    pub fn lint_source(&self, source: &str) -> ClippyResult<Report> {
        let tree = parse_regex(source)?;
        Ok(self.lint_tree(&tree))
    }

    pub fn lint_tree(&self, tree: &Tree) -> Report {
        crate::instrument_block!("lint", {
            let mut report = Report::default();
            for finding in self.findings(tree) {
                report.push(&finding);
            }
            report
        })
    }

    /// Findings of every registered rule, in registration order.
    pub fn findings(&self, tree: &Tree) -> Vec<Finding> {
        self.registry
            .rules()
            .flat_map(|rule| self.rule_findings(rule, tree))
            .collect()
    }

    /// Every match of one rule. The rule is detected and applied on a
    /// scratch copy until it stops matching, so later findings describe the
    /// tree after the earlier ones were rewritten.
    pub fn rule_findings(&self, rule: &dyn PatternRule, tree: &Tree) -> Vec<Finding> {
        let name = rule.descriptor().name;
        let mut scratch = tree.clone();
        let mut findings: Vec<Finding> = Vec::new();

        for _ in 0..self.settings.max_rule_iterations {
            let Some(finding) = rule.detect(&scratch) else {
                break;
            };
            if findings
                .last()
                .is_some_and(|prev| prev.affected == finding.affected)
            {
                break;
            }
            let outcome = rule.apply(&mut scratch, &finding);
            findings.push(finding);
            match outcome {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    debug!(rule = name, error = %err, "stopped collecting findings");
                    break;
                }
            }
        }
        findings
    }

    /// Apply `finding` to a copy of `tree` with the rule called `rule_name`.
    ///
    /// Returns the rewritten pattern, or `None` when the rule has no rewrite
    /// or the rewrite leaves nothing behind.
    pub fn apply_finding(
        &self,
        tree: &Tree,
        rule_name: &str,
        finding: &Finding,
    ) -> ClippyResult<Option<String>> {
        let rule = self
            .registry
            .find(rule_name)
            .ok_or_else(|| RegexClippyError::UnknownRule(rule_name.to_string()))?;
        crate::clippy_ensure!(
            finding.rule.name == rule_name,
            "finding belongs to `{}`, not `{rule_name}`",
            finding.rule.name
        );

        let mut rewritten = tree.clone();
        if !rule.apply(&mut rewritten, finding)? {
            return Ok(None);
        }
        Ok(rendered_or_none(&rewritten))
    }

    pub fn normalize(&self, tree: Tree) -> Normalized {
        self.normalizer.normalize(tree)
    }

    pub fn normalize_source(&self, source: &str) -> ClippyResult<Normalized> {
        Ok(self.normalize(parse_regex(source)?))
    }

    pub fn fold(&self, tree: Tree) -> Option<Tree> {
        crate::instrument_block!("fold", { self.folder.fold(tree) })
    }

    /// Fold the first repeated run of `source`. `None` when nothing repeats.
    pub fn fold_source(&self, source: &str) -> ClippyResult<Option<String>> {
        let tree = parse_regex(source)?;
        Ok(self.fold(tree).map(|folded| folded.render()))
    }
}

fn rendered_or_none(tree: &Tree) -> Option<String> {
    let root = tree.root()?;
    (!tree.kind(root).is_empty_leaf()).then(|| tree.render())
}

/// Construct a `LintEngine` with every stable rule enabled.
pub fn create_default_engine() -> LintEngine {
    // No names are passed, so filtering cannot fail.
    let registry =
        RuleRegistry::default_rules_filtered(&[], &[], &[], false).unwrap_or_default();
    LintEngine::new(registry)
}

/// Apply a finding with the full rule catalog and default settings.
pub fn apply_finding(
    tree: &Tree,
    rule_name: &str,
    finding: &Finding,
) -> ClippyResult<Option<String>> {
    LintEngine::new(RuleRegistry::default_rules()).apply_finding(tree, rule_name, finding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_engine_skips_preview_rules() {
        let engine = create_default_engine();
        assert!(engine.registry().find("useless_subpattern").is_none());
        assert!(engine.registry().find("nullable_regex").is_some());
    }

    #[test]
    fn rule_findings_stop_at_fixpoint() {
        let engine = LintEngine::new(RuleRegistry::default_rules());
        let tree = parse_regex("(a)(b)(c)").unwrap();
        let rule = engine
            .registry()
            .find("subpattern_without_backref")
            .unwrap();
        assert_eq!(engine.rule_findings(rule, &tree).len(), 3);
    }

    #[test]
    fn rule_without_rewrite_is_reported_once() {
        let engine = create_default_engine();
        let report = engine.lint_source("a*").unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].problem_type, "nullable_regex");
    }

    #[test]
    fn mismatched_rule_name_is_rejected() {
        let tree = parse_regex("a{1}").unwrap();
        let engine = LintEngine::new(RuleRegistry::default_rules());
        let rule = engine.registry().find("trivial_quantifier").unwrap();
        let finding = rule.detect(&tree).unwrap();
        assert!(engine.apply_finding(&tree, "empty_grouping", &finding).is_err());
        assert!(matches!(
            engine.apply_finding(&tree, "no_such_rule", &finding),
            Err(RegexClippyError::UnknownRule(_))
        ));
        assert_eq!(
            engine
                .apply_finding(&tree, "trivial_quantifier", &finding)
                .unwrap()
                .as_deref(),
            Some("a")
        );
    }
}
