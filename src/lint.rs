use crate::ast::Tree;
use crate::diagnostics::Finding;
use crate::error::{ClippyResult, RegexClippyError};
use std::collections::HashSet;

// ============================================================================
// Rule Groups (Preview vs Stable)
// ============================================================================

/// Classification of rules by stability level.
///
/// Stable rules run by default. Preview rules are either costly or rewrite
/// in the opposite direction of a stable rule, and need `--preview` or
/// `preview = true` in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub enum RuleGroup {
    #[default]
    Stable,
    Preview,
}

impl RuleGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleGroup::Stable => "stable",
            RuleGroup::Preview => "preview",
        }
    }

    /// Returns true if this tier requires explicit opt-in via CLI flag.
    pub fn requires_opt_in(&self) -> bool {
        matches!(self, RuleGroup::Preview)
    }

    /// Returns the CLI flag needed to enable this tier.
    pub fn required_flag(&self) -> Option<&'static str> {
        match self {
            RuleGroup::Stable => None,
            RuleGroup::Preview => Some("--preview"),
        }
    }
}

// ============================================================================
// Fix Safety Classification
// ============================================================================

/// Safety classification for rewrites.
///
/// - `Safe` rewrites keep the matched language and every capture number
/// - `Unsafe` rewrites keep the language but may renumber or drop captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FixSafety {
    #[default]
    Safe,
    Unsafe,
}

impl FixSafety {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixSafety::Safe => "safe",
            FixSafety::Unsafe => "unsafe",
        }
    }
}

/// Descriptor for the rewrite associated with a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixDescriptor {
    /// Whether `apply` changes the tree.
    pub available: bool,
    pub safety: FixSafety,
    /// Human-readable description of what the rewrite does.
    pub description: &'static str,
}

impl FixDescriptor {
    pub const fn safe(description: &'static str) -> Self {
        Self {
            available: true,
            safety: FixSafety::Safe,
            description,
        }
    }

    pub const fn unsafe_fix(description: &'static str) -> Self {
        Self {
            available: true,
            safety: FixSafety::Unsafe,
            description,
        }
    }

    /// Indicate no rewrite is available.
    pub const fn none() -> Self {
        Self {
            available: false,
            safety: FixSafety::Safe,
            description: "",
        }
    }
}

// ============================================================================
// Rule Categories
// ============================================================================

/// The three families a finding is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleCategory {
    /// Defects: the pattern almost certainly does not do what was meant.
    Error,
    /// Advice that may change what the pattern matches.
    Tip,
    /// Rewrites that keep the matched language.
    Equivalence,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 3] = [
        RuleCategory::Error,
        RuleCategory::Tip,
        RuleCategory::Equivalence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Error => "error",
            RuleCategory::Tip => "tip",
            RuleCategory::Equivalence => "equivalence",
        }
    }
}

/// Opaque message keys the UI resolves against its own catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageKeys {
    pub problem: &'static str,
    pub solve: &'static str,
}

impl MessageKeys {
    pub const fn new(problem: &'static str, solve: &'static str) -> Self {
        Self { problem, solve }
    }
}

/// Static metadata describing a rule.
#[derive(Debug)]
pub struct RuleDescriptor {
    pub name: &'static str,
    pub category: RuleCategory,
    pub description: &'static str,
    pub group: RuleGroup,
    pub fix: FixDescriptor,
    pub keys: MessageKeys,
}

/// A single pattern rule: a detector over the tree plus its rewrite.
///
/// `detect` returns the first match in pre-order, or `None`. `apply`
/// rewrites the tree for a finding and reports whether anything changed;
/// rules without a rewrite return `Ok(false)`. After a successful `apply`,
/// `detect` must not return a finding with the same affected ids again.
pub trait PatternRule: Send + Sync {
    fn descriptor(&self) -> &'static RuleDescriptor;
    fn detect(&self, tree: &Tree) -> Option<Finding>;
    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool>;
}

/// Engine knobs, filled from `[engine]` in `regex-clippy.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSettings {
    /// Cap on consecutive firings of one rule.
    pub max_rule_iterations: usize,
    /// Cap on full normalization passes.
    pub max_passes: usize,
    /// Let the normalizer drop capturing groups nothing refers to. When
    /// false the bracket battery skips `useless_subpattern` entirely, so
    /// default normalization never changes group numbering.
    pub strip_captures: bool,
}

impl Default for LintSettings {
    fn default() -> Self {
        Self {
            max_rule_iterations: 99,
            max_passes: 8,
            strip_captures: false,
        }
    }
}

pub fn all_known_rules() -> HashSet<&'static str> {
    RuleRegistry::default_rules()
        .descriptors()
        .map(|d| d.name)
        .collect()
}

/// Ordered collection of rules. Registration order is report order.
pub struct RuleRegistry {
    rules: Vec<Box<dyn PatternRule>>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: impl PatternRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn PatternRule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static RuleDescriptor> + '_ {
        self.rules.iter().map(|r| r.descriptor())
    }

    pub fn find(&self, name: &str) -> Option<&dyn PatternRule> {
        self.rules().find(|r| r.descriptor().name == name)
    }

    pub fn find_descriptor(&self, name: &str) -> Option<&'static RuleDescriptor> {
        self.descriptors().find(|d| d.name == name)
    }

    /// Rules of one category, in registration order.
    pub fn by_category(&self, category: RuleCategory) -> impl Iterator<Item = &dyn PatternRule> {
        self.rules()
            .filter(move |r| r.descriptor().category == category)
    }

    /// The category table: every category with its rule names in order.
    pub fn catalog(&self) -> Vec<(RuleCategory, Vec<&'static str>)> {
        RuleCategory::ALL
            .into_iter()
            .map(|category| {
                let names = self
                    .by_category(category)
                    .map(|r| r.descriptor().name)
                    .collect();
                (category, names)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every rule, preview ones included.
    #[must_use = "registry should be used to create an engine"]
    pub fn default_rules() -> Self {
        crate::rules::all_rules()
    }

    /// Returns error if any rule name in `only`, `skip`, or `disabled` is unknown.
    pub fn default_rules_filtered(
        only: &[String],
        skip: &[String],
        disabled: &[String],
        preview: bool,
    ) -> ClippyResult<Self> {
        let known = all_known_rules();

        for n in only.iter().chain(skip.iter()).chain(disabled.iter()) {
            if !known.contains(n.as_str()) {
                return Err(RegexClippyError::UnknownRule(n.clone()));
            }
        }

        let only_set: Option<HashSet<&str>> = if only.is_empty() {
            None
        } else {
            Some(only.iter().map(String::as_str).collect())
        };
        let skip_set: HashSet<&str> = skip
            .iter()
            .chain(disabled.iter())
            .map(String::as_str)
            .collect();

        let mut reg = Self::new();
        for rule in Self::default_rules().rules {
            let descriptor = rule.descriptor();
            let name = descriptor.name;

            // Naming a preview rule in `only` opts into it.
            let named = only_set.as_ref().is_some_and(|only| only.contains(name));
            if only_set.is_some() && !named {
                continue;
            }
            if skip_set.contains(name) {
                continue;
            }
            if descriptor.group == RuleGroup::Preview && !preview && !named {
                continue;
            }

            reg.rules.push(rule);
        }

        Ok(reg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_cover_every_category() {
        let registry = RuleRegistry::default_rules();
        for (category, names) in registry.catalog() {
            assert!(!names.is_empty(), "no rules for {}", category.as_str());
        }
    }

    #[test]
    fn rule_names_are_unique() {
        let registry = RuleRegistry::default_rules();
        assert_eq!(all_known_rules().len(), registry.len());
    }

    #[test]
    fn filtering_rejects_unknown_names() {
        let err = RuleRegistry::default_rules_filtered(&["nope".to_string()], &[], &[], false)
            .err()
            .expect("unknown rule should be rejected");
        assert!(matches!(err, RegexClippyError::UnknownRule(name) if name == "nope"));
    }

    #[test]
    fn preview_rules_need_opt_in() {
        let stable = RuleRegistry::default_rules_filtered(&[], &[], &[], false).unwrap();
        assert!(stable.descriptors().all(|d| d.group == RuleGroup::Stable));

        let all = RuleRegistry::default_rules_filtered(&[], &[], &[], true).unwrap();
        assert_eq!(all.len(), RuleRegistry::default_rules().len());

        let only = RuleRegistry::default_rules_filtered(
            &["common_subexpression".to_string()],
            &[],
            &[],
            false,
        )
        .unwrap();
        assert_eq!(only.len(), 1);
    }

    #[test]
    fn skip_and_disabled_remove_rules() {
        let reg = RuleRegistry::default_rules_filtered(
            &[],
            &["nullable_regex".to_string()],
            &["useless_grouping".to_string()],
            true,
        )
        .unwrap();
        assert!(reg.find("nullable_regex").is_none());
        assert!(reg.find("useless_grouping").is_none());
        assert!(reg.find("empty_grouping").is_some());
    }
}
