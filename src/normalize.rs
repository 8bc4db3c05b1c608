//! Canonical form of a regex tree.
//!
//! A normalization pass runs, in order:
//!
//! 1. the shape battery (trivial quantifiers, repeated assertions, single
//!    character alternations, empty branches, nested quantifiers),
//! 2. a sweep removing every grouping the tree does not need,
//! 3. the bracket battery (single character classes, empty and useless
//!    groups, empty captures),
//! 4. the sweep again,
//! 5. a canonical sort of alternation branches.
//!
//! Each rule is looped to a fixpoint under `max_rule_iterations`, and passes
//! repeat until the rendered text stops changing, so normalizing a
//! normalized tree is a no-op.

use crate::ast::{NodeId, NodeKind, Span, Tree};
use crate::lint::{LintSettings, PatternRule};
use crate::rules::util::{delete_with_quantifier, parens_removable};
use crate::rules::{
    AltEpsilonToOptionalQuantLint, AlternationOfSingleCharsLint, ConsecutiveQuantifiersLint,
    EmptyGroupingLint, EmptySubpatternLint, RepeatedAssertionsLint, SingleCharCharsetLint,
    TrivialQuantifierLint, UselessGroupingLint, UselessSubpatternLint,
};
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, warn};

/// One rewrite performed while normalizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Firing {
    pub rule: &'static str,
    pub affected: Vec<NodeId>,
    pub span: Span,
    pub before: String,
    pub after: String,
}

/// What a normalization run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub firings: Vec<Firing>,
    /// Rules that still matched when their iteration cap ran out.
    pub non_converged: Vec<&'static str>,
    pub passes: usize,
    pub converged: bool,
}

impl NormalizeReport {
    pub fn rules_fired(&self) -> Vec<&'static str> {
        self.firings.iter().map(|f| f.rule).unique().collect()
    }
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub tree: Tree,
    pub report: NormalizeReport,
}

impl Normalized {
    pub fn render(&self) -> String {
        self.tree.render()
    }
}

pub struct Normalizer {
    settings: LintSettings,
    shape: Vec<Box<dyn PatternRule>>,
    brackets: Vec<Box<dyn PatternRule>>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(LintSettings::default())
    }
}

impl Normalizer {
    pub fn new(settings: LintSettings) -> Self {
        let shape: Vec<Box<dyn PatternRule>> = vec![
            Box::new(TrivialQuantifierLint),
            Box::new(RepeatedAssertionsLint),
            Box::new(AlternationOfSingleCharsLint),
            Box::new(AltEpsilonToOptionalQuantLint),
            Box::new(ConsecutiveQuantifiersLint),
        ];
        let mut brackets: Vec<Box<dyn PatternRule>> = vec![
            Box::new(SingleCharCharsetLint),
            Box::new(EmptyGroupingLint),
            Box::new(UselessGroupingLint),
            Box::new(EmptySubpatternLint),
        ];
        if settings.strip_captures {
            brackets.push(Box::new(UselessSubpatternLint));
        }
        Self {
            settings,
            shape,
            brackets,
        }
    }

    pub fn settings(&self) -> &LintSettings {
        &self.settings
    }

    pub fn normalize(&self, tree: Tree) -> Normalized {
        crate::instrument_block!("normalize", {
            let mut tree = tree;
            let mut report = NormalizeReport::default();
            let mut text = tree.render();

            for pass in 1..=self.settings.max_passes {
                report.passes = pass;
                self.run_battery(&mut tree, &self.shape, &mut report);
                self.reduce(&mut tree, &mut report);
                canonical_sort(&mut tree);

                let rendered = tree.render();
                if rendered == text {
                    report.converged = true;
                    break;
                }
                text = rendered;
            }

            if !report.converged {
                warn!(
                    passes = report.passes,
                    pattern = %text,
                    "normalization did not reach a fixpoint"
                );
            }
            Normalized { tree, report }
        })
    }

    /// Sweep, bracket battery, sweep.
    pub fn reduce(&self, tree: &mut Tree, report: &mut NormalizeReport) {
        remove_groupings(tree);
        self.run_battery(tree, &self.brackets, report);
        remove_groupings(tree);
    }

    fn run_battery(
        &self,
        tree: &mut Tree,
        rules: &[Box<dyn PatternRule>],
        report: &mut NormalizeReport,
    ) {
        for rule in rules {
            self.run_rule(tree, rule.as_ref(), report);
        }
    }

    /// Apply one rule until it stops matching or hits the iteration cap.
    pub fn run_rule(&self, tree: &mut Tree, rule: &dyn PatternRule, report: &mut NormalizeReport) {
        let name = rule.descriptor().name;
        for _ in 0..self.settings.max_rule_iterations {
            let Some(finding) = rule.detect(tree) else {
                return;
            };
            let before = tree.render();
            match rule.apply(tree, &finding) {
                Ok(true) => {
                    let after = tree.render();
                    debug!(rule = name, before = %before, after = %after, "rule fired");
                    report.firings.push(Firing {
                        rule: name,
                        affected: finding.affected,
                        span: finding.span,
                        before,
                        after,
                    });
                }
                Ok(false) => return,
                Err(err) => {
                    warn!(rule = name, error = %err, "rewrite rejected");
                    return;
                }
            }
        }
        if rule.detect(tree).is_some() {
            warn!(
                rule = name,
                cap = self.settings.max_rule_iterations,
                "rule did not converge"
            );
            report.non_converged.push(name);
        }
    }
}

/// Normalize with default settings.
pub fn normalize(tree: Tree) -> Tree {
    Normalizer::default().normalize(tree).tree
}

/// Remove every grouping whose parentheses the tree does not need, empty
/// or not, and collapse concatenations and alternations left with a single
/// operand. Returns the number of nodes removed.
pub fn remove_groupings(tree: &mut Tree) -> usize {
    let mut removed = 0;
    loop {
        let next = tree.preorder().into_iter().find(|&id| match tree.kind(id) {
            NodeKind::Concat | NodeKind::Alternation => tree.operands(id).len() < 2,
            kind if kind.is_grouping() => {
                tree.kind(tree.operand(id)).is_empty_leaf() || parens_removable(tree, id)
            }
            _ => false,
        });
        let Some(id) = next else {
            return removed;
        };

        if !tree.kind(id).is_grouping() {
            tree.collapse_trivial(id);
        } else if tree.kind(tree.operand(id)).is_empty_leaf() {
            delete_with_quantifier(tree, id);
        } else {
            tree.unwrap_node(id);
        }
        removed += 1;
    }
}

/// Sort every alternation's branches by rendered text, innermost first, then
/// renumber captures to follow the new document order.
pub fn canonical_sort(tree: &mut Tree) {
    let bottom_up = tree.preorder().into_iter().rev().collect::<Vec<_>>();
    for id in bottom_up {
        if *tree.kind(id) != NodeKind::Alternation {
            continue;
        }
        let sorted = tree
            .operands(id)
            .iter()
            .copied()
            .sorted_by_cached_key(|&branch| tree.render_node(branch))
            .collect();
        tree.permute_operands(id, sorted);
    }
    tree.renumber_captures();
}
