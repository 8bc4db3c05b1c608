use crate::ast::{AssertKind, ClassItem, NodeKind, Shorthand, SubexprKind, Tree};
use crate::diagnostics::Finding;
use crate::error::{ClippyResult, RegexClippyError};
use crate::fold::Folder;
use crate::lint::{
    FixDescriptor, LintSettings, MessageKeys, PatternRule, RuleCategory, RuleDescriptor, RuleGroup,
};

use super::util::{first_node, is_assert, multiline, parent_kind, target};

fn space_like(tree: &Tree, id: crate::ast::NodeId) -> bool {
    tree.kind(id).charset().is_some_and(|set| set.is_space_like())
}

// ============================================================================
// SpaceCharsetToShorthandLint
// ============================================================================

pub struct SpaceCharsetToShorthandLint;

static SPACE_CHARSET_TO_SHORTHAND: RuleDescriptor = RuleDescriptor {
    name: "space_charset_to_shorthand",
    category: RuleCategory::Tip,
    description: "A literal space probably means any whitespace",
    group: RuleGroup::Stable,
    fix: FixDescriptor::unsafe_fix("Replace the space with `\\s`"),
    keys: MessageKeys::new(
        "space_charset_to_shorthand.problem",
        "space_charset_to_shorthand.solve",
    ),
};

fn has_plain_space(kind: &NodeKind) -> bool {
    kind.charset()
        .is_some_and(|set| !set.negated && set.contains_literal_space())
}

impl PatternRule for SpaceCharsetToShorthandLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &SPACE_CHARSET_TO_SHORTHAND
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let id = first_node(tree, |id| has_plain_space(tree.kind(id)))?;
        Some(Finding::for_node(&SPACE_CHARSET_TO_SHORTHAND, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let id = target(tree, finding, has_plain_space)?;
        if let NodeKind::Charset(set) = tree.kind_mut(id) {
            let mut items: Vec<ClassItem> = Vec::with_capacity(set.items.len());
            for item in set.items.drain(..) {
                let item = match item {
                    ClassItem::Char(' ') | ClassItem::Range(' ', ' ') => {
                        ClassItem::Shorthand(Shorthand::Space)
                    }
                    other => other,
                };
                if !items.contains(&item) {
                    items.push(item);
                }
            }
            set.bracketed = items.len() > 1;
            set.items = items;
        }
        Ok(true)
    }
}

// ============================================================================
// SpaceCharsetWithoutQuantLint
// ============================================================================

pub struct SpaceCharsetWithoutQuantLint;

static SPACE_CHARSET_WITHOUT_QUANT: RuleDescriptor = RuleDescriptor {
    name: "space_charset_without_quant",
    category: RuleCategory::Tip,
    description: "A single whitespace match is usually meant to be one or more",
    group: RuleGroup::Stable,
    fix: FixDescriptor::unsafe_fix("Repeat the whitespace with `+`"),
    keys: MessageKeys::new(
        "space_charset_without_quant.problem",
        "space_charset_without_quant.solve",
    ),
};

impl PatternRule for SpaceCharsetWithoutQuantLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &SPACE_CHARSET_WITHOUT_QUANT
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let id = first_node(tree, |id| {
            space_like(tree, id) && !parent_kind(tree, id).is_some_and(NodeKind::is_quantifier)
        })?;
        Some(Finding::for_node(&SPACE_CHARSET_WITHOUT_QUANT, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let id = target(tree, finding, |k| {
            k.charset().is_some_and(|set| set.is_space_like())
        })?;
        if parent_kind(tree, id).is_some_and(NodeKind::is_quantifier) {
            return Err(RegexClippyError::stale(
                SPACE_CHARSET_WITHOUT_QUANT.name,
                "whitespace is already quantified",
            ));
        }
        tree.wrap(id, crate::ast::Bounds::new(1, None).to_kind(true));
        Ok(true)
    }
}

// ============================================================================
// SpaceCharsetWithOptionalQuantLint
// ============================================================================

pub struct SpaceCharsetWithOptionalQuantLint;

static SPACE_CHARSET_WITH_OPTIONAL_QUANT: RuleDescriptor = RuleDescriptor {
    name: "space_charset_with_optional_quant",
    category: RuleCategory::Tip,
    description: "Optional whitespace is usually meant to be any amount",
    group: RuleGroup::Stable,
    fix: FixDescriptor::unsafe_fix("Replace `?` with `*`"),
    keys: MessageKeys::new(
        "space_charset_with_optional_quant.problem",
        "space_charset_with_optional_quant.solve",
    ),
};

fn optional_space(tree: &Tree, id: crate::ast::NodeId) -> bool {
    matches!(tree.kind(id), NodeKind::FiniteQuant { low: 0, high: 1, .. })
        && space_like(tree, tree.operand(id))
}

impl PatternRule for SpaceCharsetWithOptionalQuantLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &SPACE_CHARSET_WITH_OPTIONAL_QUANT
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let id = first_node(tree, |id| optional_space(tree, id))?;
        Some(Finding::for_node(&SPACE_CHARSET_WITH_OPTIONAL_QUANT, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let id = target(tree, finding, |k| {
            matches!(k, NodeKind::FiniteQuant { low: 0, high: 1, .. })
        })?;
        let greedy = tree.kind(id).is_greedy();
        *tree.kind_mut(id) = NodeKind::InfiniteQuant {
            low: 0,
            greedy,
            brace: false,
        };
        Ok(true)
    }
}

// ============================================================================
// SubpatternWithoutBackrefLint
// ============================================================================

pub struct SubpatternWithoutBackrefLint;

static SUBPATTERN_WITHOUT_BACKREF: RuleDescriptor = RuleDescriptor {
    name: "subpattern_without_backref",
    category: RuleCategory::Tip,
    description: "Capturing group that nothing refers back to",
    group: RuleGroup::Stable,
    fix: FixDescriptor::unsafe_fix("Make the group non-capturing"),
    keys: MessageKeys::new(
        "subpattern_without_backref.problem",
        "subpattern_without_backref.solve",
    ),
};

impl PatternRule for SubpatternWithoutBackrefLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &SUBPATTERN_WITHOUT_BACKREF
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let referenced = tree.referenced_captures();
        let id = first_node(tree, |id| {
            tree.kind(id)
                .capture_number()
                .is_some_and(|n| !referenced.contains(&n))
        })?;
        Some(Finding::for_node(&SUBPATTERN_WITHOUT_BACKREF, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let id = target(tree, finding, |k| k.capture_number().is_some())?;
        *tree.kind_mut(id) = NodeKind::Subexpr(SubexprKind::Grouping);
        tree.renumber_captures();
        Ok(true)
    }
}

// ============================================================================
// ExactMatchSuggestionLint
// ============================================================================

/// `^...$` around the whole pattern is better expressed with a full-match
/// API call.
pub struct ExactMatchSuggestionLint;

static EXACT_MATCH_SUGGESTION: RuleDescriptor = RuleDescriptor {
    name: "exact_match_suggestion",
    category: RuleCategory::Tip,
    description: "Pattern anchored at both ends; a full-match call says this directly",
    group: RuleGroup::Stable,
    fix: FixDescriptor::unsafe_fix("Drop the anchors and use a full-match call"),
    keys: MessageKeys::new(
        "exact_match_suggestion.problem",
        "exact_match_suggestion.solve",
    ),
};

impl PatternRule for ExactMatchSuggestionLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &EXACT_MATCH_SUGGESTION
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let root = tree.root()?;
        if *tree.kind(root) != NodeKind::Concat || multiline(tree) {
            return None;
        }
        let operands = tree.operands(root);
        let (&first, &last) = (operands.first()?, operands.last()?);
        if is_assert(tree, first, AssertKind::Circumflex) && is_assert(tree, last, AssertKind::Dollar)
        {
            return Some(Finding::new(
                &EXACT_MATCH_SUGGESTION,
                vec![first, last],
                tree.span(root),
            ));
        }
        None
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let first = target(tree, finding, |k| {
            *k == NodeKind::Assert(AssertKind::Circumflex)
        })?;
        let last = finding
            .affected
            .get(1)
            .copied()
            .filter(|&id| tree.contains(id) && is_assert(tree, id, AssertKind::Dollar))
            .ok_or_else(|| {
                RegexClippyError::stale(EXACT_MATCH_SUGGESTION.name, "closing `$` is gone")
            })?;
        tree.delete(last);
        tree.delete(first);
        Ok(true)
    }
}

// ============================================================================
// CommonSubexpressionLint
// ============================================================================

/// Repeated adjacent copies of a sub-pattern, folded into one quantified
/// copy. Works on the normalized tree, so it is comparatively costly.
pub struct CommonSubexpressionLint {
    folder: Folder,
}

pub(crate) static COMMON_SUBEXPRESSION: RuleDescriptor = RuleDescriptor {
    name: "common_subexpression",
    category: RuleCategory::Tip,
    description: "Adjacent repetitions of the same sub-pattern can be a single quantifier",
    group: RuleGroup::Preview,
    fix: FixDescriptor::unsafe_fix("Fold the repetitions into a quantifier"),
    keys: MessageKeys::new(
        "common_subexpression.problem",
        "common_subexpression.solve",
    ),
};

impl CommonSubexpressionLint {
    pub fn new(settings: LintSettings) -> Self {
        Self {
            folder: Folder::new(settings),
        }
    }
}

impl Default for CommonSubexpressionLint {
    fn default() -> Self {
        Self::new(LintSettings::default())
    }
}

impl PatternRule for CommonSubexpressionLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &COMMON_SUBEXPRESSION
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let normalized = self.folder.prepare(tree.clone());
        let plan = Folder::plan(&normalized)?;
        Some(Finding::new(
            &COMMON_SUBEXPRESSION,
            plan.covered.clone(),
            plan.span,
        ))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        *tree = self.folder.prepare(std::mem::take(tree));
        let plan = Folder::plan(tree)
            .filter(|plan| plan.covered == finding.affected)
            .ok_or_else(|| {
                RegexClippyError::stale(
                    COMMON_SUBEXPRESSION.name,
                    "the repeated run is no longer there",
                )
            })?;
        self.folder.apply_plan(tree, &plan);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_regex;

    fn fix(rule: &dyn PatternRule, source: &str) -> String {
        let mut tree = parse_regex(source).expect("pattern should parse");
        let finding = rule.detect(&tree).expect("rule should fire");
        assert!(rule.apply(&mut tree, &finding).unwrap());
        tree.render()
    }

    fn fires(rule: &dyn PatternRule, source: &str) -> bool {
        rule.detect(&parse_regex(source).expect("pattern should parse"))
            .is_some()
    }

    #[test]
    fn space_becomes_shorthand() {
        assert_eq!(fix(&SpaceCharsetToShorthandLint, "a b"), "a\\sb");
        assert_eq!(fix(&SpaceCharsetToShorthandLint, "[ ]"), "\\s");
        assert_eq!(fix(&SpaceCharsetToShorthandLint, "[a \\s]"), "[a\\s]");
        assert!(!fires(&SpaceCharsetToShorthandLint, "[^ ]"));
    }

    #[test]
    fn unquantified_whitespace_gets_plus() {
        assert_eq!(fix(&SpaceCharsetWithoutQuantLint, "a\\sb"), "a\\s+b");
        assert!(!fires(&SpaceCharsetWithoutQuantLint, "a\\s*b"));
        assert!(!fires(&SpaceCharsetWithoutQuantLint, "a\\Sb"));
    }

    #[test]
    fn optional_whitespace_becomes_star() {
        assert_eq!(fix(&SpaceCharsetWithOptionalQuantLint, "a\\s?b"), "a\\s*b");
        assert_eq!(fix(&SpaceCharsetWithOptionalQuantLint, "a[ \\t]??"), "a[ \\t]*?");
        assert!(!fires(&SpaceCharsetWithOptionalQuantLint, "a?"));
    }

    #[test]
    fn unreferenced_capture_becomes_grouping() {
        assert_eq!(
            fix(&SubpatternWithoutBackrefLint, "(a)(b)\\2"),
            "(?:a)(b)\\1"
        );
        assert!(!fires(&SubpatternWithoutBackrefLint, "(a)\\1"));
        assert!(!fires(&SubpatternWithoutBackrefLint, "(a)(?1)"));
    }

    #[test]
    fn exact_match_drops_both_anchors() {
        assert_eq!(fix(&ExactMatchSuggestionLint, "^abc$"), "abc");
        assert_eq!(fix(&ExactMatchSuggestionLint, "^a$"), "a");
        assert!(!fires(&ExactMatchSuggestionLint, "^abc"));
        assert!(!fires(&ExactMatchSuggestionLint, "^a|b$"));
    }

    #[test]
    fn common_subexpression_round_trip() {
        assert_eq!(fix(&CommonSubexpressionLint::default(), "(abc)(abc)(abc)"), "(abc){3}");
        assert_eq!(fix(&CommonSubexpressionLint::default(), "abab"), "(?:ab){2}");
        assert!(!fires(&CommonSubexpressionLint::default(), "abc"));
    }

    #[test]
    fn common_subexpression_rejects_stale_finding() {
        let rule = CommonSubexpressionLint::default();
        let mut tree = parse_regex("xyxy").unwrap();
        let finding = rule.detect(&tree).unwrap();
        rule.apply(&mut tree, &finding).unwrap();
        assert!(rule.apply(&mut tree, &finding).is_err());
    }
}
