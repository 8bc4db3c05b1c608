use crate::ast::{
    Bounds, Charset, ClassItem, MetaKind, NodeId, NodeKind, OpaqueKind, Span, SubexprKind, Tree,
};
use crate::diagnostics::Finding;
use crate::error::{ClippyResult, RegexClippyError};
use crate::lint::{FixDescriptor, MessageKeys, PatternRule, RuleCategory, RuleDescriptor, RuleGroup};
use itertools::Itertools;

use super::util::{
    delete_with_quantifier, first_node, parens_removable, strip_groupings,
    target, under_optional_quantifier,
};

// ============================================================================
// RepeatedAssertionsLint
// ============================================================================

pub struct RepeatedAssertionsLint;

static REPEATED_ASSERTIONS: RuleDescriptor = RuleDescriptor {
    name: "repeated_assertions",
    category: RuleCategory::Equivalence,
    description: "The same assertion twice in a row",
    group: RuleGroup::Stable,
    fix: FixDescriptor::safe("Drop the second assertion"),
    keys: MessageKeys::new("repeated_assertions.problem", "repeated_assertions.solve"),
};

fn repeats_previous_assertion(tree: &Tree, id: NodeId) -> bool {
    let NodeKind::Assert(kind) = tree.kind(id) else {
        return false;
    };
    let Some(parent) = tree.parent(id) else {
        return false;
    };
    if *tree.kind(parent) != NodeKind::Concat {
        return false;
    }
    let index = tree.index_in_parent(id).unwrap_or_default();
    index > 0 && *tree.kind(tree.operands(parent)[index - 1]) == NodeKind::Assert(*kind)
}

impl PatternRule for RepeatedAssertionsLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &REPEATED_ASSERTIONS
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let id = first_node(tree, |id| repeats_previous_assertion(tree, id))?;
        Some(Finding::for_node(&REPEATED_ASSERTIONS, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let id = target(tree, finding, |k| matches!(k, NodeKind::Assert(_)))?;
        if !repeats_previous_assertion(tree, id) {
            return Err(RegexClippyError::stale(
                REPEATED_ASSERTIONS.name,
                "assertion no longer follows a copy of itself",
            ));
        }
        tree.delete(id);
        Ok(true)
    }
}

// ============================================================================
// EmptyGroupingLint
// ============================================================================

pub struct EmptyGroupingLint;

static EMPTY_GROUPING: RuleDescriptor = RuleDescriptor {
    name: "empty_grouping",
    category: RuleCategory::Equivalence,
    description: "Non-capturing group with nothing inside",
    group: RuleGroup::Stable,
    fix: FixDescriptor::safe("Remove the group"),
    keys: MessageKeys::new("empty_grouping.problem", "empty_grouping.solve"),
};

fn is_empty_grouping(tree: &Tree, id: NodeId) -> bool {
    tree.kind(id).is_grouping() && tree.kind(tree.operand(id)).is_empty_leaf()
}

impl PatternRule for EmptyGroupingLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &EMPTY_GROUPING
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let id = first_node(tree, |id| is_empty_grouping(tree, id))?;
        Some(Finding::for_node(&EMPTY_GROUPING, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let id = target(tree, finding, NodeKind::is_grouping)?;
        delete_with_quantifier(tree, id);
        Ok(true)
    }
}

// ============================================================================
// UselessGroupingLint
// ============================================================================

pub struct UselessGroupingLint;

static USELESS_GROUPING: RuleDescriptor = RuleDescriptor {
    name: "useless_grouping",
    category: RuleCategory::Equivalence,
    description: "Non-capturing group whose parentheses change nothing",
    group: RuleGroup::Stable,
    fix: FixDescriptor::safe("Remove the parentheses"),
    keys: MessageKeys::new("useless_grouping.problem", "useless_grouping.solve"),
};

fn is_useless_grouping(tree: &Tree, id: NodeId) -> bool {
    tree.kind(id).is_grouping()
        && !tree.kind(tree.operand(id)).is_empty_leaf()
        && parens_removable(tree, id)
}

impl PatternRule for UselessGroupingLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &USELESS_GROUPING
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let id = first_node(tree, |id| is_useless_grouping(tree, id))?;
        Some(Finding::for_node(&USELESS_GROUPING, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let id = target(tree, finding, NodeKind::is_grouping)?;
        if !parens_removable(tree, id) {
            return Err(RegexClippyError::stale(
                USELESS_GROUPING.name,
                "parentheses are needed here now",
            ));
        }
        tree.unwrap_node(id);
        Ok(true)
    }
}

// ============================================================================
// EmptySubpatternLint
// ============================================================================

pub struct EmptySubpatternLint;

static EMPTY_SUBPATTERN: RuleDescriptor = RuleDescriptor {
    name: "empty_subpattern",
    category: RuleCategory::Equivalence,
    description: "Capturing group with nothing inside",
    group: RuleGroup::Stable,
    fix: FixDescriptor::unsafe_fix("Remove the group and its backreferences, then renumber"),
    keys: MessageKeys::new("empty_subpattern.problem", "empty_subpattern.solve"),
};

impl PatternRule for EmptySubpatternLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &EMPTY_SUBPATTERN
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let id = first_node(tree, |id| {
            tree.kind(id).capture_number().is_some() && tree.kind(tree.operand(id)).is_empty_leaf()
        })?;
        Some(Finding::for_node(&EMPTY_SUBPATTERN, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let id = target(tree, finding, |k| k.capture_number().is_some())?;
        let Some(number) = tree.kind(id).capture_number() else {
            return Ok(false);
        };

        // An empty group only ever captures "", so references to it match "".
        let references: Vec<NodeId> = tree
            .preorder()
            .into_iter()
            .filter(|&n| match tree.kind(n) {
                NodeKind::Backref(r) => *r == number,
                NodeKind::Opaque(OpaqueKind::SubexprCall(r)) => *r == number,
                _ => false,
            })
            .collect();
        for reference in references {
            tree.delete(reference);
        }

        delete_with_quantifier(tree, id);
        tree.renumber_captures();
        Ok(true)
    }
}

// ============================================================================
// UselessSubpatternLint
// ============================================================================

/// Capturing group nobody refers to, whose parentheses could go.
///
/// Dropping a capture changes the groups a caller sees, so this stays in
/// preview and the normalizer only runs it when asked to strip captures.
pub struct UselessSubpatternLint;

static USELESS_SUBPATTERN: RuleDescriptor = RuleDescriptor {
    name: "useless_subpattern",
    category: RuleCategory::Equivalence,
    description: "Unreferenced capturing group whose parentheses change nothing",
    group: RuleGroup::Preview,
    fix: FixDescriptor::unsafe_fix("Remove the parentheses and renumber"),
    keys: MessageKeys::new("useless_subpattern.problem", "useless_subpattern.solve"),
};

impl PatternRule for UselessSubpatternLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &USELESS_SUBPATTERN
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let referenced = tree.referenced_captures();
        let id = first_node(tree, |id| {
            tree.kind(id)
                .capture_number()
                .is_some_and(|n| !referenced.contains(&n))
                && !tree.kind(tree.operand(id)).is_empty_leaf()
                && parens_removable(tree, id)
        })?;
        Some(Finding::for_node(&USELESS_SUBPATTERN, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let id = target(tree, finding, |k| k.capture_number().is_some())?;
        if !parens_removable(tree, id) {
            return Err(RegexClippyError::stale(
                USELESS_SUBPATTERN.name,
                "parentheses are needed here now",
            ));
        }
        tree.unwrap_node(id);
        tree.renumber_captures();
        Ok(true)
    }
}

// ============================================================================
// SingleCharCharsetLint
// ============================================================================

pub struct SingleCharCharsetLint;

static SINGLE_CHAR_CHARSET: RuleDescriptor = RuleDescriptor {
    name: "single_char_charset",
    category: RuleCategory::Equivalence,
    description: "Bracketed class that matches exactly one character",
    group: RuleGroup::Stable,
    fix: FixDescriptor::safe("Write the character without brackets"),
    keys: MessageKeys::new("single_char_charset.problem", "single_char_charset.solve"),
};

fn is_single_char_class(kind: &NodeKind) -> bool {
    kind.charset()
        .is_some_and(|set| set.bracketed && !set.negated && set.single_char().is_some())
}

impl PatternRule for SingleCharCharsetLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &SINGLE_CHAR_CHARSET
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let id = first_node(tree, |id| is_single_char_class(tree.kind(id)))?;
        Some(Finding::for_node(&SINGLE_CHAR_CHARSET, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let id = target(tree, finding, is_single_char_class)?;
        if let NodeKind::Charset(set) = tree.kind_mut(id)
            && let Some(c) = set.single_char()
        {
            *set = Charset::literal(c);
        }
        Ok(true)
    }
}

// ============================================================================
// AlternationOfSingleCharsLint
// ============================================================================

pub struct AlternationOfSingleCharsLint;

static ALTERNATION_OF_SINGLE_CHARS: RuleDescriptor = RuleDescriptor {
    name: "alternation_of_single_chars",
    category: RuleCategory::Equivalence,
    description: "Alternation between single characters is a character class",
    group: RuleGroup::Stable,
    fix: FixDescriptor::safe("Merge the branches into one bracketed class"),
    keys: MessageKeys::new(
        "alternation_of_single_chars.problem",
        "alternation_of_single_chars.solve",
    ),
};

fn mergeable_branch(kind: &NodeKind) -> bool {
    kind.charset().is_some_and(|set| !set.negated && !set.has_any())
}

impl PatternRule for AlternationOfSingleCharsLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &ALTERNATION_OF_SINGLE_CHARS
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        tree.preorder().into_iter().find_map(|id| {
            if *tree.kind(id) != NodeKind::Alternation {
                return None;
            }
            let branches: Vec<NodeId> = tree
                .operands(id)
                .iter()
                .copied()
                .filter(|&b| mergeable_branch(tree.kind(b)))
                .collect();
            (branches.len() >= 2)
                .then(|| Finding::for_nodes(&ALTERNATION_OF_SINGLE_CHARS, tree, branches))
        })
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let stale = |reason: &str| RegexClippyError::stale(ALTERNATION_OF_SINGLE_CHARS.name, reason);

        let keep = target(tree, finding, mergeable_branch)?;
        let alternation = tree
            .parent(keep)
            .filter(|&p| *tree.kind(p) == NodeKind::Alternation)
            .ok_or_else(|| stale("branch is no longer in an alternation"))?;
        let others = &finding.affected[1..];
        if others.is_empty()
            || !others.iter().all(|&id| {
                tree.contains(id)
                    && tree.parent(id) == Some(alternation)
                    && mergeable_branch(tree.kind(id))
            })
        {
            return Err(stale("branches changed"));
        }

        // Sorted so `a|b` and `b|a` merge into the same class.
        let items: Vec<ClassItem> = finding
            .affected
            .iter()
            .filter_map(|&id| tree.kind(id).charset())
            .flat_map(|set| set.items.iter().cloned())
            .sorted()
            .dedup()
            .collect();

        for &id in others {
            let span = tree.span(id);
            let index = tree.index_in_parent(id).unwrap_or_default();
            let removed = tree.take_operand(alternation, index);
            tree.free(removed);
            tree.widen_span(keep, span);
        }
        *tree.kind_mut(keep) = NodeKind::Charset(Charset {
            negated: false,
            bracketed: true,
            items,
        });
        tree.collapse_trivial(alternation);
        Ok(true)
    }
}

// ============================================================================
// QuantifierShorthandLint
// ============================================================================

pub struct QuantifierShorthandLint;

static QUANTIFIER_SHORTHAND: RuleDescriptor = RuleDescriptor {
    name: "quantifier_shorthand",
    category: RuleCategory::Equivalence,
    description: "Braced quantifier that has a one-character form",
    group: RuleGroup::Stable,
    fix: FixDescriptor::safe("Use `*`, `+` or `?`"),
    keys: MessageKeys::new("quantifier_shorthand.problem", "quantifier_shorthand.solve"),
};

fn has_shorthand(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::FiniteQuant {
            low: 0,
            high: 1,
            brace: true,
            ..
        } | NodeKind::InfiniteQuant {
            low: 0 | 1,
            brace: true,
            ..
        }
    )
}

impl PatternRule for QuantifierShorthandLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &QUANTIFIER_SHORTHAND
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let id = first_node(tree, |id| has_shorthand(tree.kind(id)))?;
        Some(Finding::for_node(&QUANTIFIER_SHORTHAND, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let id = target(tree, finding, has_shorthand)?;
        if let NodeKind::FiniteQuant { brace, .. } | NodeKind::InfiniteQuant { brace, .. } =
            tree.kind_mut(id)
        {
            *brace = false;
        }
        Ok(true)
    }
}

// ============================================================================
// TrivialQuantifierLint
// ============================================================================

pub struct TrivialQuantifierLint;

static TRIVIAL_QUANTIFIER: RuleDescriptor = RuleDescriptor {
    name: "trivial_quantifier",
    category: RuleCategory::Equivalence,
    description: "`{1}` and `{1,1}` repeat exactly once",
    group: RuleGroup::Stable,
    fix: FixDescriptor::safe("Drop the quantifier"),
    keys: MessageKeys::new("trivial_quantifier.problem", "trivial_quantifier.solve"),
};

fn is_trivial_quantifier(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::FiniteQuant { low: 1, high: 1, .. })
}

impl PatternRule for TrivialQuantifierLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &TRIVIAL_QUANTIFIER
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let id = first_node(tree, |id| is_trivial_quantifier(tree.kind(id)))?;
        Some(Finding::for_node(&TRIVIAL_QUANTIFIER, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let id = target(tree, finding, is_trivial_quantifier)?;
        let body = tree.operand(id);
        if tree.kind(body).is_quantifier() {
            tree.wrap(body, NodeKind::Subexpr(SubexprKind::Grouping));
        }
        tree.unwrap_node(id);
        Ok(true)
    }
}

// ============================================================================
// AltEpsilonToOptionalQuantLint
// ============================================================================

/// `(?:a|b|)` is `(?:a|b)?`; an empty first branch prefers the empty match,
/// which is the lazy `??`.
pub struct AltEpsilonToOptionalQuantLint;

static ALT_EPSILON_TO_OPTIONAL_QUANT: RuleDescriptor = RuleDescriptor {
    name: "alt_epsilon_to_optional_quant",
    category: RuleCategory::Equivalence,
    description: "Alternation with an empty branch is an optional group",
    group: RuleGroup::Stable,
    fix: FixDescriptor::safe("Drop the empty branch and add `?`"),
    keys: MessageKeys::new(
        "alt_epsilon_to_optional_quant.problem",
        "alt_epsilon_to_optional_quant.solve",
    ),
};

impl PatternRule for AltEpsilonToOptionalQuantLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &ALT_EPSILON_TO_OPTIONAL_QUANT
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let id = first_node(tree, |id| {
            *tree.kind(id) == NodeKind::Alternation
                && tree
                    .operands(id)
                    .iter()
                    .any(|&b| tree.kind(b).is_empty_leaf())
                && !under_optional_quantifier(tree, id)
        })?;
        Some(Finding::for_node(&ALT_EPSILON_TO_OPTIONAL_QUANT, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let alternation = target(tree, finding, |k| *k == NodeKind::Alternation)?;
        let branches = tree.operands(alternation).to_vec();
        let lazy = tree.kind(branches[0]).is_empty_leaf();

        for (index, &branch) in branches.iter().enumerate().rev() {
            if tree.kind(branch).is_empty_leaf() {
                let removed = tree.take_operand(alternation, index);
                tree.free(removed);
            }
        }
        if tree.operands(alternation).is_empty() {
            tree.collapse_trivial(alternation);
            return Ok(true);
        }

        let body = tree.collapse_trivial(alternation);
        let optional = Bounds::new(0, Some(1)).to_kind(!lazy);
        match tree.parent(body) {
            Some(group) if tree.kind(group).is_grouping() => {
                tree.wrap(group, optional);
            }
            _ if tree.kind(body).is_atom() => {
                tree.wrap(body, optional);
            }
            _ => {
                let group = tree.wrap(body, NodeKind::Subexpr(SubexprKind::Grouping));
                tree.wrap(group, optional);
            }
        }
        Ok(true)
    }
}

// ============================================================================
// OptionalQuantToAltEpsilonLint
// ============================================================================

/// Inverse of [`AltEpsilonToOptionalQuantLint`].
pub struct OptionalQuantToAltEpsilonLint;

static OPTIONAL_QUANT_TO_ALT_EPSILON: RuleDescriptor = RuleDescriptor {
    name: "optional_quant_to_alt_epsilon",
    category: RuleCategory::Equivalence,
    description: "Optional alternation can carry the empty branch itself",
    group: RuleGroup::Preview,
    fix: FixDescriptor::safe("Replace `?` with an empty branch"),
    keys: MessageKeys::new(
        "optional_quant_to_alt_epsilon.problem",
        "optional_quant_to_alt_epsilon.solve",
    ),
};

fn optional_alternation(tree: &Tree, id: NodeId) -> Option<NodeId> {
    if !matches!(tree.kind(id), NodeKind::FiniteQuant { low: 0, high: 1, .. }) {
        return None;
    }
    let body = strip_groupings(tree, tree.operand(id));
    let plain = *tree.kind(body) == NodeKind::Alternation
        && !tree
            .operands(body)
            .iter()
            .any(|&b| tree.kind(b).is_empty_leaf());
    plain.then_some(body)
}

impl PatternRule for OptionalQuantToAltEpsilonLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &OPTIONAL_QUANT_TO_ALT_EPSILON
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let id = first_node(tree, |id| optional_alternation(tree, id).is_some())?;
        Some(Finding::for_node(&OPTIONAL_QUANT_TO_ALT_EPSILON, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let quant = target(tree, finding, NodeKind::is_quantifier)?;
        let alternation = optional_alternation(tree, quant).ok_or_else(|| {
            RegexClippyError::stale(OPTIONAL_QUANT_TO_ALT_EPSILON.name, "no alternation under `?`")
        })?;

        let span = tree.span(alternation);
        let empty = NodeKind::Meta(MetaKind::Empty);
        if tree.kind(quant).is_greedy() {
            let leaf = tree.alloc(empty, Span::empty_at(span.end));
            let end = tree.operands(alternation).len();
            tree.insert_operand(alternation, end, leaf);
        } else {
            let leaf = tree.alloc(empty, Span::empty_at(span.start));
            tree.insert_operand(alternation, 0, leaf);
        }

        let body = tree.operand(quant);
        if !tree.kind(body).is_grouping() {
            tree.wrap(body, NodeKind::Subexpr(SubexprKind::Grouping));
        }
        tree.unwrap_node(quant);
        Ok(true)
    }
}

// ============================================================================
// ConsecutiveQuantifiersLint
// ============================================================================

pub struct ConsecutiveQuantifiersLint;

static CONSECUTIVE_QUANTIFIERS: RuleDescriptor = RuleDescriptor {
    name: "consecutive_quantifiers",
    category: RuleCategory::Equivalence,
    description: "A quantified quantifier that is a single quantifier",
    group: RuleGroup::Stable,
    fix: FixDescriptor::safe("Multiply the bounds into one quantifier"),
    keys: MessageKeys::new(
        "consecutive_quantifiers.problem",
        "consecutive_quantifiers.solve",
    ),
};

/// Bounds of `(?:x{inner}){outer}` as one quantifier, when the set of
/// repetition counts has no gaps.
pub(crate) fn merge_bounds(outer: Bounds, inner: Bounds) -> Option<Bounds> {
    if outer == Bounds::exact(0) || inner == Bounds::exact(0) {
        return Some(Bounds::exact(0));
    }
    // `{n}` over a range is left alone, gaps or not.
    if outer.is_exact() && outer.low > 1 && !inner.is_exact() {
        return None;
    }
    if !outer.is_exact() {
        // Adjacent counts k and k+1 of the outer quantifier must overlap or
        // touch; the first pair is the tightest.
        let k = u64::from(outer.low);
        let c = u64::from(inner.low);
        let touching = match inner.high {
            None => k > 0 || c <= 1,
            Some(d) => (k + 1) * c <= k * u64::from(d) + 1,
        };
        if !touching {
            return None;
        }
    }
    Some(outer.mul(inner))
}

/// The inner quantifier of a mergeable pair rooted at `id`.
fn mergeable_pair(tree: &Tree, id: NodeId) -> Option<NodeId> {
    let outer = tree.kind(id);
    let outer_bounds = outer.bounds()?;
    let inner = strip_groupings(tree, tree.operand(id));
    let inner_kind = tree.kind(inner);
    let inner_bounds = inner_kind.bounds()?;
    if outer.is_greedy() != inner_kind.is_greedy() {
        return None;
    }
    let merged = merge_bounds(outer_bounds, inner_bounds)?;
    if merged == Bounds::exact(0) && holds_referenced_capture(tree, id) {
        return None;
    }
    Some(inner)
}

/// Whether a capture under `id` is the target of a backreference or call.
fn holds_referenced_capture(tree: &Tree, id: NodeId) -> bool {
    let referenced = tree.referenced_captures();
    tree.preorder_from(id).into_iter().any(|n| {
        tree.kind(n)
            .capture_number()
            .is_some_and(|c| referenced.contains(&c))
    })
}

impl PatternRule for ConsecutiveQuantifiersLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &CONSECUTIVE_QUANTIFIERS
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        tree.preorder().into_iter().find_map(|id| {
            let inner = mergeable_pair(tree, id)?;
            Some(Finding::new(
                &CONSECUTIVE_QUANTIFIERS,
                vec![id, inner],
                tree.span(id),
            ))
        })
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let outer = target(tree, finding, NodeKind::is_quantifier)?;
        let inner = mergeable_pair(tree, outer)
            .filter(|&inner| finding.affected.get(1) == Some(&inner))
            .ok_or_else(|| {
                RegexClippyError::stale(CONSECUTIVE_QUANTIFIERS.name, "quantifiers no longer merge")
            })?;

        let greedy = tree.kind(outer).is_greedy();
        let (Some(outer_bounds), Some(inner_bounds)) =
            (tree.kind(outer).bounds(), tree.kind(inner).bounds())
        else {
            return Ok(false);
        };
        let Some(merged) = merge_bounds(outer_bounds, inner_bounds) else {
            return Ok(false);
        };

        if merged == Bounds::exact(0) {
            tree.delete(outer);
            tree.renumber_captures();
            return Ok(true);
        }

        *tree.kind_mut(inner) = merged.to_kind(greedy);
        if let Some(holder) = tree.parent(inner) {
            let index = tree.index_in_parent(inner).unwrap_or_default();
            tree.take_operand(holder, index);
        }
        let span = tree.span(outer);
        tree.replace(outer, inner);
        tree.free(outer);
        tree.widen_span(inner, span);
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
    fn repeated_assertions_keep_the_first() {
        let tree = parse_regex("a^^b").unwrap();
        let finding = RepeatedAssertionsLint.detect(&tree).unwrap();
        assert_eq!(finding.span, Span::new(2, 3));
        assert_eq!(fix(&RepeatedAssertionsLint, "a^^b"), "a^b");
        assert_eq!(fix(&RepeatedAssertionsLint, "\\b\\bx"), "\\bx");
        assert!(!fires(&RepeatedAssertionsLint, "^$"));
        assert!(!fires(&RepeatedAssertionsLint, "^a^"));
    }

    #[test]
    fn empty_grouping_removed_by_context() {
        assert_eq!(fix(&EmptyGroupingLint, "(?:)a"), "a");
        assert_eq!(fix(&EmptyGroupingLint, "a(?:)*b"), "ab");
        assert_eq!(fix(&EmptyGroupingLint, "a|(?:)"), "a|");
        assert!(!fires(&EmptyGroupingLint, "()a"));
    }

    #[test]
    fn useless_grouping_respects_precedence() {
        assert_eq!(fix(&UselessGroupingLint, "(?:ab)"), "ab");
        assert_eq!(fix(&UselessGroupingLint, "x(?:ab)y"), "xaby");
        assert_eq!(fix(&UselessGroupingLint, "(?:a)*"), "a*");
        assert_eq!(fix(&UselessGroupingLint, "a|(?:b|c)"), "a|b|c");
        assert_eq!(fix(&UselessGroupingLint, "((?:a|b))"), "(a|b)");
        assert!(!fires(&UselessGroupingLint, "x(?:a|b)"));
        assert!(!fires(&UselessGroupingLint, "(?:ab)*"));
    }

    #[test]
    fn empty_subpattern_takes_its_backreferences_along() {
        assert_eq!(fix(&EmptySubpatternLint, "()a\\1(b)\\2"), "a(b)\\1");
        assert_eq!(fix(&EmptySubpatternLint, "x()+"), "x");
    }

    #[test]
    fn useless_subpattern_renumbers() {
        assert_eq!(fix(&UselessSubpatternLint, "(a)(b)\\2"), "a(b)\\1");
        assert!(!fires(&UselessSubpatternLint, "(ab)*"));
    }

    #[test]
    fn single_char_class_loses_brackets() {
        assert_eq!(fix(&SingleCharCharsetLint, "[a]b"), "ab");
        assert_eq!(fix(&SingleCharCharsetLint, "[.]"), "\\.");
        assert_eq!(fix(&SingleCharCharsetLint, "[aa]"), "a");
        assert!(!fires(&SingleCharCharsetLint, "[^a]"));
        assert!(!fires(&SingleCharCharsetLint, "[ab]"));
    }

    #[test]
    fn single_char_branches_merge_into_a_class() {
        assert_eq!(fix(&AlternationOfSingleCharsLint, "a|b|c"), "[abc]");
        assert_eq!(fix(&AlternationOfSingleCharsLint, "a|xy|[0-9]"), "[a0-9]|xy");
        assert_eq!(fix(&AlternationOfSingleCharsLint, "\\d|a|a"), "[a\\d]");
        assert_eq!(fix(&AlternationOfSingleCharsLint, "c|b|a"), "[abc]");
        assert!(!fires(&AlternationOfSingleCharsLint, "a|."));
        assert!(!fires(&AlternationOfSingleCharsLint, "a|[^b]"));
    }

    #[test]
    fn merged_branch_keeps_first_identity() {
        let mut tree = parse_regex("x(?:a|b)").unwrap();
        let finding = AlternationOfSingleCharsLint.detect(&tree).unwrap();
        let first = finding.affected[0];
        AlternationOfSingleCharsLint.apply(&mut tree, &finding).unwrap();
        assert!(tree.contains(first));
        assert_eq!(tree.render_node(first), "[ab]");
        assert_eq!(tree.render(), "x(?:[ab])");
    }

    #[test]
    fn braced_quantifiers_with_shorthand() {
        assert_eq!(fix(&QuantifierShorthandLint, "a{0,}"), "a*");
        assert_eq!(fix(&QuantifierShorthandLint, "a{1,}?"), "a+?");
        assert_eq!(fix(&QuantifierShorthandLint, "a{0,1}"), "a?");
        assert!(!fires(&QuantifierShorthandLint, "a{2,}"));
    }

    #[test]
    fn trivial_quantifier_unwrapped() {
        assert_eq!(fix(&TrivialQuantifierLint, "a{1,1}"), "a");
        assert_eq!(fix(&TrivialQuantifierLint, "x(?:ab){1}"), "x(?:ab)");
        assert!(!fires(&TrivialQuantifierLint, "a{1,2}"));
    }

    #[test]
    fn empty_branch_becomes_optional() {
        assert_eq!(fix(&AltEpsilonToOptionalQuantLint, "(?:a|)"), "(?:a)?");
        assert_eq!(fix(&AltEpsilonToOptionalQuantLint, "a|"), "a?");
        assert_eq!(fix(&AltEpsilonToOptionalQuantLint, "|a"), "a??");
        assert_eq!(fix(&AltEpsilonToOptionalQuantLint, "x(a|bc|)"), "x((?:a|bc)?)");
        assert_eq!(fix(&AltEpsilonToOptionalQuantLint, "x(?:|)"), "x(?:)");
        assert!(!fires(&AltEpsilonToOptionalQuantLint, "(?:a|)*"));
    }

    #[test]
    fn optional_alternation_gains_empty_branch() {
        assert_eq!(fix(&OptionalQuantToAltEpsilonLint, "(?:a|b)?"), "(?:a|b|)");
        assert_eq!(fix(&OptionalQuantToAltEpsilonLint, "x(?:a|b)??"), "x(?:|a|b)");
        assert!(!fires(&OptionalQuantToAltEpsilonLint, "(?:ab)?"));
    }

    #[test]
    fn bounds_merge_only_without_gaps() {
        let star = Bounds::new(0, None);
        let plus = Bounds::new(1, None);
        let opt = Bounds::new(0, Some(1));
        assert_eq!(merge_bounds(star, plus), Some(star));
        assert_eq!(merge_bounds(plus, opt), Some(star));
        assert_eq!(merge_bounds(Bounds::exact(3), Bounds::exact(2)), Some(Bounds::exact(6)));
        assert_eq!(
            merge_bounds(Bounds::new(1, Some(2)), Bounds::new(2, Some(3))),
            Some(Bounds::new(2, Some(6)))
        );
        assert_eq!(merge_bounds(star, Bounds::exact(2)), None);
        assert_eq!(merge_bounds(Bounds::new(1, Some(2)), Bounds::exact(3)), None);
        assert_eq!(merge_bounds(Bounds::exact(2), plus), None);
        assert_eq!(merge_bounds(Bounds::exact(0), plus), Some(Bounds::exact(0)));
    }

    #[test]
    fn nested_quantifiers_collapse() {
        assert_eq!(fix(&ConsecutiveQuantifiersLint, "(?:a{2}){3}"), "a{6}");
        assert_eq!(fix(&ConsecutiveQuantifiersLint, "x(?:a+)*"), "xa*");
        assert_eq!(fix(&ConsecutiveQuantifiersLint, "x(?:b?){0}y"), "xy");
        assert!(!fires(&ConsecutiveQuantifiersLint, "(?:a+?)*"));
        assert!(!fires(&ConsecutiveQuantifiersLint, "(?:a{2})*"));
        assert!(!fires(&ConsecutiveQuantifiersLint, "(?:(a)?){0}\\1"));
    }

    #[test]
    fn zero_repetition_drops_unreferenced_captures() {
        assert_eq!(fix(&ConsecutiveQuantifiersLint, "(?:(a)?){0}(b)\\2"), "(b)\\1");
        assert_eq!(fix(&ConsecutiveQuantifiersLint, "x(?:(a)?){0}"), "x");
    }
}
