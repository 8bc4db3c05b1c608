use crate::ast::{AssertKind, NodeId, NodeKind, Tree};
use crate::diagnostics::Finding;
use crate::error::{ClippyResult, RegexClippyError};
use crate::lint::{FixDescriptor, MessageKeys, PatternRule, RuleCategory, RuleDescriptor, RuleGroup};

use super::util::{
    adjacent_leaf, at_pattern_end, at_pattern_start, first_node, is_assert, multiline, target,
};

// ============================================================================
// NullableRegexLint
// ============================================================================

pub struct NullableRegexLint;

static NULLABLE_REGEX: RuleDescriptor = RuleDescriptor {
    name: "nullable_regex",
    category: RuleCategory::Error,
    description: "The whole pattern can match the empty string",
    group: RuleGroup::Stable,
    fix: FixDescriptor::none(),
    keys: MessageKeys::new("nullable_regex.problem", "nullable_regex.solve"),
};

impl PatternRule for NullableRegexLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &NULLABLE_REGEX
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        let root = tree.root()?;
        tree.nullable(root)
            .then(|| Finding::for_node(&NULLABLE_REGEX, tree, root))
    }

    fn apply(&self, _tree: &mut Tree, _finding: &Finding) -> ClippyResult<bool> {
        Ok(false)
    }
}

// ============================================================================
// UselessCircumflexLint
// ============================================================================

/// `^` after something that must consume input can never match (outside
/// multiline mode).
pub struct UselessCircumflexLint;

static USELESS_CIRCUMFLEX: RuleDescriptor = RuleDescriptor {
    name: "useless_circumflex_assertion",
    category: RuleCategory::Error,
    description: "`^` placed after input that must be consumed can never match",
    group: RuleGroup::Stable,
    fix: FixDescriptor::unsafe_fix("Delete the anchor"),
    keys: MessageKeys::new(
        "useless_circumflex_assertion.problem",
        "useless_circumflex_assertion.solve",
    ),
};

impl PatternRule for UselessCircumflexLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &USELESS_CIRCUMFLEX
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        if multiline(tree) {
            return None;
        }
        let id = first_node(tree, |id| {
            is_assert(tree, id, AssertKind::Circumflex) && useless_circumflex(tree, id)
        })?;
        Some(Finding::for_node(&USELESS_CIRCUMFLEX, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let id = target(tree, finding, |k| {
            *k == NodeKind::Assert(AssertKind::Circumflex)
        })?;
        if !useless_circumflex(tree, id) {
            return Err(RegexClippyError::stale(
                USELESS_CIRCUMFLEX.name,
                "anchor can now match at the start of input",
            ));
        }
        tree.delete(id);
        Ok(true)
    }
}

// ============================================================================
// UselessDollarLint
// ============================================================================

pub struct UselessDollarLint;

static USELESS_DOLLAR: RuleDescriptor = RuleDescriptor {
    name: "useless_dollar_assertion",
    category: RuleCategory::Error,
    description: "`$` placed before input that must be consumed can never match",
    group: RuleGroup::Stable,
    fix: FixDescriptor::unsafe_fix("Delete the anchor"),
    keys: MessageKeys::new(
        "useless_dollar_assertion.problem",
        "useless_dollar_assertion.solve",
    ),
};

impl PatternRule for UselessDollarLint {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &USELESS_DOLLAR
    }

    fn detect(&self, tree: &Tree) -> Option<Finding> {
        if multiline(tree) {
            return None;
        }
        let id = first_node(tree, |id| {
            is_assert(tree, id, AssertKind::Dollar) && useless_dollar(tree, id)
        })?;
        Some(Finding::for_node(&USELESS_DOLLAR, tree, id))
    }

    fn apply(&self, tree: &mut Tree, finding: &Finding) -> ClippyResult<bool> {
        let id = target(tree, finding, |k| *k == NodeKind::Assert(AssertKind::Dollar))?;
        if !useless_dollar(tree, id) {
            return Err(RegexClippyError::stale(
                USELESS_DOLLAR.name,
                "anchor can now match at the end of input",
            ));
        }
        tree.delete(id);
        Ok(true)
    }
}

/// `^` that input must precede, and not the second of a `^^` pair.
fn useless_circumflex(tree: &Tree, id: NodeId) -> bool {
    !at_pattern_start(tree, id)
        && !adjacent_leaf(tree, id, true)
            .is_some_and(|prev| is_assert(tree, prev, AssertKind::Circumflex))
}

fn useless_dollar(tree: &Tree, id: NodeId) -> bool {
    !at_pattern_end(tree, id)
        && !adjacent_leaf(tree, id, false)
            .is_some_and(|next| is_assert(tree, next, AssertKind::Dollar))
}
