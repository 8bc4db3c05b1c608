use crate::ast::{AssertKind, NodeId, NodeKind, OpaqueKind, SubexprKind, Tree};
use crate::diagnostics::Finding;
use crate::error::{ClippyResult, RegexClippyError};

/// First node in pre-order satisfying `pred`.
pub(crate) fn first_node(tree: &Tree, mut pred: impl FnMut(NodeId) -> bool) -> Option<NodeId> {
    tree.preorder().into_iter().find(|&id| pred(id))
}

/// The finding's target node, provided it is still live and still has the
/// shape the rule matched.
pub(crate) fn target(
    tree: &Tree,
    finding: &Finding,
    check: impl FnOnce(&NodeKind) -> bool,
) -> ClippyResult<NodeId> {
    let rule = finding.rule.name;
    let id = finding
        .target()
        .ok_or_else(|| RegexClippyError::stale(rule, "finding names no nodes"))?;
    if !tree.contains(id) {
        return Err(RegexClippyError::stale(rule, format!("node {id} is gone")));
    }
    let kind = tree.kind(id);
    if !check(kind) {
        return Err(RegexClippyError::stale(
            rule,
            format!("node {id} is now a {}", kind.name()),
        ));
    }
    Ok(id)
}

pub(crate) fn parent_kind(tree: &Tree, id: NodeId) -> Option<&NodeKind> {
    tree.parent(id).map(|p| tree.kind(p))
}

/// Descend through non-capturing groups.
pub(crate) fn strip_groupings(tree: &Tree, mut id: NodeId) -> NodeId {
    while tree.kind(id).is_grouping() {
        id = tree.operand(id);
    }
    id
}

/// Whether the parentheses of subexpression `id` can go without changing
/// how the rest of the pattern parses.
pub(crate) fn parens_removable(tree: &Tree, id: NodeId) -> bool {
    let child = tree.kind(tree.operand(id));
    let Some(parent) = tree.parent(id) else {
        return true;
    };
    match tree.kind(parent) {
        NodeKind::Concat => *child != NodeKind::Alternation,
        NodeKind::Alternation | NodeKind::Subexpr(_) => true,
        k if k.is_quantifier() => child.is_atom(),
        _ => false,
    }
}

/// Whether `id` sits under a quantifier with lower bound 0, directly or
/// through non-capturing groups.
pub(crate) fn under_optional_quantifier(tree: &Tree, id: NodeId) -> bool {
    let mut cur = id;
    while let Some(parent) = tree.parent(cur) {
        let kind = tree.kind(parent);
        if kind.is_grouping() {
            cur = parent;
            continue;
        }
        return kind.bounds().is_some_and(|b| b.low == 0);
    }
    false
}

/// Whether a match can arrive at `id` having consumed nothing before it.
pub(crate) fn at_pattern_start(tree: &Tree, id: NodeId) -> bool {
    reachable_from_edge(tree, id, true)
}

/// Whether a match can leave `id` and consume nothing after it.
pub(crate) fn at_pattern_end(tree: &Tree, id: NodeId) -> bool {
    reachable_from_edge(tree, id, false)
}

fn reachable_from_edge(tree: &Tree, id: NodeId, leading: bool) -> bool {
    let mut cur = id;
    while let Some(parent) = tree.parent(cur) {
        match tree.kind(parent) {
            NodeKind::Concat => {
                let operands = tree.operands(parent);
                let index = tree.index_in_parent(cur).unwrap_or_default();
                let siblings = if leading {
                    &operands[..index]
                } else {
                    &operands[index + 1..]
                };
                if !siblings.iter().all(|&s| tree.nullable(s)) {
                    return false;
                }
            }
            // Inside a lookaround the position is relative to where it runs.
            NodeKind::Subexpr(SubexprKind::Lookaround { .. }) => return true,
            _ => {}
        }
        cur = parent;
    }
    true
}

/// Whether some option setting turns on multiline mode, where `^` and `$`
/// also match around newlines.
pub(crate) fn multiline(tree: &Tree) -> bool {
    tree.preorder().into_iter().any(|id| match tree.kind(id) {
        NodeKind::Opaque(OpaqueKind::Options(flags))
        | NodeKind::Subexpr(SubexprKind::Modifier(flags)) => {
            flags.split('-').next().is_some_and(|on| on.contains('m'))
        }
        _ => false,
    })
}

/// Neighbouring non-empty leaf in document order.
pub(crate) fn adjacent_leaf(tree: &Tree, id: NodeId, before: bool) -> Option<NodeId> {
    let leaves: Vec<NodeId> = tree
        .leaves()
        .into_iter()
        .filter(|&l| !tree.kind(l).is_empty_leaf())
        .collect();
    let index = leaves.iter().position(|&l| l == id)?;
    if before {
        index.checked_sub(1).map(|i| leaves[i])
    } else {
        leaves.get(index + 1).copied()
    }
}

pub(crate) fn is_assert(tree: &Tree, id: NodeId, kind: AssertKind) -> bool {
    *tree.kind(id) == NodeKind::Assert(kind)
}

/// Delete `id`, taking a quantifier that directly wraps it along.
pub(crate) fn delete_with_quantifier(tree: &mut Tree, id: NodeId) {
    match tree.parent(id) {
        Some(parent) if tree.kind(parent).is_quantifier() => tree.delete(parent),
        _ => tree.delete(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_regex;

    fn find(tree: &Tree, text: &str) -> NodeId {
        first_node(tree, |id| tree.render_node(id) == text).expect("node should exist")
    }

    #[test]
    fn edge_reachability_skips_nullable_siblings() {
        let tree = parse_regex("a?^b$c*").unwrap();
        assert!(at_pattern_start(&tree, find(&tree, "^")));
        assert!(!at_pattern_start(&tree, find(&tree, "$")));
        assert!(at_pattern_end(&tree, find(&tree, "$")));
        assert!(!at_pattern_end(&tree, find(&tree, "^")));
    }

    #[test]
    fn parens_removability_follows_precedence() {
        let tree = parse_regex("x(?:a|b)(?:cd)*(?:e)+").unwrap();
        assert!(!parens_removable(&tree, find(&tree, "(?:a|b)")));
        assert!(!parens_removable(&tree, find(&tree, "(?:cd)")));
        assert!(parens_removable(&tree, find(&tree, "(?:e)")));
    }

    #[test]
    fn optional_quantifier_seen_through_groups() {
        let tree = parse_regex("(?:(?:a|))?").unwrap();
        assert!(under_optional_quantifier(&tree, find(&tree, "a|")));
        let tree = parse_regex("(a|)?").unwrap();
        assert!(!under_optional_quantifier(&tree, find(&tree, "a|")));
    }

    #[test]
    fn detects_multiline_flag() {
        assert!(multiline(&parse_regex("(?m)^a").unwrap()));
        assert!(!multiline(&parse_regex("(?i-m)^a").unwrap()));
    }
}
