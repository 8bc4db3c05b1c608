//! Common-subexpression folding: `abab` becomes `(?:ab){2}`, `(?:ab)+ab`
//! becomes `(?:ab){2,}`.
//!
//! The folder works on the normalized tree. Inside each concatenation it
//! looks for a block of consecutive operands followed immediately by more
//! occurrences of itself, where an occurrence is either the literal run of
//! operands, a group whose body is the block, or a chain of quantifiers
//! over the block (counted with the product of their bounds). The whole run
//! becomes one copy under a synthesized quantifier whose bounds are the sum
//! of the occurrences' bounds.

use crate::ast::{Bounds, NodeId, NodeKind, Span, SubexprKind, Tree};
use crate::lint::LintSettings;
use crate::normalize::{NormalizeReport, Normalizer};
use crate::rules::TrivialQuantifierLint;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Occurrence {
    /// The block's operands, written out.
    Literal,
    /// `(?:block)`
    Group,
    /// `(?:block){m,n}` or `atom{m,n}`
    Quantified,
}

#[derive(Debug, Clone, Copy)]
struct Unit {
    width: usize,
    occurrence: Occurrence,
    bounds: Bounds,
    greedy: bool,
}

#[derive(Debug, Clone)]
struct Block {
    keys: Vec<String>,
    leaves: usize,
}

impl Block {
    /// `abab` is `ab` twice; folding it would hide the shorter period.
    fn is_periodic(&self) -> bool {
        let len = self.keys.len();
        (1..len)
            .filter(|p| len % p == 0)
            .any(|p| (p..len).all(|i| self.keys[i] == self.keys[i % p]))
    }
}

/// A fold found in a normalized tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldPlan {
    pub concat: NodeId,
    pub start: usize,
    /// Operands of `concat` the run covers, in order.
    pub covered: Vec<NodeId>,
    pub bounds: Bounds,
    pub greedy: bool,
    pub span: Span,
    first_width: usize,
    first: Occurrence,
}

pub struct Folder {
    normalizer: Normalizer,
}

impl Default for Folder {
    fn default() -> Self {
        Self::new(LintSettings::default())
    }
}

impl Folder {
    pub fn new(settings: LintSettings) -> Self {
        Self {
            normalizer: Normalizer::new(settings),
        }
    }

    /// The normalized tree plans are made against. Deterministic, so the
    /// same input always yields the same node ids.
    pub fn prepare(&self, tree: Tree) -> Tree {
        self.normalizer.normalize(tree).tree
    }

    /// First foldable run in pre-order, if any.
    pub fn plan(tree: &Tree) -> Option<FoldPlan> {
        let referenced: HashSet<u32> = tree.referenced_captures().into_iter().collect();
        tree.preorder()
            .into_iter()
            .filter(|&id| *tree.kind(id) == NodeKind::Concat)
            .find_map(|concat| plan_in_concat(tree, concat, &referenced))
    }

    pub fn apply_plan(&self, tree: &mut Tree, plan: &FoldPlan) {
        let detached: Vec<NodeId> = plan
            .covered
            .iter()
            .map(|_| tree.take_operand(plan.concat, plan.start))
            .collect();
        let (first, rest) = detached.split_at(plan.first_width);

        let mut body = match plan.first {
            Occurrence::Literal if first.len() > 1 => {
                let span = spans(tree, first);
                tree.alloc_with(NodeKind::Concat, span, first.to_vec())
            }
            Occurrence::Literal | Occurrence::Group => first[0],
            Occurrence::Quantified => {
                let outer = first[0];
                let inner = match unwrap_chain(tree, outer) {
                    Some(chain) => chain.body,
                    None => tree.operand(outer),
                };
                if let Some(holder) = tree.parent(inner) {
                    let index = tree.index_in_parent(inner).unwrap_or_default();
                    tree.take_operand(holder, index);
                }
                tree.free(outer);
                inner
            }
        };
        for &node in rest {
            tree.free(node);
        }
        if !tree.kind(body).is_atom() {
            let span = tree.span(body);
            body = tree.alloc_with(NodeKind::Subexpr(SubexprKind::Grouping), span, vec![body]);
        }

        let quant = tree.alloc_with(plan.bounds.to_kind(plan.greedy), plan.span, vec![body]);
        tree.insert_operand(plan.concat, plan.start, quant);
        tree.collapse_trivial(plan.concat);
        debug!(bounds = ?plan.bounds, pattern = %tree.render(), "folded repeated run");

        let mut report = NormalizeReport::default();
        self.normalizer
            .run_rule(tree, &TrivialQuantifierLint, &mut report);
        self.normalizer.reduce(tree, &mut report);
        tree.renumber_captures();
    }

    /// Normalize, then fold the first repeated run. `None` when nothing
    /// repeats.
    pub fn fold(&self, tree: Tree) -> Option<Tree> {
        let mut tree = self.prepare(tree);
        let plan = Self::plan(&tree)?;
        self.apply_plan(&mut tree, &plan);
        Some(tree)
    }
}

fn spans(tree: &Tree, ids: &[NodeId]) -> Span {
    ids.iter()
        .map(|&id| tree.span(id))
        .reduce(Span::union)
        .unwrap_or_default()
}

fn plan_in_concat(tree: &Tree, concat: NodeId, referenced: &HashSet<u32>) -> Option<FoldPlan> {
    let operands = tree.operands(concat);
    let keys: Vec<String> = operands.iter().map(|&o| tree.render_node(o)).collect();

    for start in 0..operands.len() {
        let mut blocks = Vec::new();
        if let Some(block) = body_block(tree, operands[start]) {
            blocks.push(block);
        }
        for len in 1..operands.len() - start {
            let run = &operands[start..start + len];
            blocks.push(Block {
                keys: keys[start..start + len].to_vec(),
                leaves: run.iter().map(|&o| tree.leaf_count(o)).sum(),
            });
        }

        for block in blocks {
            if let Some(plan) = scan_run(tree, concat, &keys, start, &block, referenced) {
                return Some(plan);
            }
        }
    }
    None
}

/// What sits under a run of groups and quantifiers: the body and, when any
/// quantifier was crossed, the product of their bounds with the shared
/// greediness.
struct Chain {
    body: NodeId,
    repeat: Option<(Bounds, bool)>,
}

/// `None` when `id` is neither a group nor a quantifier, or when the
/// quantifiers along the way disagree on greediness.
fn unwrap_chain(tree: &Tree, id: NodeId) -> Option<Chain> {
    let mut cur = id;
    let mut repeat: Option<(Bounds, bool)> = None;
    loop {
        let kind = tree.kind(cur);
        if let Some(bounds) = kind.bounds() {
            let greedy = kind.is_greedy();
            repeat = match repeat {
                None => Some((bounds, greedy)),
                Some((outer, g)) if g == greedy => Some((outer.mul(bounds), g)),
                Some(_) => return None,
            };
        } else if !kind.is_grouping() {
            break;
        }
        cur = tree.operand(cur);
    }
    (cur != id).then_some(Chain { body: cur, repeat })
}

/// The operand sequence inside a group or quantifier chain, as a block.
fn body_block(tree: &Tree, id: NodeId) -> Option<Block> {
    let inner = unwrap_chain(tree, id)?.body;
    let keys = if *tree.kind(inner) == NodeKind::Concat {
        tree.operands(inner)
            .iter()
            .map(|&o| tree.render_node(o))
            .collect()
    } else {
        vec![tree.render_node(inner)]
    };
    Some(Block {
        keys,
        leaves: tree.leaf_count(inner),
    })
}

fn scan_run(
    tree: &Tree,
    concat: NodeId,
    keys: &[String],
    start: usize,
    block: &Block,
    referenced: &HashSet<u32>,
) -> Option<FoldPlan> {
    let operands = tree.operands(concat);
    let len = block.keys.len();
    let mut units = Vec::new();
    let mut at = start;

    while at < operands.len() {
        if keys.get(at..at + len) == Some(block.keys.as_slice()) {
            units.push(Unit {
                width: len,
                occurrence: Occurrence::Literal,
                bounds: Bounds::ONE,
                greedy: true,
            });
            at += len;
            continue;
        }
        let op = operands[at];
        let chain = unwrap_chain(tree, op);
        match (body_block(tree, op), chain) {
            (Some(body), Some(chain)) if body.keys == block.keys => {
                units.push(match chain.repeat {
                    Some((bounds, greedy)) => Unit {
                        width: 1,
                        occurrence: Occurrence::Quantified,
                        bounds,
                        greedy,
                    },
                    None => Unit {
                        width: 1,
                        occurrence: Occurrence::Group,
                        bounds: Bounds::ONE,
                        greedy: true,
                    },
                });
                at += 1;
            }
            _ => break,
        }
    }

    if units.len() < 2 || block.is_periodic() {
        return None;
    }
    let quantified: Vec<&Unit> = units
        .iter()
        .filter(|u| u.occurrence == Occurrence::Quantified)
        .collect();
    if block.leaves < 2 && quantified.is_empty() {
        return None;
    }
    if let Some(first) = quantified.first() {
        let same_greed = quantified.iter().all(|u| u.greedy == first.greedy);
        let compatible = quantified.iter().all(|u| u.bounds.is_unbounded())
            || quantified.iter().all(|u| u.bounds == first.bounds);
        if !same_greed || !compatible {
            return None;
        }
    }

    let width: usize = units.iter().map(|u| u.width).sum();
    let covered = operands[start..start + width].to_vec();
    // A backreference into the run would see only the last repetition.
    let touches_reference = covered.iter().any(|&id| {
        tree.preorder_from(id).into_iter().any(|n| {
            tree.kind(n)
                .capture_number()
                .is_some_and(|c| referenced.contains(&c))
        })
    });
    if touches_reference {
        return None;
    }

    Some(FoldPlan {
        concat,
        start,
        span: spans(tree, &covered),
        covered,
        bounds: units
            .iter()
            .fold(Bounds::exact(0), |acc, u| acc.add(u.bounds)),
        greedy: quantified.first().is_none_or(|u| u.greedy),
        first_width: units[0].width,
        first: units[0].occurrence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_regex;

    fn fold(source: &str) -> Option<String> {
        Folder::default()
            .fold(parse_regex(source).expect("pattern should parse"))
            .map(|tree| tree.render())
    }

    #[test]
    fn folds_literal_runs() {
        assert_eq!(fold("(abc)(abc)(abc)").as_deref(), Some("(abc){3}"));
        assert_eq!(fold("xabababy").as_deref(), Some("x(?:ab){3}y"));
        assert_eq!(fold("\\d\\d-\\d\\d").as_deref(), None);
    }

    #[test]
    fn merges_with_quantified_occurrence() {
        assert_eq!(fold("(?:ab)+ab").as_deref(), Some("(?:ab){2,}"));
        assert_eq!(fold("ab(?:ab)*").as_deref(), Some("(?:ab)+"));
        assert_eq!(fold("a+a").as_deref(), Some("a{2,}"));
        assert_eq!(fold("(?:ab){2}ab(?:ab){2}").as_deref(), Some("(?:ab){5}"));
    }

    #[test]
    fn nested_quantifiers_multiply_into_the_count() {
        assert_eq!(fold("(?:(?:ab){2}){2,3}ab").as_deref(), Some("(?:ab){5,7}"));
        assert_eq!(fold("x(?:(?:ab)+?)??ab").as_deref(), None);
    }

    #[test]
    fn incompatible_bounds_are_rejected() {
        assert_eq!(fold("(?:ab){2}(?:ab)+").as_deref(), None);
        assert_eq!(fold("(?:ab)+?(?:ab)+").as_deref(), None);
    }

    #[test]
    fn single_leaf_and_periodic_blocks_are_skipped() {
        assert_eq!(fold("aa").as_deref(), None);
        assert_eq!(fold("aaaa").as_deref(), None);
    }

    #[test]
    fn referenced_captures_block_the_fold() {
        assert_eq!(fold("(ab)(ab)\\1").as_deref(), None);
        assert_eq!(fold("(ab)(ab)(c)\\3").as_deref(), Some("(ab){2}(c)\\2"));
    }

    #[test]
    fn nothing_repeats() {
        assert_eq!(fold("abc").as_deref(), None);
        assert_eq!(fold("").as_deref(), None);
    }

    #[test]
    fn plan_reports_covered_operands() {
        let tree = Folder::default().prepare(parse_regex("xyxy").unwrap());
        let plan = Folder::plan(&tree).expect("run should be found");
        assert_eq!(plan.covered.len(), 4);
        assert_eq!(plan.bounds, Bounds::exact(2));
        assert_eq!(plan.span, Span::new(0, 4));
    }
}
