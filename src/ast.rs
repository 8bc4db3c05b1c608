//! Arena-backed regex syntax tree.
//!
//! Nodes live in a flat arena addressed by [`NodeId`]. The id doubles as the
//! node's stable identity: slots are never reused inside one tree, so an id
//! recorded while detecting a pattern still names the same node when the
//! rewrite runs. Every node stores its parent link, and the splicing helpers
//! below keep those links and the byte spans consistent after each edit.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Stable identity of a node inside one [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Half-open byte range `[start, end)` into the original regex source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `pos`, used for empty leaves.
    pub const fn empty_at(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// First byte covered (inclusive).
    pub fn first(&self) -> usize {
        self.start
    }

    /// Last byte covered (inclusive). Zero-width spans report their anchor.
    pub fn last(&self) -> usize {
        self.end.max(self.start + 1) - 1
    }

    #[must_use]
    pub fn union(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Backslash shorthand classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Shorthand {
    Digit,
    NotDigit,
    Word,
    NotWord,
    Space,
    NotSpace,
}

impl Shorthand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shorthand::Digit => "\\d",
            Shorthand::NotDigit => "\\D",
            Shorthand::Word => "\\w",
            Shorthand::NotWord => "\\W",
            Shorthand::Space => "\\s",
            Shorthand::NotSpace => "\\S",
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        Some(match letter {
            'd' => Shorthand::Digit,
            'D' => Shorthand::NotDigit,
            'w' => Shorthand::Word,
            'W' => Shorthand::NotWord,
            's' => Shorthand::Space,
            'S' => Shorthand::NotSpace,
            _ => return None,
        })
    }
}

/// One member of a character class. The derived order is the canonical
/// member order of a merged class.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClassItem {
    Char(char),
    Range(char, char),
    Shorthand(Shorthand),
    /// The `.` metacharacter. Only ever appears alone in an unbracketed set.
    Any,
}

/// Character-matching leaf: a literal, `.`, a shorthand or a bracketed class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charset {
    pub negated: bool,
    pub bracketed: bool,
    pub items: Vec<ClassItem>,
}

impl Charset {
    pub fn literal(c: char) -> Self {
        Self {
            negated: false,
            bracketed: false,
            items: vec![ClassItem::Char(c)],
        }
    }

    pub fn any() -> Self {
        Self {
            negated: false,
            bracketed: false,
            items: vec![ClassItem::Any],
        }
    }

    pub fn shorthand(class: Shorthand) -> Self {
        Self {
            negated: false,
            bracketed: false,
            items: vec![ClassItem::Shorthand(class)],
        }
    }

    pub fn has_any(&self) -> bool {
        self.items.contains(&ClassItem::Any)
    }

    /// The single character this set denotes, if every member names the same one.
    pub fn single_char(&self) -> Option<char> {
        let mut found = None;
        for item in &self.items {
            let c = match item {
                ClassItem::Char(c) => *c,
                ClassItem::Range(lo, hi) if lo == hi => *lo,
                _ => return None,
            };
            match found {
                None => found = Some(c),
                Some(prev) if prev == c => {}
                Some(_) => return None,
            }
        }
        found
    }

    /// Non-negated set whose members are all whitespace.
    pub fn is_space_like(&self) -> bool {
        !self.negated
            && !self.items.is_empty()
            && self.items.iter().all(|item| match item {
                ClassItem::Char(c) => c.is_whitespace(),
                ClassItem::Shorthand(Shorthand::Space) => true,
                _ => false,
            })
    }

    pub fn contains_literal_space(&self) -> bool {
        self.items.iter().any(|item| match item {
            ClassItem::Char(' ') => true,
            ClassItem::Range(lo, hi) => *lo == ' ' && *hi == ' ',
            _ => false,
        })
    }
}

/// Zero-width simple assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssertKind {
    Circumflex,
    Dollar,
    WordBoundary,
    NotWordBoundary,
    SubjectStart,
    SubjectEnd,
    SubjectEndOrNewline,
    FirstMatch,
}

impl AssertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssertKind::Circumflex => "^",
            AssertKind::Dollar => "$",
            AssertKind::WordBoundary => "\\b",
            AssertKind::NotWordBoundary => "\\B",
            AssertKind::SubjectStart => "\\A",
            AssertKind::SubjectEnd => "\\z",
            AssertKind::SubjectEndOrNewline => "\\Z",
            AssertKind::FirstMatch => "\\G",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKind {
    Empty,
}

/// Parenthesized operator kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubexprKind {
    Capturing(u32),
    Grouping,
    Atomic,
    Lookaround { ahead: bool, negative: bool },
    /// `(?flags:...)`: a group that also switches options.
    Modifier(String),
}

/// Leaves the engine never looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OpaqueKind {
    SubexprCall(u32),
    Recursion,
    Control(String),
    Options(String),
}

/// Repetition bounds; `high == None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub low: u32,
    pub high: Option<u32>,
}

impl Bounds {
    pub const ONE: Bounds = Bounds::exact(1);

    pub const fn new(low: u32, high: Option<u32>) -> Self {
        Self { low, high }
    }

    pub const fn exact(n: u32) -> Self {
        Self::new(n, Some(n))
    }

    pub fn is_unbounded(&self) -> bool {
        self.high.is_none()
    }

    pub fn is_exact(&self) -> bool {
        self.high == Some(self.low)
    }

    /// Bounds of `x{self}` followed by `x{other}`.
    #[must_use]
    pub fn add(self, other: Bounds) -> Bounds {
        let high = match (self.high, other.high) {
            (Some(a), Some(b)) => Some(a.saturating_add(b)),
            _ => None,
        };
        Bounds::new(self.low.saturating_add(other.low), high)
    }

    /// Elementwise product, with `inf * 0 = 0` and `inf * n = inf` for `n >= 1`.
    #[must_use]
    pub fn mul(self, other: Bounds) -> Bounds {
        let high = match (self.high, other.high) {
            (Some(a), Some(b)) => Some(a.saturating_mul(b)),
            (Some(0), None) | (None, Some(0)) => Some(0),
            _ => None,
        };
        Bounds::new(self.low.saturating_mul(other.low), high)
    }

    /// Quantifier node for these bounds, written as shorthand when one exists.
    pub fn to_kind(self, greedy: bool) -> NodeKind {
        let brace = !matches!((self.low, self.high), (0, None) | (1, None) | (0, Some(1)));
        self.to_kind_braced(greedy, brace)
    }

    /// Quantifier node for these bounds with an explicit written form.
    pub fn to_kind_braced(self, greedy: bool, brace: bool) -> NodeKind {
        match self.high {
            Some(high) => NodeKind::FiniteQuant {
                low: self.low,
                high,
                greedy,
                brace,
            },
            None => NodeKind::InfiniteQuant {
                low: self.low,
                greedy,
                brace,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Concat,
    Alternation,
    FiniteQuant {
        low: u32,
        high: u32,
        greedy: bool,
        brace: bool,
    },
    InfiniteQuant {
        low: u32,
        greedy: bool,
        brace: bool,
    },
    Subexpr(SubexprKind),
    Charset(Charset),
    Assert(AssertKind),
    Meta(MetaKind),
    Backref(u32),
    Opaque(OpaqueKind),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Concat => "concat",
            NodeKind::Alternation => "alternation",
            NodeKind::FiniteQuant { .. } => "finite_quant",
            NodeKind::InfiniteQuant { .. } => "infinite_quant",
            NodeKind::Subexpr(_) => "subexpr",
            NodeKind::Charset(_) => "charset",
            NodeKind::Assert(_) => "assert",
            NodeKind::Meta(_) => "meta",
            NodeKind::Backref(_) => "backref",
            NodeKind::Opaque(_) => "opaque",
        }
    }

    /// Anything that owns operands.
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            NodeKind::Concat
                | NodeKind::Alternation
                | NodeKind::FiniteQuant { .. }
                | NodeKind::InfiniteQuant { .. }
                | NodeKind::Subexpr(_)
        )
    }

    pub fn is_quantifier(&self) -> bool {
        matches!(
            self,
            NodeKind::FiniteQuant { .. } | NodeKind::InfiniteQuant { .. }
        )
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match *self {
            NodeKind::FiniteQuant { low, high, .. } => Some(Bounds::new(low, Some(high))),
            NodeKind::InfiniteQuant { low, .. } => Some(Bounds::new(low, None)),
            _ => None,
        }
    }

    pub fn is_greedy(&self) -> bool {
        match *self {
            NodeKind::FiniteQuant { greedy, .. } | NodeKind::InfiniteQuant { greedy, .. } => greedy,
            _ => true,
        }
    }

    pub fn is_empty_leaf(&self) -> bool {
        matches!(self, NodeKind::Meta(MetaKind::Empty))
    }

    pub fn is_grouping(&self) -> bool {
        matches!(self, NodeKind::Subexpr(SubexprKind::Grouping))
    }

    pub fn capture_number(&self) -> Option<u32> {
        match self {
            NodeKind::Subexpr(SubexprKind::Capturing(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn charset(&self) -> Option<&Charset> {
        match self {
            NodeKind::Charset(set) => Some(set),
            _ => None,
        }
    }

    /// Leaves that can carry a quantifier without extra parentheses.
    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            NodeKind::Charset(_)
                | NodeKind::Backref(_)
                | NodeKind::Subexpr(_)
                | NodeKind::Opaque(OpaqueKind::SubexprCall(_) | OpaqueKind::Recursion)
        )
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    pub kind: NodeKind,
    pub span: Span,
    operands: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn operands(&self) -> &[NodeId] {
        &self.operands
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// A regex syntax tree together with the source text its spans refer to.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Option<Node>>,
    root: Option<NodeId>,
    source: String,
}

impl Tree {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Install `root`, which must be detached.
    pub fn set_root(&mut self, root: Option<NodeId>) {
        if let Some(id) = root {
            self.node_mut(id).parent = None;
        }
        self.root = root;
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.alloc_with(kind, span, Vec::new())
    }

    /// Allocate an operator over detached `operands`.
    pub fn alloc_with(&mut self, kind: NodeKind, span: Span, operands: Vec<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        for &child in &operands {
            self.node_mut(child).parent = Some(id);
        }
        self.nodes.push(Some(Node {
            id,
            kind,
            span,
            operands,
            parent: None,
        }));
        id
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Access a live node. A dead id is a caller bug.
    pub fn node(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("node {id} is not part of the tree"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.0).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("node {id} is not part of the tree"),
        }
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.node_mut(id).kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    pub fn widen_span(&mut self, id: NodeId, span: Span) {
        let node = self.node_mut(id);
        node.span = node.span.union(span);
    }

    pub fn operands(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).operands
    }

    /// The only operand of a quantifier or subexpression.
    ///
    /// Panics on an operator without operands: the parser never builds one and
    /// continuing would corrupt span bookkeeping.
    pub fn operand(&self, id: NodeId) -> NodeId {
        let node = self.node(id);
        match node.operands.first() {
            Some(&child) => child,
            None => panic!(
                "malformed tree: {} node {id} has no operand",
                node.kind.name()
            ),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.operands(parent).iter().position(|&c| c == id)
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            out.push(p);
            cur = self.parent(p);
        }
        out
    }

    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// Depth-first, left-to-right, pre-order walk of the whole tree.
    pub fn preorder(&self) -> Vec<NodeId> {
        match self.root {
            Some(root) => self.preorder_from(root),
            None => Vec::new(),
        }
    }

    pub fn preorder_from(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.operands(id).iter().rev().copied());
        }
        out
    }

    /// Leaves in document order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| !self.kind(id).is_operator())
            .collect()
    }

    pub fn leaf_count(&self, id: NodeId) -> usize {
        self.preorder_from(id)
            .into_iter()
            .filter(|&n| !self.kind(n).is_operator())
            .count()
    }

    /// Put the detached node `new` where `old` sits; `old` becomes detached.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        match self.parent(old) {
            Some(parent) => {
                let slot = self
                    .operands(parent)
                    .iter()
                    .position(|&c| c == old)
                    .unwrap_or_else(|| panic!("node {old} missing from its parent {parent}"));
                self.node_mut(parent).operands[slot] = new;
                self.node_mut(new).parent = Some(parent);
                self.node_mut(old).parent = None;
            }
            None => {
                debug_assert_eq!(self.root, Some(old), "replacing a detached node");
                self.set_root(Some(new));
            }
        }
    }

    /// Drop a detached subtree from the arena.
    pub fn free(&mut self, id: NodeId) {
        for node in self.preorder_from(id) {
            self.nodes[node.0] = None;
        }
    }

    pub fn insert_operand(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.node_mut(parent).operands.insert(index, child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Detach and return the operand at `index`.
    pub fn take_operand(&mut self, parent: NodeId, index: usize) -> NodeId {
        let child = self.node_mut(parent).operands.remove(index);
        self.node_mut(child).parent = None;
        child
    }

    /// Reorder the operands of `parent`. `order` must be a permutation of them.
    pub fn permute_operands(&mut self, parent: NodeId, order: Vec<NodeId>) {
        debug_assert!({
            let mut old = self.operands(parent).to_vec();
            let mut new = order.clone();
            old.sort();
            new.sort();
            old == new
        });
        self.node_mut(parent).operands = order;
    }

    /// Wrap `id` in a fresh operator of `kind` that takes its place.
    pub fn wrap(&mut self, id: NodeId, kind: NodeKind) -> NodeId {
        let span = self.span(id);
        let placeholder = self.alloc(NodeKind::Meta(MetaKind::Empty), span);
        self.replace(id, placeholder);
        let wrapper = self.alloc_with(kind, span, vec![id]);
        self.replace(placeholder, wrapper);
        self.free(placeholder);
        wrapper
    }

    /// Remove the parentheses-like node `id`, promoting its operands.
    ///
    /// A concatenation inside a concatenation (or an alternation inside an
    /// alternation) is spliced into the parent's operand list rather than
    /// nested. The parent's span is widened to cover the dropped node.
    pub fn unwrap_node(&mut self, id: NodeId) {
        let child = self.operand(id);
        let span = self.span(id);
        let parent = self.parent(id);

        let splice = parent.is_some_and(|p| {
            let pk = self.kind(p);
            let ck = self.kind(child);
            (*pk == NodeKind::Concat && *ck == NodeKind::Concat)
                || (*pk == NodeKind::Alternation && *ck == NodeKind::Alternation)
        });

        if let (true, Some(parent)) = (splice, parent) {
            let index = self.index_in_parent(id).unwrap_or_default();
            let grandchildren = std::mem::take(&mut self.node_mut(child).operands);
            self.node_mut(parent).operands.remove(index);
            for (offset, &gc) in grandchildren.iter().enumerate() {
                self.insert_operand(parent, index + offset, gc);
            }
            self.nodes[child.0] = None;
            self.nodes[id.0] = None;
            self.widen_span(parent, span);
            return;
        }

        self.take_operand(id, 0);
        self.replace(id, child);
        self.nodes[id.0] = None;
        match parent {
            Some(p) => self.widen_span(p, span),
            None => self.widen_span(child, span),
        }
    }

    /// Delete `id` from the pattern text, keeping the tree well formed.
    ///
    /// Inside a concatenation the operand simply disappears; anywhere else it
    /// is replaced by the empty leaf so alternation branches and operator
    /// bodies keep their arity.
    pub fn delete(&mut self, id: NodeId) {
        let span = self.span(id);
        match self.parent(id) {
            Some(parent) if *self.kind(parent) == NodeKind::Concat => {
                let index = self.index_in_parent(id).unwrap_or_default();
                let removed = self.take_operand(parent, index);
                self.free(removed);
                self.widen_span(parent, span);
                self.collapse_trivial(parent);
            }
            _ => {
                let empty = self.alloc(NodeKind::Meta(MetaKind::Empty), Span::empty_at(span.start));
                self.replace(id, empty);
                self.free(id);
                if let Some(parent) = self.parent(empty) {
                    self.widen_span(parent, span);
                }
            }
        }
    }

    /// Replace a concatenation or alternation with fewer than two operands by
    /// its operand (or by the empty leaf). Returns the node now in its place.
    pub fn collapse_trivial(&mut self, id: NodeId) -> NodeId {
        if !matches!(self.kind(id), NodeKind::Concat | NodeKind::Alternation) {
            return id;
        }
        let span = self.span(id);
        match self.operands(id).len() {
            0 => {
                let empty = self.alloc(NodeKind::Meta(MetaKind::Empty), Span::empty_at(span.start));
                self.replace(id, empty);
                self.free(id);
                empty
            }
            1 => {
                let only = self.take_operand(id, 0);
                self.replace(id, only);
                self.nodes[id.0] = None;
                self.widen_span(only, span);
                only
            }
            _ => id,
        }
    }

    /// Whether the subtree at `id` can match the empty string.
    pub fn nullable(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::Concat => self.operands(id).iter().all(|&c| self.nullable(c)),
            NodeKind::Alternation => self.operands(id).iter().any(|&c| self.nullable(c)),
            NodeKind::FiniteQuant { low, .. } | NodeKind::InfiniteQuant { low, .. } => {
                *low == 0 || self.nullable(self.operand(id))
            }
            NodeKind::Subexpr(SubexprKind::Lookaround { .. }) => true,
            NodeKind::Subexpr(_) => self.nullable(self.operand(id)),
            NodeKind::Charset(_) => false,
            NodeKind::Assert(_) | NodeKind::Meta(_) | NodeKind::Opaque(_) => true,
            NodeKind::Backref(n) => match self.capture_node(*n) {
                // A self-referencing backreference never nests past itself.
                Some(group) if !self.is_ancestor(group, id) => self.nullable(group),
                _ => true,
            },
        }
    }

    pub fn capture_node(&self, number: u32) -> Option<NodeId> {
        self.preorder()
            .into_iter()
            .find(|&id| self.kind(id).capture_number() == Some(number))
    }

    /// Capture numbers named by backreferences and subexpression calls.
    pub fn referenced_captures(&self) -> Vec<u32> {
        self.preorder()
            .into_iter()
            .filter_map(|id| match self.kind(id) {
                NodeKind::Backref(n) | NodeKind::Opaque(OpaqueKind::SubexprCall(n)) => Some(*n),
                _ => None,
            })
            .collect()
    }

    /// Renumber capturing groups `1..k` in document order and rewrite every
    /// backreference and subexpression call to follow its group. References
    /// to groups that no longer exist are left untouched. Returns the
    /// old-to-new number map.
    pub fn renumber_captures(&mut self) -> BTreeMap<u32, u32> {
        let order = self.preorder();
        let mut map = BTreeMap::new();
        let mut next = 1;
        for &id in &order {
            if let NodeKind::Subexpr(SubexprKind::Capturing(n)) = self.kind_mut(id) {
                map.insert(*n, next);
                *n = next;
                next += 1;
            }
        }
        for &id in &order {
            match self.kind_mut(id) {
                NodeKind::Backref(n) | NodeKind::Opaque(OpaqueKind::SubexprCall(n)) => {
                    if let Some(&renumbered) = map.get(n) {
                        *n = renumbered;
                    }
                }
                _ => {}
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(tree: &mut Tree, c: char, at: usize) -> NodeId {
        tree.alloc(NodeKind::Charset(Charset::literal(c)), Span::new(at, at + 1))
    }

    #[test]
    fn span_inclusive_view() {
        let span = Span::new(2, 5);
        assert_eq!(span.first(), 2);
        assert_eq!(span.last(), 4);
        assert_eq!(Span::empty_at(3).last(), 3);
        assert_eq!(span.union(Span::new(0, 1)), Span::new(0, 5));
    }

    #[test]
    fn bounds_arithmetic() {
        let star = Bounds::new(0, None);
        let plus = Bounds::new(1, None);
        assert_eq!(star.mul(Bounds::exact(0)), Bounds::exact(0));
        assert_eq!(plus.mul(Bounds::new(2, Some(3))), Bounds::new(2, None));
        assert_eq!(Bounds::exact(2).mul(Bounds::exact(3)), Bounds::exact(6));
        assert_eq!(Bounds::exact(2).add(plus), Bounds::new(3, None));
    }

    #[test]
    fn written_form_follows_the_brace_flag() {
        let star = Bounds::new(0, None);
        assert!(matches!(
            star.to_kind(true),
            NodeKind::InfiniteQuant { low: 0, brace: false, .. }
        ));
        assert!(matches!(
            star.to_kind_braced(false, true),
            NodeKind::InfiniteQuant { low: 0, greedy: false, brace: true }
        ));
        assert!(matches!(
            Bounds::exact(1).to_kind_braced(true, true),
            NodeKind::FiniteQuant { low: 1, high: 1, brace: true, .. }
        ));
    }

    #[test]
    fn delete_collapses_single_operand_concat() {
        let mut tree = Tree::new("ab");
        let a = leaf(&mut tree, 'a', 0);
        let b = leaf(&mut tree, 'b', 1);
        let concat = tree.alloc_with(NodeKind::Concat, Span::new(0, 2), vec![a, b]);
        tree.set_root(Some(concat));

        tree.delete(b);

        assert_eq!(tree.root(), Some(a));
        assert!(!tree.contains(concat));
        assert_eq!(tree.span(a), Span::new(0, 2));
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn wrap_keeps_parent_links() {
        let mut tree = Tree::new("ab");
        let a = leaf(&mut tree, 'a', 0);
        let b = leaf(&mut tree, 'b', 1);
        let concat = tree.alloc_with(NodeKind::Concat, Span::new(0, 2), vec![a, b]);
        tree.set_root(Some(concat));

        let quant = tree.wrap(b, Bounds::new(1, None).to_kind(true));

        assert_eq!(tree.operands(concat), &[a, quant]);
        assert_eq!(tree.parent(quant), Some(concat));
        assert_eq!(tree.parent(b), Some(quant));
    }

    #[test]
    fn unwrap_splices_concat_into_concat() {
        let mut tree = Tree::new("x(?:ab)");
        let x = leaf(&mut tree, 'x', 0);
        let a = leaf(&mut tree, 'a', 4);
        let b = leaf(&mut tree, 'b', 5);
        let inner = tree.alloc_with(NodeKind::Concat, Span::new(4, 6), vec![a, b]);
        let group = tree.alloc_with(
            NodeKind::Subexpr(SubexprKind::Grouping),
            Span::new(1, 7),
            vec![inner],
        );
        let outer = tree.alloc_with(NodeKind::Concat, Span::new(0, 7), vec![x, group]);
        tree.set_root(Some(outer));

        tree.unwrap_node(group);

        assert_eq!(tree.operands(outer), &[x, a, b]);
        assert_eq!(tree.parent(a), Some(outer));
        assert!(!tree.contains(group));
        assert!(!tree.contains(inner));
    }

    #[test]
    #[should_panic(expected = "malformed tree")]
    fn operand_of_empty_operator_fails_fast() {
        let mut tree = Tree::new("()");
        let group = tree.alloc(NodeKind::Subexpr(SubexprKind::Grouping), Span::new(0, 2));
        tree.set_root(Some(group));
        tree.operand(group);
    }
}
