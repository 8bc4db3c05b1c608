use crate::ast::{NodeId, Span, Tree};
use crate::lint::{MessageKeys, RuleCategory, RuleDescriptor};
use serde::Serialize;

/// One match of a rule: which rule fired, on which nodes, over what span.
#[derive(Debug, Clone)]
#[must_use]
pub struct Finding {
    pub rule: &'static RuleDescriptor,
    /// Affected nodes in document order; the first one is the rewrite target.
    pub affected: Vec<NodeId>,
    /// Byte range in the original source, for highlighting.
    pub span: Span,
}

impl Finding {
    pub fn new(rule: &'static RuleDescriptor, affected: Vec<NodeId>, span: Span) -> Self {
        Self {
            rule,
            affected,
            span,
        }
    }

    /// Finding on a single node, spanning that node.
    pub fn for_node(rule: &'static RuleDescriptor, tree: &Tree, id: NodeId) -> Self {
        Self::new(rule, vec![id], tree.span(id))
    }

    /// Finding on several nodes, spanning all of them.
    pub fn for_nodes(rule: &'static RuleDescriptor, tree: &Tree, ids: Vec<NodeId>) -> Self {
        let span = ids
            .iter()
            .map(|&id| tree.span(id))
            .reduce(Span::union)
            .unwrap_or_default();
        Self::new(rule, ids, span)
    }

    pub fn category(&self) -> RuleCategory {
        self.rule.category
    }

    pub fn message_keys(&self) -> MessageKeys {
        self.rule.keys
    }

    pub fn target(&self) -> Option<NodeId> {
        self.affected.first().copied()
    }
}

/// A finding packaged for the UI layer. Message keys are opaque; the caller
/// resolves them against its own catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub problem: &'static str,
    pub solve: &'static str,
    pub problem_type: &'static str,
    pub affected_node_ids: Vec<NodeId>,
    /// Inclusive `[first, last]` byte positions.
    pub span: [usize; 2],
}

impl From<&Finding> for ReportEntry {
    fn from(finding: &Finding) -> Self {
        Self {
            problem: finding.rule.keys.problem,
            solve: finding.rule.keys.solve,
            problem_type: finding.rule.name,
            affected_node_ids: finding.affected.clone(),
            span: [finding.span.first(), finding.span.last()],
        }
    }
}

/// Findings of one analysis, split by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub errors: Vec<ReportEntry>,
    pub tips: Vec<ReportEntry>,
    pub equivalences: Vec<ReportEntry>,
}

impl Report {
    pub fn push(&mut self, finding: &Finding) {
        let entry = ReportEntry::from(finding);
        match finding.category() {
            RuleCategory::Error => self.errors.push(entry),
            RuleCategory::Tip => self.tips.push(entry),
            RuleCategory::Equivalence => self.equivalences.push(entry),
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len() + self.tips.len() + self.equivalences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Entries of every category, errors first.
    pub fn entries(&self) -> impl Iterator<Item = (RuleCategory, &ReportEntry)> {
        let tag = |category| move |entry| (category, entry);
        self.errors
            .iter()
            .map(tag(RuleCategory::Error))
            .chain(self.tips.iter().map(tag(RuleCategory::Tip)))
            .chain(self.equivalences.iter().map(tag(RuleCategory::Equivalence)))
    }

    /// Names of the rules that fired, in report order.
    pub fn problem_types(&self) -> Vec<&'static str> {
        self.entries().map(|(_, e)| e.problem_type).collect()
    }
}
