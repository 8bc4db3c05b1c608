//! Tree to regex text.
//!
//! Rewrites never patch the original string; the final text is always rendered
//! from the tree. The renderer adds `(?:...)` wherever precedence requires it,
//! so any tree a rule leaves behind prints as a valid pattern.

use crate::ast::{Charset, ClassItem, NodeId, NodeKind, OpaqueKind, SubexprKind, Tree};

impl Tree {
    /// Regex text for the whole tree; the empty string for an empty tree.
    pub fn render(&self) -> String {
        match self.root() {
            Some(root) => self.render_node(root),
            None => String::new(),
        }
    }

    pub fn render_node(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Concat => self.write_concat(id, out),
            NodeKind::Alternation => {
                for (i, &branch) in self.operands(id).iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    self.write_node(branch, out);
                }
            }
            kind @ (NodeKind::FiniteQuant { .. } | NodeKind::InfiniteQuant { .. }) => {
                let body = self.operand(id);
                if self.kind(body).is_atom() {
                    self.write_node(body, out);
                } else {
                    out.push_str("(?:");
                    self.write_node(body, out);
                    out.push(')');
                }
                write_quantifier(kind, out);
            }
            NodeKind::Subexpr(kind) => {
                out.push('(');
                out.push_str(subexpr_prefix(kind).as_str());
                self.write_node(self.operand(id), out);
                out.push(')');
            }
            NodeKind::Charset(set) => write_charset(set, out),
            NodeKind::Assert(kind) => out.push_str(kind.as_str()),
            NodeKind::Meta(_) => {}
            NodeKind::Backref(n) => write_backref(*n, false, out),
            NodeKind::Opaque(kind) => match kind {
                OpaqueKind::SubexprCall(n) => out.push_str(&format!("(?{n})")),
                OpaqueKind::Recursion => out.push_str("(?R)"),
                OpaqueKind::Control(verb) => out.push_str(&format!("(*{verb})")),
                OpaqueKind::Options(flags) => out.push_str(&format!("(?{flags})")),
            },
        }
    }

    fn write_concat(&self, id: NodeId, out: &mut String) {
        let parts: Vec<String> = self
            .operands(id)
            .iter()
            .map(|&child| {
                if *self.kind(child) == NodeKind::Alternation {
                    format!("(?:{})", self.render_node(child))
                } else {
                    self.render_node(child)
                }
            })
            .collect();

        for (i, (&child, part)) in self.operands(id).iter().zip(&parts).enumerate() {
            match self.kind(child) {
                // `\1` followed by a digit would read as a longer reference.
                NodeKind::Backref(n) => {
                    let digit_follows = parts[i + 1..]
                        .iter()
                        .find(|p| !p.is_empty())
                        .is_some_and(|p| p.starts_with(|c: char| c.is_ascii_digit()));
                    write_backref(*n, digit_follows, out);
                }
                _ => out.push_str(part),
            }
        }
    }
}

fn subexpr_prefix(kind: &SubexprKind) -> String {
    match kind {
        SubexprKind::Capturing(_) => String::new(),
        SubexprKind::Grouping => "?:".to_string(),
        SubexprKind::Atomic => "?>".to_string(),
        SubexprKind::Lookaround { ahead, negative } => {
            let dir = if *ahead { "?" } else { "?<" };
            let sign = if *negative { "!" } else { "=" };
            format!("{dir}{sign}")
        }
        SubexprKind::Modifier(flags) => format!("?{flags}:"),
    }
}

fn write_quantifier(kind: &NodeKind, out: &mut String) {
    match *kind {
        NodeKind::FiniteQuant {
            low,
            high,
            greedy,
            brace,
        } => {
            match (low, high, brace) {
                (0, 1, false) => out.push('?'),
                (low, high, _) if low == high => out.push_str(&format!("{{{low}}}")),
                (low, high, _) => out.push_str(&format!("{{{low},{high}}}")),
            }
            if !greedy {
                out.push('?');
            }
        }
        NodeKind::InfiniteQuant { low, greedy, brace } => {
            match (low, brace) {
                (0, false) => out.push('*'),
                (1, false) => out.push('+'),
                (low, _) => out.push_str(&format!("{{{low},}}")),
            }
            if !greedy {
                out.push('?');
            }
        }
        _ => {}
    }
}

fn write_backref(n: u32, digit_follows: bool, out: &mut String) {
    if n < 10 && !digit_follows {
        out.push_str(&format!("\\{n}"));
    } else {
        out.push_str(&format!("\\g{{{n}}}"));
    }
}

fn write_charset(set: &Charset, out: &mut String) {
    if !set.bracketed && !set.negated && set.items.len() == 1 {
        match &set.items[0] {
            ClassItem::Char(c) => write_char(*c, "\\^$.|?*+()[]{}", out),
            ClassItem::Any => out.push('.'),
            ClassItem::Shorthand(class) => out.push_str(class.as_str()),
            ClassItem::Range(lo, hi) => write_class(false, &[ClassItem::Range(*lo, *hi)], out),
        }
        return;
    }
    write_class(set.negated, &set.items, out);
}

fn write_class(negated: bool, items: &[ClassItem], out: &mut String) {
    const CLASS_SPECIALS: &str = "\\]^-[";
    out.push('[');
    if negated {
        out.push('^');
    }
    for item in items {
        match item {
            ClassItem::Char(c) => write_char(*c, CLASS_SPECIALS, out),
            ClassItem::Range(lo, hi) => {
                write_char(*lo, CLASS_SPECIALS, out);
                out.push('-');
                write_char(*hi, CLASS_SPECIALS, out);
            }
            ClassItem::Shorthand(class) => out.push_str(class.as_str()),
            ClassItem::Any => out.push('.'),
        }
    }
    out.push(']');
}

fn write_char(c: char, specials: &str, out: &mut String) {
    match c {
        '\n' => out.push_str("\\n"),
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        '\u{0c}' => out.push_str("\\f"),
        '\u{0b}' => out.push_str("\\v"),
        '\u{1b}' => out.push_str("\\e"),
        c if c.is_control() => out.push_str(&format!("\\x{{{:x}}}", c as u32)),
        c if specials.contains(c) => {
            out.push('\\');
            out.push(c);
        }
        c => out.push(c),
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Bounds, NodeKind};
    use crate::parser::parse_regex;

    fn roundtrip(source: &str) -> String {
        parse_regex(source).expect("pattern should parse").render()
    }

    #[test]
    fn renders_source_back_for_common_syntax() {
        for source in [
            "abc",
            "a|b|c",
            "(a)(?:b)(?>c)(?=d)(?!e)(?<=f)(?<!g)",
            "a*b+?c?d{2}e{2,}f{2,5}?",
            "[^a-z\\d]\\s.",
            "^\\bfoo\\B$",
            "(a)\\1",
            "(?i)a(?i:b)(*FAIL)(?1)(?R)",
            "a\\.b\\*\\(\\)",
            "[\\]\\-\\^]",
            "a{0,}b{1,}c{0,1}",
            "",
        ] {
            assert_eq!(roundtrip(source), source, "roundtrip of {source:?}");
        }
    }

    #[test]
    fn adds_grouping_where_precedence_requires_it() {
        let mut tree = parse_regex("ab").unwrap();
        let root = tree.root().unwrap();
        tree.wrap(root, Bounds::new(0, None).to_kind(true));
        assert_eq!(tree.render(), "(?:ab)*");

        let mut tree = parse_regex("a|b").unwrap();
        let root = tree.root().unwrap();
        let c = tree.alloc(
            NodeKind::Charset(crate::ast::Charset::literal('c')),
            crate::ast::Span::empty_at(3),
        );
        let concat = tree.alloc(NodeKind::Concat, crate::ast::Span::new(0, 3));
        tree.replace(root, concat);
        tree.insert_operand(concat, 0, root);
        tree.insert_operand(concat, 1, c);
        assert_eq!(tree.render(), "(?:a|b)c");
    }

    #[test]
    fn backreference_before_digit_uses_braced_form() {
        assert_eq!(roundtrip("(a)\\g{1}0"), "(a)\\g{1}0");
        assert_eq!(roundtrip("(a)\\g{1}b"), "(a)\\1b");
    }

    #[test]
    fn control_characters_are_escaped() {
        assert_eq!(roundtrip("\\t\\n\\x{1}"), "\\t\\n\\x{1}");
    }
}
