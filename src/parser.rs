//! Regex text to [`Tree`].
//!
//! A recursive-descent parser for the PCRE subset the engine reasons about.
//! Every node receives its byte span in the source and a stable id. Syntax the
//! tree cannot express (named groups, relative references, POSIX classes) is
//! rejected rather than approximated.

use crate::ast::{
    AssertKind, Bounds, Charset, ClassItem, MetaKind, NodeId, NodeKind, OpaqueKind, Shorthand,
    Span, SubexprKind, Tree,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected `{found}` at byte {at}")]
    Unexpected { found: char, at: usize },

    #[error("missing `)` for the group opened at byte {0}")]
    UnclosedGroup(usize),

    #[error("missing `]` for the class opened at byte {0}")]
    UnclosedClass(usize),

    #[error("range `{lo}-{hi}` at byte {at} is out of order")]
    InvalidRange { lo: char, hi: char, at: usize },

    #[error("quantifier at byte {0} has nothing to repeat")]
    NothingToRepeat(usize),

    #[error("quantifier at byte {at} has min {low} greater than max {high}")]
    InvalidBounds { low: u32, high: u32, at: usize },

    #[error("pattern ends with a lone backslash")]
    TrailingBackslash,

    #[error("unsupported syntax `{text}` at byte {at}")]
    Unsupported { text: String, at: usize },
}

/// Parse `source` into a tree whose spans index into `source`.
pub fn parse_regex(source: &str) -> Result<Tree, ParseError> {
    let mut parser = Parser::new(source);
    let root = parser.parse_alternation()?;
    if let Some(found) = parser.peek() {
        return Err(ParseError::Unexpected {
            found,
            at: parser.offset(),
        });
    }
    parser.tree.set_root(Some(root));
    Ok(parser.tree)
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    group_count: u32,
    tree: Tree,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
            group_count: 0,
            tree: Tree::new(source),
        }
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.source.len(), |&(at, _)| at)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|&(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, expected: &str) -> bool {
        let matches = expected
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c));
        if matches {
            self.pos += expected.chars().count();
        }
        matches
    }

    fn unsupported(&self, start: usize) -> ParseError {
        let end = (self.offset() + 1).min(self.source.len());
        let mut end = end.max(start);
        while !self.source.is_char_boundary(end) {
            end += 1;
        }
        ParseError::Unsupported {
            text: self.source[start..end].to_string(),
            at: start,
        }
    }

    fn leaf(&mut self, kind: NodeKind, start: usize) -> NodeId {
        let end = self.offset();
        self.tree.alloc(kind, Span::new(start, end))
    }

    /// `a|b|c`
    fn parse_alternation(&mut self) -> Result<NodeId, ParseError> {
        let start = self.offset();
        let mut branches = vec![self.parse_concat()?];
        while self.eat('|') {
            branches.push(self.parse_concat()?);
        }
        if branches.len() == 1 {
            return Ok(branches[0]);
        }
        let span = Span::new(start, self.offset());
        Ok(self.tree.alloc_with(NodeKind::Alternation, span, branches))
    }

    /// `abc`; an empty branch becomes the empty leaf.
    fn parse_concat(&mut self) -> Result<NodeId, ParseError> {
        let start = self.offset();
        let mut items = Vec::new();
        while let Some(c) = self.peek() {
            if c == ')' || c == '|' {
                break;
            }
            items.push(self.parse_quantified()?);
        }
        match items.len() {
            0 => Ok(self.leaf(NodeKind::Meta(MetaKind::Empty), start)),
            1 => Ok(items[0]),
            _ => {
                let span = Span::new(start, self.offset());
                Ok(self.tree.alloc_with(NodeKind::Concat, span, items))
            }
        }
    }

    fn parse_quantified(&mut self) -> Result<NodeId, ParseError> {
        let start = self.offset();
        let atom = self.parse_atom()?;

        let quant_at = self.offset();
        let Some((bounds, brace)) = self.parse_quantifier()? else {
            return Ok(atom);
        };
        if !self.tree.kind(atom).is_atom() {
            return Err(ParseError::NothingToRepeat(quant_at));
        }
        let greedy = !self.eat('?');
        if self.peek() == Some('+') {
            return Err(self.unsupported(self.offset()));
        }
        if matches!(self.peek(), Some('*' | '+' | '?')) || self.brace_ahead().is_some() {
            return Err(ParseError::NothingToRepeat(self.offset()));
        }

        let kind = bounds.to_kind_braced(greedy, brace);
        let span = Span::new(start, self.offset());
        Ok(self.tree.alloc_with(kind, span, vec![atom]))
    }

    /// Returns the bounds and whether they were written with braces.
    fn parse_quantifier(&mut self) -> Result<Option<(Bounds, bool)>, ParseError> {
        let bounds = match self.peek() {
            Some('*') => Bounds::new(0, None),
            Some('+') => Bounds::new(1, None),
            Some('?') => Bounds::new(0, Some(1)),
            Some('{') => {
                let at = self.offset();
                let Some((bounds, width)) = self.brace_ahead() else {
                    return Ok(None);
                };
                if let Some(high) = bounds.high
                    && high < bounds.low
                {
                    return Err(ParseError::InvalidBounds {
                        low: bounds.low,
                        high,
                        at,
                    });
                }
                self.pos += width;
                return Ok(Some((bounds, true)));
            }
            _ => return Ok(None),
        };
        self.pos += 1;
        Ok(Some((bounds, false)))
    }

    /// Recognise `{n}`, `{n,}` or `{n,m}` at the cursor without consuming it.
    /// Anything else is a literal brace, as in PCRE.
    fn brace_ahead(&self) -> Option<(Bounds, usize)> {
        if self.peek() != Some('{') {
            return None;
        }
        let mut i = 1;
        let low = self.digits_at(&mut i)?;
        let high = if self.peek_at(i) == Some(',') {
            i += 1;
            if self.peek_at(i) == Some('}') {
                None
            } else {
                Some(self.digits_at(&mut i)?)
            }
        } else {
            Some(low)
        };
        if self.peek_at(i) != Some('}') {
            return None;
        }
        Some((Bounds::new(low, high), i + 1))
    }

    fn digits_at(&self, i: &mut usize) -> Option<u32> {
        let begin = *i;
        let mut value: u32 = 0;
        while let Some(d) = self.peek_at(*i).and_then(|c| c.to_digit(10)) {
            value = value.checked_mul(10)?.checked_add(d)?;
            *i += 1;
        }
        (*i > begin).then_some(value)
    }

    fn parse_atom(&mut self) -> Result<NodeId, ParseError> {
        let start = self.offset();
        let Some(c) = self.peek() else {
            return Err(ParseError::NothingToRepeat(start));
        };
        match c {
            '(' => self.parse_group(),
            '[' => self.parse_class(),
            '\\' => self.parse_escape(),
            '*' | '+' | '?' => Err(ParseError::NothingToRepeat(start)),
            '{' if self.brace_ahead().is_some() => Err(ParseError::NothingToRepeat(start)),
            _ => {
                self.advance();
                let kind = match c {
                    '.' => NodeKind::Charset(Charset::any()),
                    '^' => NodeKind::Assert(AssertKind::Circumflex),
                    '$' => NodeKind::Assert(AssertKind::Dollar),
                    _ => NodeKind::Charset(Charset::literal(c)),
                };
                Ok(self.leaf(kind, start))
            }
        }
    }

    fn parse_escape(&mut self) -> Result<NodeId, ParseError> {
        let start = self.offset();
        self.advance();
        let Some(c) = self.advance() else {
            return Err(ParseError::TrailingBackslash);
        };

        if let Some(class) = Shorthand::from_letter(c) {
            return Ok(self.leaf(NodeKind::Charset(Charset::shorthand(class)), start));
        }

        let assert = match c {
            'b' => Some(AssertKind::WordBoundary),
            'B' => Some(AssertKind::NotWordBoundary),
            'A' => Some(AssertKind::SubjectStart),
            'z' => Some(AssertKind::SubjectEnd),
            'Z' => Some(AssertKind::SubjectEndOrNewline),
            'G' => Some(AssertKind::FirstMatch),
            _ => None,
        };
        if let Some(kind) = assert {
            return Ok(self.leaf(NodeKind::Assert(kind), start));
        }

        match c {
            '1'..='9' => {
                let mut number = c.to_digit(10).unwrap_or_default();
                while let Some(d) = self.peek().and_then(|d| d.to_digit(10)) {
                    number = number
                        .checked_mul(10)
                        .and_then(|n| n.checked_add(d))
                        .ok_or_else(|| self.unsupported(start))?;
                    self.advance();
                }
                Ok(self.leaf(NodeKind::Backref(number), start))
            }
            'g' => {
                let braced = self.eat('{');
                let mut i = 0;
                let number = self
                    .digits_at(&mut i)
                    .filter(|&n| n > 0)
                    .ok_or_else(|| self.unsupported(start))?;
                self.pos += i;
                if braced && !self.eat('}') {
                    return Err(self.unsupported(start));
                }
                Ok(self.leaf(NodeKind::Backref(number), start))
            }
            _ => {
                let literal = self.escaped_char(c, start)?;
                Ok(self.leaf(NodeKind::Charset(Charset::literal(literal)), start))
            }
        }
    }

    /// Character named by `\c` (the backslash and `c` already consumed).
    fn escaped_char(&mut self, c: char, start: usize) -> Result<char, ParseError> {
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'f' => '\u{0c}',
            'v' => '\u{0b}',
            'e' => '\u{1b}',
            'a' => '\u{07}',
            '0' => '\0',
            'x' => self.parse_hex(start)?,
            c if c.is_ascii_alphanumeric() => return Err(self.unsupported(start)),
            c => c,
        })
    }

    /// `\xHH` or `\x{H...}`.
    fn parse_hex(&mut self, start: usize) -> Result<char, ParseError> {
        let braced = self.eat('{');
        let max = if braced { 6 } else { 2 };
        let mut value = 0u32;
        let mut count = 0;
        while count < max {
            let Some(d) = self.peek().and_then(|c| c.to_digit(16)) else {
                break;
            };
            value = value * 16 + d;
            count += 1;
            self.advance();
        }
        if braced && !self.eat('}') {
            return Err(self.unsupported(start));
        }
        char::from_u32(value).ok_or_else(|| self.unsupported(start))
    }

    fn parse_class(&mut self) -> Result<NodeId, ParseError> {
        let start = self.offset();
        self.advance();
        let negated = self.eat('^');
        let mut items = Vec::new();
        let mut first = true;

        loop {
            let item_at = self.offset();
            let Some(c) = self.peek() else {
                return Err(ParseError::UnclosedClass(start));
            };
            if c == ']' && !first {
                self.advance();
                break;
            }
            first = false;
            if c == '[' && self.peek_at(1) == Some(':') {
                return Err(self.unsupported(item_at));
            }

            let item = self.parse_class_atom()?;
            let is_range = self.peek() == Some('-') && !matches!(self.peek_at(1), Some(']') | None);
            match (item, is_range) {
                (ClassItem::Char(lo), true) => {
                    self.advance();
                    let hi = match self.parse_class_atom()? {
                        ClassItem::Char(hi) => hi,
                        _ => return Err(self.unsupported(item_at)),
                    };
                    if lo > hi {
                        return Err(ParseError::InvalidRange { lo, hi, at: item_at });
                    }
                    items.push(ClassItem::Range(lo, hi));
                }
                (item, _) => items.push(item),
            }
        }

        let set = Charset {
            negated,
            bracketed: true,
            items,
        };
        Ok(self.leaf(NodeKind::Charset(set), start))
    }

    fn parse_class_atom(&mut self) -> Result<ClassItem, ParseError> {
        let start = self.offset();
        let Some(c) = self.advance() else {
            return Err(ParseError::UnclosedClass(start));
        };
        if c != '\\' {
            return Ok(ClassItem::Char(c));
        }
        let Some(e) = self.advance() else {
            return Err(ParseError::TrailingBackslash);
        };
        if let Some(class) = Shorthand::from_letter(e) {
            return Ok(ClassItem::Shorthand(class));
        }
        if e == 'b' {
            return Ok(ClassItem::Char('\u{08}'));
        }
        Ok(ClassItem::Char(self.escaped_char(e, start)?))
    }

    fn parse_group(&mut self) -> Result<NodeId, ParseError> {
        let start = self.offset();
        self.advance();

        if self.eat('*') {
            let mut verb = String::new();
            while let Some(c) = self.advance() {
                if c == ')' {
                    return Ok(self.leaf(NodeKind::Opaque(OpaqueKind::Control(verb)), start));
                }
                verb.push(c);
            }
            return Err(ParseError::UnclosedGroup(start));
        }

        let kind = if self.eat('?') {
            if self.eat(':') {
                SubexprKind::Grouping
            } else if self.eat('>') {
                SubexprKind::Atomic
            } else if self.eat('=') {
                SubexprKind::Lookaround {
                    ahead: true,
                    negative: false,
                }
            } else if self.eat('!') {
                SubexprKind::Lookaround {
                    ahead: true,
                    negative: true,
                }
            } else if self.eat_str("<=") {
                SubexprKind::Lookaround {
                    ahead: false,
                    negative: false,
                }
            } else if self.eat_str("<!") {
                SubexprKind::Lookaround {
                    ahead: false,
                    negative: true,
                }
            } else if self.eat_str("R)") {
                return Ok(self.leaf(NodeKind::Opaque(OpaqueKind::Recursion), start));
            } else if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                let mut i = 0;
                let number = self
                    .digits_at(&mut i)
                    .ok_or_else(|| self.unsupported(start))?;
                self.pos += i;
                if !self.eat(')') {
                    return Err(self.unsupported(start));
                }
                let kind = if number == 0 {
                    OpaqueKind::Recursion
                } else {
                    OpaqueKind::SubexprCall(number)
                };
                return Ok(self.leaf(NodeKind::Opaque(kind), start));
            } else {
                let mut flags = String::new();
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphabetic() || c == '-' {
                        flags.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
                if flags.is_empty() {
                    return Err(self.unsupported(start));
                }
                if self.eat(')') {
                    return Ok(self.leaf(NodeKind::Opaque(OpaqueKind::Options(flags)), start));
                }
                if !self.eat(':') {
                    return Err(self.unsupported(start));
                }
                SubexprKind::Modifier(flags)
            }
        } else {
            self.group_count += 1;
            SubexprKind::Capturing(self.group_count)
        };

        let body = self.parse_alternation()?;
        if !self.eat(')') {
            return Err(ParseError::UnclosedGroup(start));
        }
        let span = Span::new(start, self.offset());
        Ok(self.tree.alloc_with(NodeKind::Subexpr(kind), span, vec![body]))
    }
}
