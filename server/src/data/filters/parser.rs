//! Filter parsing
//!
//! Turns filter text such as `(distance > 2500) or (weather == 'Rain')` into
//! a [`FilterSpec`] tree. Recursive descent over the token stream:
//!
//! ```text
//! expression := operand (("and" | "or") operand)*
//! operand    := "(" expression ")" | leaf
//! leaf       := field operator [literal]
//! literal    := 'string' | integer | float | true | false | "[" literal,* "]"
//! ```
//!
//! A run of the same keyword folds left into binary nodes. Mixing `and` and
//! `or` at one level needs parentheses.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use super::error::FilterError;
use super::lexer::{Token, TokenKind, tokenize};
use super::types::{CombinatorKind, FilterSpec, Literal, Operator};

/// Maximum size of filter text in bytes
pub const MAX_FILTER_LEN: usize = 4096;

/// Maximum parenthesis nesting
pub const MAX_NESTING_DEPTH: usize = 32;

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid regex"))
}

fn integer_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+$").expect("Invalid regex"))
}

fn float_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.\d*|\.\d+|\d+)([eE][+-]?\d+)?$").expect("Invalid regex")
    })
}

/// Parse filter text from a query parameter
///
/// Returns `Ok(None)` for a missing or blank filter, meaning "select all rows".
pub fn parse(text: Option<&str>) -> Result<Option<FilterSpec>, FilterError> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    if text.len() > MAX_FILTER_LEN {
        return Err(FilterError::malformed(
            truncate(text, 64),
            format!("filter exceeds maximum size of {} bytes", MAX_FILTER_LEN),
        ));
    }

    let tokens = tokenize(text)?;
    let mut parser = Parser {
        input: text,
        tokens,
        pos: 0,
        depth: 0,
    };

    let spec = parser.expression()?;
    if let Some(token) = parser.peek() {
        let reason = match token.kind {
            TokenKind::RParen => "unbalanced parentheses",
            _ => "unexpected trailing input",
        };
        return Err(FilterError::malformed(&text[token.start..], reason));
    }

    tracing::trace!(filter = %text, depth = spec.depth(), "Parsed filter");
    Ok(Some(spec))
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Byte offset where the next token starts, or end of input
    fn offset(&self) -> usize {
        self.peek().map_or(self.input.len(), |t| t.start)
    }

    fn malformed(&self, start: usize, end: usize, reason: impl Into<String>) -> FilterError {
        let fragment = if start < end {
            &self.input[start..end]
        } else {
            &self.input[start..]
        };
        FilterError::malformed(fragment, reason)
    }

    fn peek_keyword(&self) -> Option<CombinatorKind> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Word(w)) => CombinatorKind::from_keyword(w),
            _ => None,
        }
    }

    fn expression(&mut self) -> Result<FilterSpec, FilterError> {
        let start = self.offset();
        let mut left = self.operand()?;
        let mut chain: Option<CombinatorKind> = None;

        while let Some(kind) = self.peek_keyword() {
            if let Some(previous) = chain
                && previous != kind
            {
                let end = self.tokens.get(self.pos).map_or(self.input.len(), |t| t.end);
                return Err(self.malformed(
                    start,
                    end,
                    "mixing `and` and `or` requires parentheses",
                ));
            }
            chain = Some(kind);
            self.next();

            let right = self.operand()?;
            left = FilterSpec::Combinator {
                kind,
                children: vec![left, right],
            };
        }

        Ok(left)
    }

    fn operand(&mut self) -> Result<FilterSpec, FilterError> {
        let Some((is_group, open)) = self
            .peek()
            .map(|t| (t.kind == TokenKind::LParen, t.start))
        else {
            return Err(self.malformed(
                self.offset_of_last(),
                self.input.len(),
                "expected a comparison",
            ));
        };

        if !is_group {
            return self.leaf();
        }

        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self.malformed(
                open,
                self.input.len(),
                format!("nesting exceeds {} levels", MAX_NESTING_DEPTH),
            ));
        }
        self.next();

        let inner = self.expression()?;
        match self.next() {
            Some(Token {
                kind: TokenKind::RParen,
                ..
            }) => {
                self.depth -= 1;
                Ok(inner)
            }
            Some(other) => Err(self.malformed(other.start, self.input.len(), "expected `)`")),
            None => Err(self.malformed(open, self.input.len(), "unbalanced parentheses")),
        }
    }

    fn offset_of_last(&self) -> usize {
        self.tokens.last().map_or(0, |t| t.start)
    }

    fn leaf(&mut self) -> Result<FilterSpec, FilterError> {
        let start = self.offset();

        let field = match self.next() {
            Some(Token {
                kind: TokenKind::Word(w),
                ..
            }) if CombinatorKind::from_keyword(&w).is_none() => w,
            Some(token) => {
                return Err(self.malformed(token.start, token.end, "expected a field name"));
            }
            None => return Err(self.malformed(start, start, "expected a field name")),
        };

        let (op, operator) = match self.next() {
            Some(Token {
                kind: TokenKind::Word(w),
                start: op_start,
                end: op_end,
            }) => match Operator::from_spelling(&w) {
                Some(operator) => (w, operator),
                None => {
                    return Err(self.malformed(
                        op_start,
                        op_end,
                        format!("operator `{}` not valid", w),
                    ));
                }
            },
            _ => {
                return Err(self.malformed(
                    start,
                    self.leaf_end(),
                    "expected `field operator value`",
                ));
            }
        };

        let value = if operator.is_unary() {
            None
        } else {
            if self.at_leaf_boundary() {
                return Err(self.malformed(
                    start,
                    self.leaf_end(),
                    "expected `field operator value`",
                ));
            }
            Some(self.literal()?)
        };

        if !self.at_leaf_boundary() {
            return Err(self.malformed(
                start,
                self.leaf_end(),
                "expected `field operator value`",
            ));
        }

        Ok(FilterSpec::Leaf { field, op, value })
    }

    /// True at end of input, `)` or an `and`/`or` keyword
    fn at_leaf_boundary(&self) -> bool {
        match self.peek() {
            None => true,
            Some(token) => {
                token.kind == TokenKind::RParen || self.peek_keyword().is_some()
            }
        }
    }

    /// End offset of the current leaf text, for error fragments
    fn leaf_end(&self) -> usize {
        self.tokens[self.pos..]
            .iter()
            .find(|t| match &t.kind {
                TokenKind::RParen | TokenKind::LParen => true,
                TokenKind::Word(w) => CombinatorKind::from_keyword(w).is_some(),
                _ => false,
            })
            .map_or(self.input.len(), |t| t.start)
            .max(self.offset())
    }

    fn literal(&mut self) -> Result<Literal, FilterError> {
        match self.next() {
            Some(Token {
                kind: TokenKind::LBracket,
                start,
                ..
            }) => self.list_literal(start),
            Some(token) => self.scalar_literal(token),
            None => Err(self.malformed(self.input.len(), self.input.len(), "expected a value")),
        }
    }

    fn list_literal(&mut self, open: usize) -> Result<Literal, FilterError> {
        let mut items = Vec::new();

        if let Some(Token {
            kind: TokenKind::RBracket,
            ..
        }) = self.peek()
        {
            self.next();
            return Ok(Literal::List(items));
        }

        loop {
            match self.next() {
                Some(Token {
                    kind: TokenKind::LBracket,
                    start,
                    end,
                }) => {
                    return Err(self.malformed(start, end, "nested lists are not supported"));
                }
                Some(token) => items.push(self.scalar_literal(token)?),
                None => return Err(self.malformed(open, open, "unterminated list")),
            }

            match self.next() {
                Some(Token {
                    kind: TokenKind::Comma,
                    ..
                }) => continue,
                Some(Token {
                    kind: TokenKind::RBracket,
                    ..
                }) => return Ok(Literal::List(items)),
                Some(token) => {
                    return Err(self.malformed(token.start, token.end, "expected `,` or `]`"));
                }
                None => return Err(self.malformed(open, open, "unterminated list")),
            }
        }
    }

    fn scalar_literal(&self, token: Token) -> Result<Literal, FilterError> {
        match token.kind {
            TokenKind::Quoted(s) => Ok(parse_string_literal(s)),
            TokenKind::Word(w) => parse_bare_literal(&w)
                .ok_or_else(|| self.malformed(token.start, token.end, "unrecognized literal")),
            _ => Err(self.malformed(token.start, token.end, "expected a value")),
        }
    }
}

/// String literal, upgraded to a date when it looks like `YYYY-MM-DD`
fn parse_string_literal(s: String) -> Literal {
    if date_regex().is_match(&s)
        && let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d")
    {
        return Literal::Date(date);
    }
    Literal::String(s)
}

/// Unquoted number or boolean
fn parse_bare_literal(word: &str) -> Option<Literal> {
    if word.eq_ignore_ascii_case("true") {
        return Some(Literal::Boolean(true));
    }
    if word.eq_ignore_ascii_case("false") {
        return Some(Literal::Boolean(false));
    }
    if integer_regex().is_match(word)
        && let Ok(i) = word.parse::<i64>()
    {
        return Some(Literal::Integer(i));
    }
    if float_regex().is_match(word) {
        return word
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Literal::Float);
    }
    None
}
