//! Filter tokenizer
//!
//! Splits filter text into parentheses, list punctuation, single-quoted
//! strings and bare words. Spans are byte offsets into the input so parse
//! errors can quote the offending text.

use super::error::FilterError;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum TokenKind {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    /// Contents of a single-quoted string, quotes removed
    Quoted(String),
    /// Identifier, operator spelling, keyword or bare literal
    Word(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | ',' | '\'')
}

pub(super) fn tokenize(input: &str) -> Result<Vec<Token>, FilterError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let punct = match c {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = punct {
            chars.next();
            tokens.push(Token {
                kind,
                start,
                end: start + c.len_utf8(),
            });
            continue;
        }

        if c == '\'' {
            chars.next();
            let mut content = String::new();
            let mut end = None;
            for (i, ch) in chars.by_ref() {
                if ch == '\'' {
                    end = Some(i + 1);
                    break;
                }
                content.push(ch);
            }
            let Some(end) = end else {
                return Err(FilterError::malformed(
                    &input[start..],
                    "unterminated string literal",
                ));
            };
            tokens.push(Token {
                kind: TokenKind::Quoted(content),
                start,
                end,
            });
            continue;
        }

        let mut end = start;
        while let Some(&(i, ch)) = chars.peek() {
            if is_delimiter(ch) {
                break;
            }
            end = i + ch.len_utf8();
            chars.next();
        }
        tokens.push(Token {
            kind: TokenKind::Word(input[start..end].to_string()),
            start,
            end,
        });
    }

    Ok(tokens)
}
