//! The Nucleus parser (§4.C, §6.2): turns source text into a single [`Expr`] tree.
//!
//! A hand-written recursive-descent tokenizer + parser. The grammar is small enough
//! (atoms and parenthesized lists, no operators, no quoting) that pulling in a parser
//! combinator crate would buy nothing: the teacher's own parsing-adjacent code
//! (`scoping::regex`, `scoping::literal`) is similarly a thin, hand-rolled layer over a
//! single external primitive (`fancy_regex`), not a combinator framework.

use std::fmt;

use crate::error::{EngineError, ErrorKind};

/// A location in the source, used for error reporting and AST provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A literal atom, as produced by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Symbol(String),
}

/// An expression node in the Nucleus AST (§3 `Expr`).
///
/// Either a literal [`Atom`] or a list `(head arg...)`, where `head` is a symbol that
/// names a special form or primitive. No quoting, no macros: the head is always
/// evaluated as a dispatch key, never as data.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Atom(Atom, Span),
    List(Vec<Expr>, Span),
}

impl Expr {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Atom(_, s) | Self::List(_, s) => *s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokKind {
    LParen,
    RParen,
    Atom,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokKind,
    text: String,
    span: Span,
}

struct Tokenizer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
    line: u32,
    column: u32,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.char_indices().peekable(),
            src,
            line: 1,
            column: 1,
        }
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            column: self.column,
        }
    }

    fn skip_ignorable(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some(';') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, EngineError> {
        self.skip_ignorable();
        let span = self.span();
        let Some((start, c)) = self.chars.peek().copied() else {
            return Ok(None);
        };

        match c {
            '(' => {
                self.advance();
                Ok(Some(Token {
                    kind: TokKind::LParen,
                    text: "(".to_string(),
                    span,
                }))
            }
            ')' => {
                self.advance();
                Ok(Some(Token {
                    kind: TokKind::RParen,
                    text: ")".to_string(),
                    span,
                }))
            }
            '"' => self.read_string(span).map(Some),
            _ => {
                let _ = start;
                self.read_atom(span).map(Some)
            }
        }
    }

    fn read_string(&mut self, span: Span) -> Result<Token, EngineError> {
        self.advance(); // opening quote
        let mut out = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(EngineError::new(
                        ErrorKind::ParseError,
                        "unterminated string literal",
                    )
                    .with_span(span))
                }
                Some((_, '"')) => break,
                Some((_, '\\')) => match self.advance() {
                    Some((_, '"')) => out.push('"'),
                    Some((_, '\\')) => out.push('\\'),
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, other)) => {
                        return Err(EngineError::new(
                            ErrorKind::ParseError,
                            format!("invalid escape sequence '\\{other}'"),
                        )
                        .with_span(span))
                    }
                    None => {
                        return Err(EngineError::new(
                            ErrorKind::ParseError,
                            "unterminated string literal",
                        )
                        .with_span(span))
                    }
                },
                Some((_, c)) => out.push(c),
            }
        }
        Ok(Token {
            kind: TokKind::Atom,
            text: format!("\"{out}\""),
            span,
        })
    }

    fn read_atom(&mut self, span: Span) -> Result<Token, EngineError> {
        let mut out = String::new();
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() || c == '(' || c == ')' || c == ';' => break,
                Some(_) => {
                    let (_, c) = self.advance().expect("just peeked");
                    out.push(c);
                }
                None => break,
            }
        }
        if out.is_empty() {
            let unexpected = self.peek_char().unwrap_or_default();
            return Err(EngineError::new(
                ErrorKind::ParseError,
                format!("unexpected character '{unexpected}'"),
            )
            .with_span(span));
        }
        Ok(Token {
            kind: TokKind::Atom,
            text: out,
            span,
        })
    }
}

fn parse_atom_text(text: &str, span: Span) -> Result<Atom, EngineError> {
    if let Some(stripped) = text.strip_prefix('"') {
        // Already unescaped by the tokenizer; strip the synthetic closing quote marker.
        let inner = stripped.strip_suffix('"').unwrap_or(stripped);
        return Ok(Atom::Str(inner.to_string()));
    }
    if text == "true" {
        return Ok(Atom::Bool(true));
    }
    if text == "false" {
        return Ok(Atom::Bool(false));
    }
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Atom::Int(i));
    }
    if is_float_literal(text) {
        if let Ok(f) = text.parse::<f64>() {
            return Ok(Atom::Float(f));
        }
    }
    if is_valid_symbol(text) {
        return Ok(Atom::Symbol(text.to_string()));
    }
    Err(EngineError::new(ErrorKind::ParseError, format!("invalid token '{text}'")).with_span(span))
}

fn is_float_literal(text: &str) -> bool {
    let t = text.strip_prefix('-').unwrap_or(text);
    let Some((int_part, frac_part)) = t.split_once('.') else {
        return false;
    };
    !int_part.is_empty()
        && int_part.chars().all(|c| c.is_ascii_digit())
        && !frac_part.is_empty()
        && frac_part.chars().all(|c| c.is_ascii_digit())
}

fn is_valid_symbol(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '?' | '!'))
}

/// Parses a single top-level [`Expr`] from `source`.
///
/// Exactly one top-level form is expected; trailing non-whitespace/comment tokens are a
/// parse error (§4.C).
pub fn parse(source: &str) -> Result<Expr, EngineError> {
    let mut tok = Tokenizer::new(source);
    let first = read_expr(&mut tok)?.ok_or_else(|| {
        EngineError::new(ErrorKind::ParseError, "empty input: expected one expression")
    })?;

    if let Some(extra) = tok.next_token()? {
        return Err(EngineError::new(
            ErrorKind::ParseError,
            format!(
                "unexpected trailing token '{}': only one top-level expression is allowed per call",
                extra.text
            ),
        )
        .with_span(extra.span));
    }

    Ok(first)
}

fn read_expr(tok: &mut Tokenizer<'_>) -> Result<Option<Expr>, EngineError> {
    let Some(token) = tok.next_token()? else {
        return Ok(None);
    };

    match token.kind {
        TokKind::Atom => Ok(Some(Expr::Atom(
            parse_atom_text(&token.text, token.span)?,
            token.span,
        ))),
        TokKind::LParen => Ok(Some(read_list_from(tok, token.span)?)),
        TokKind::RParen => Err(EngineError::new(
            ErrorKind::ParseError,
            "unexpected ')'",
        )
        .with_span(token.span)),
    }
}

fn read_list_from(tok: &mut Tokenizer<'_>, span: Span) -> Result<Expr, EngineError> {
    let mut items = Vec::new();
    loop {
        let Some(peeked) = tok.next_token()? else {
            return Err(
                EngineError::new(ErrorKind::ParseError, "unterminated list: missing ')'")
                    .with_span(span),
            );
        };
        if peeked.kind == TokKind::RParen {
            break;
        }
        let item = match peeked.kind {
            TokKind::Atom => Expr::Atom(parse_atom_text(&peeked.text, peeked.span)?, peeked.span),
            TokKind::LParen => read_list_from(tok, peeked.span)?,
            TokKind::RParen => unreachable!("handled above"),
        };
        items.push(item);
    }
    if items.is_empty() {
        return Err(
            EngineError::new(ErrorKind::ParseError, "empty list '()' is not a valid expression")
                .with_span(span),
        );
    }
    Ok(Expr::List(items, span))
}
