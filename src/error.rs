//! Structured error kinds for the engine (§7).
//!
//! Every error a caller can observe from [`crate::session::Session`] boils down to one
//! of the closed set of kinds here. Modelled on the teacher's hand-rolled
//! `ApplicationError`/`ScoperBuildError` in its `main.rs`: a plain enum with a manual
//! [`fmt::Display`] and [`std::error::Error`] impl, no `thiserror`.

use std::fmt;

use crate::parser::Span;

/// A closed set of error kinds the engine can produce, per §7.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    ParseError,
    ArityError,
    TypeError,
    RegexError,
    LineOutOfRange,
    NoDocument,
    ReservedName,
    TimeoutError,
    NeedsMoreExamples,
    NoCandidate,
    InternalError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ParseError => "ParseError",
            Self::ArityError => "ArityError",
            Self::TypeError => "TypeError",
            Self::RegexError => "RegexError",
            Self::LineOutOfRange => "LineOutOfRange",
            Self::NoDocument => "NoDocument",
            Self::ReservedName => "ReservedName",
            Self::TimeoutError => "TimeoutError",
            Self::NeedsMoreExamples => "NeedsMoreExamples",
            Self::NoCandidate => "NoCandidate",
            Self::InternalError => "InternalError",
        };
        write!(f, "{s}")
    }
}

impl ErrorKind {
    /// Whether this kind poisons the owning [`crate::session::Session`] (§7).
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InternalError)
    }
}

/// A structured, caller-facing engine error.
///
/// Carries a [`ErrorKind`], a human message, and (for parse/eval errors) the source
/// span the failure occurred at.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

impl EngineError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    #[must_use]
    pub fn arity(expected: &str, received: usize, span: Span) -> Self {
        Self::new(
            ErrorKind::ArityError,
            format!("expected {expected} argument(s), got {received}"),
        )
        .with_span(span)
    }

    #[must_use]
    pub fn type_mismatch(position: usize, expected: &str, got: &str, span: Span) -> Self {
        Self::new(
            ErrorKind::TypeError,
            format!("argument {position}: expected {expected}, got {got}"),
        )
        .with_span(span)
    }

    #[must_use]
    pub fn reserved_name(name: &str, span: Span) -> Self {
        Self::new(
            ErrorKind::ReservedName,
            format!("'{name}' is a reserved name and cannot be bound with `let`"),
        )
        .with_span(span)
    }

    #[must_use]
    pub fn regex(pattern: &str, cause: &fancy_regex::Error) -> Self {
        Self::new(
            ErrorKind::RegexError,
            format!("invalid pattern '{pattern}': {cause}"),
        )
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(span) = &self.span {
            write!(f, " (at {span})")?;
        }
        Ok(())
    }
}

impl std::error::Error for EngineError {}

/// Convenience alias used throughout the evaluator and synthesizer.
pub type EngineResult<T> = Result<T, EngineError>;
