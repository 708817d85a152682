//! The Value Model (§3, §4.B): the tagged variant flowing between every node of the
//! evaluator.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use indexmap::IndexMap;

use crate::env::Env;
use crate::parser::Expr;

/// One regex match with its enclosing line (§3 `GrepHit`).
#[derive(Debug, Clone, PartialEq)]
pub struct GrepHit {
    pub matched: String,
    pub line: String,
    pub line_num: u32,
    pub index: u32,
    pub groups: Vec<Option<String>>,
}

/// One fuzzy-match candidate (§3 `FuzzyHit`). Lower `score` is better.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyHit {
    pub line: String,
    pub line_num: u32,
    pub score: f64,
}

/// A captured lambda (§4.D `(lambda PARAM BODY)`).
///
/// Captures the defining environment by value-snapshot (§9 "Lambdas and closures"), not
/// by reference, so history rotation never keeps large environments alive. Lambdas
/// compare by identity (§4.B), via a monotonic id assigned at construction.
#[derive(Debug, Clone)]
pub struct Lambda {
    pub id: u64,
    pub param: String,
    pub body: Rc<Expr>,
    pub captured: Env,
}

static NEXT_LAMBDA_ID: AtomicU64 = AtomicU64::new(1);

impl Lambda {
    #[must_use]
    pub fn new(param: String, body: Expr, captured: Env) -> Self {
        Self {
            id: NEXT_LAMBDA_ID.fetch_add(1, AtomicOrdering::Relaxed),
            param,
            body: Rc::new(body),
            captured,
        }
    }
}

impl PartialEq for Lambda {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// The tagged sum every expression evaluates to (§3 `Value`).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    GrepHit(Box<GrepHit>),
    FuzzyHit(Box<FuzzyHit>),
    Lambda(Box<Lambda>),
    Record(IndexMap<String, Value>),
}

impl Value {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::GrepHit(_) => "grep-hit",
            Self::FuzzyHit(_) => "fuzzy-hit",
            Self::Lambda(_) => "lambda",
            Self::Record(_) => "record",
        }
    }

    /// Truthiness per §4.D collection primitives: `false`, `null`, `0`, `""`, and the
    /// empty list are falsey; everything else is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(l) => !l.is_empty(),
            Self::GrepHit(_) | Self::FuzzyHit(_) | Self::Lambda(_) | Self::Record(_) => true,
        }
    }

    /// The single implicit coercion in the Value Model (§4.D): a `GrepHit` promotes to
    /// its `line` field whenever a primitive needs a string. Everything else is passed
    /// through unchanged.
    #[must_use]
    pub fn promote_to_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::GrepHit(hit) => Some(&hit.line),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String form used as a `group-by` key and for `Display`-free previews; never
    /// panics, never used for stored strings (those keep their own variant).
    #[must_use]
    pub fn to_key_string(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) => s.clone(),
            Self::GrepHit(hit) => hit.line.clone(),
            Self::FuzzyHit(hit) => hit.line.clone(),
            Self::List(_) => "<list>".to_string(),
            Self::Lambda(_) => "<lambda>".to_string(),
            Self::Record(_) => "<record>".to_string(),
        }
    }
}

/// Structural, type-strict equality (§3, §4.B): `1 != 1.0 != "1"`.
impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_f64().unwrap().partial_cmp(&other.as_f64().unwrap())
            }
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.partial_cmp(y) {
                        Some(Ordering::Equal) => continue,
                        other => return other,
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::GrepHit(hit) => write!(f, "{}", hit.line),
            Self::FuzzyHit(hit) => write!(f, "{}", hit.line),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Lambda(l) => write!(f, "<lambda #{}>", l.id),
            Self::Record(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
