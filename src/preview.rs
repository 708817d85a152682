//! Bounded value previews and the session response shape (§6.1).
//!
//! `execute`/`bindings` never hand the caller a full, unbounded
//! serialization of a `Value`: lists are capped with an explicit
//! `truncated` flag and strings are capped with a `…` marker. The full
//! value stays resident in the session for later expressions to use.

use serde::Serialize;

use crate::config::Config;
use crate::error::EngineError;
use crate::value::Value;

/// A size-bounded rendering of a [`Value`] suitable for a caller-facing
/// response (§6.1 "`value` is a bounded preview").
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValuePreview {
    Null,
    Bool { value: bool },
    Int { value: i64 },
    Float { value: f64 },
    Str { value: String, truncated: bool },
    List { items: Vec<ValuePreview>, truncated: bool, len: usize },
    GrepHit { matched: String, line: String, line_num: u32 },
    FuzzyHit { line: String, line_num: u32, score: f64 },
    Lambda { id: u64 },
    Record { fields: Vec<(String, ValuePreview)> },
}

/// Renders `value` bounded by `config`'s preview caps.
#[must_use]
pub fn preview(value: &Value, config: &Config) -> ValuePreview {
    match value {
        Value::Null => ValuePreview::Null,
        Value::Bool(b) => ValuePreview::Bool { value: *b },
        Value::Int(i) => ValuePreview::Int { value: *i },
        Value::Float(f) => ValuePreview::Float { value: *f },
        Value::Str(s) => preview_str(s, config),
        Value::GrepHit(hit) => ValuePreview::GrepHit {
            matched: hit.matched.clone(),
            line: hit.line.clone(),
            line_num: hit.line_num,
        },
        Value::FuzzyHit(hit) => ValuePreview::FuzzyHit {
            line: hit.line.clone(),
            line_num: hit.line_num,
            score: hit.score,
        },
        Value::Lambda(l) => ValuePreview::Lambda { id: l.id },
        Value::List(items) => {
            let truncated = items.len() > config.preview_list_cap;
            let rendered = items
                .iter()
                .take(config.preview_list_cap)
                .map(|v| preview(v, config))
                .collect();
            ValuePreview::List {
                items: rendered,
                truncated,
                len: items.len(),
            }
        }
        Value::Record(map) => ValuePreview::Record {
            fields: map.iter().map(|(k, v)| (k.clone(), preview(v, config))).collect(),
        },
    }
}

fn preview_str(s: &str, config: &Config) -> ValuePreview {
    if s.len() <= config.preview_string_cap {
        return ValuePreview::Str {
            value: s.to_string(),
            truncated: false,
        };
    }
    let mut cap = config.preview_string_cap;
    while cap > 0 && !s.is_char_boundary(cap) {
        cap -= 1;
    }
    ValuePreview::Str {
        value: format!("{}…", &s[..cap]),
        truncated: true,
    }
}

/// An error as surfaced to the caller (§6.1 `error`).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorPreview {
    pub kind: String,
    pub message: String,
    pub span: Option<(u32, u32)>,
}

impl From<&EngineError> for ErrorPreview {
    fn from(e: &EngineError) -> Self {
        Self {
            kind: e.kind.to_string(),
            message: e.message.clone(),
            span: e.span.map(|s| (s.line, s.column)),
        }
    }
}

/// Which binding names were added or changed by a turn (§6.1
/// `bindings_delta`).
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct BindingsDelta {
    pub added: Vec<String>,
    pub changed: Vec<String>,
}

/// The uniform response shape every session request produces (§6.1).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Response {
    pub ok: bool,
    pub value: Option<ValuePreview>,
    pub error: Option<ErrorPreview>,
    pub logs: Vec<String>,
    pub turn: i64,
    pub bindings_delta: Option<BindingsDelta>,
}
