//! Nucleus: a stateful document analysis engine.
//!
//! A single loaded [`document::Document`] is queried through a small
//! S-expression language (`parser`, `eval`) evaluated against a
//! [`session::Session`], which owns the turn counter, history bindings, and
//! configuration. A [`synth`] module adds a relational extractor synthesizer
//! on top of the same primitive library the evaluator uses.

pub mod config;
pub mod document;
pub mod env;
pub mod error;
pub mod eval;
pub mod parser;
pub mod preview;
pub mod session;
pub mod synth;
pub mod value;

pub use config::Config;
pub use document::Document;
pub use error::{EngineError, ErrorKind};
pub use preview::Response;
pub use session::Session;
pub use value::Value;
