//! The Session (§4.E): owns `{Document Store, binding environment, turn
//! counter}` and presents the outward `load / execute / bindings / reset /
//! stats` contract.

use std::time::{Duration, Instant};

use indexmap::IndexMap;

use crate::config::Config;
use crate::document::{DocStats, Document};
use crate::env::{is_reserved, Env};
use crate::error::{EngineError, ErrorKind};
use crate::eval::{eval, Ctx};
use crate::parser::parse;
use crate::preview::{preview, BindingsDelta, ErrorPreview, Response, ValuePreview};

/// A stateful document session (§3 "Lifecycle", §4.E).
///
/// Single-threaded with respect to itself: nothing here is `Sync`, and
/// callers are expected to serialize their own `execute` calls, matching
/// §5 "A Session is single-threaded with respect to itself".
pub struct Session {
    config: Config,
    document: Option<Document>,
    env: Env,
    poisoned: bool,
}

impl Session {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut env = Env::new();
        env.set(crate::env::TURN, crate::value::Value::Int(0));
        Self {
            config,
            document: None,
            env,
            poisoned: false,
        }
    }

    /// `load(path_or_text)` (§4.E): ingests content, rebuilds the line
    /// index, resets bindings and `TURN`.
    pub fn load(&mut self, text: impl Into<String>, path: Option<String>) -> (usize, usize) {
        let document = Document::new(text, path);
        let line_count = document.line_count();
        let length = document.length();
        self.document = Some(document);
        self.env.clear();
        self.poisoned = false;
        (line_count, length)
    }

    /// `execute(source)` (§4.E): drives parse -> evaluate -> bind.
    pub fn execute(&mut self, source: &str, timeout: Option<Duration>) -> Response {
        if self.poisoned {
            return self.error_response(
                EngineError::new(ErrorKind::InternalError, "session is poisoned by a prior internal error"),
                Vec::new(),
            );
        }

        let before: IndexMap<String, crate::value::Value> =
            self.env.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

        let mut log = Vec::new();
        let result = self.run_one_turn(source, timeout, &mut log);

        self.env.advance_turn();

        match result {
            Ok(value) => {
                self.env.rotate_history(&value, self.config.history_depth);
                let delta = compute_delta(&before, &self.env);
                Response {
                    ok: true,
                    value: Some(preview(&value, &self.config)),
                    error: None,
                    logs: log,
                    turn: self.env.turn(),
                    bindings_delta: Some(delta),
                }
            }
            Err(err) => {
                if err.kind.is_fatal() {
                    self.poisoned = true;
                }
                // Shift the `_N` chain without touching RESULTS (passing
                // `Null` here is what keeps RESULTS unchanged, per its own
                // invariant), then overwrite `_1` with a record describing
                // the error, so a failed turn is never indistinguishable
                // from one that legitimately evaluated to `null` (§4.D
                // "Failure semantics").
                self.env
                    .rotate_history(&crate::value::Value::Null, self.config.history_depth);
                self.env.set("_1", error_history_value(&err));
                self.error_response(err, log)
            }
        }
    }

    fn run_one_turn(
        &mut self,
        source: &str,
        timeout: Option<Duration>,
        log: &mut Vec<String>,
    ) -> Result<crate::value::Value, EngineError> {
        let expr = parse(source)?;
        let mut ctx = Ctx::new(self.document.as_ref(), &self.config, log);
        ctx.deadline = timeout.map(|d| Instant::now() + d);
        eval(&expr, &mut self.env, &mut ctx)
    }

    fn error_response(&self, err: EngineError, log: Vec<String>) -> Response {
        Response {
            ok: false,
            value: None,
            error: Some(ErrorPreview::from(&err)),
            logs: log,
            turn: self.env.turn(),
            bindings_delta: None,
        }
    }

    /// `bindings()` (§4.E): a snapshot of user + reserved names to
    /// summarized preview values.
    #[must_use]
    pub fn bindings(&self) -> IndexMap<String, ValuePreview> {
        self.env
            .iter()
            .map(|(k, v)| (k.clone(), preview(v, &self.config)))
            .collect()
    }

    /// `reset()` (§4.E): clears all bindings, resets `TURN` to 0; the
    /// document is retained.
    pub fn reset(&mut self) {
        self.env.clear();
        self.poisoned = false;
    }

    /// `stats()` (§4.E): Document stats, or `NoDocument` if none is loaded.
    pub fn stats(&self) -> Result<DocStats, EngineError> {
        self.document
            .as_ref()
            .map(Document::stats)
            .ok_or_else(|| EngineError::new(ErrorKind::NoDocument, "no document is loaded"))
    }

    #[must_use]
    pub fn turn(&self) -> i64 {
        self.env.turn()
    }

    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Builds the `_1` record for a failed turn: `{error, message}`, keeping the
/// error kind and text visible to a script inspecting `_1` after a failure.
fn error_history_value(err: &EngineError) -> crate::value::Value {
    let mut map = IndexMap::new();
    map.insert("error".to_string(), crate::value::Value::Str(err.kind.to_string()));
    map.insert("message".to_string(), crate::value::Value::Str(err.message.clone()));
    crate::value::Value::Record(map)
}

fn compute_delta(before: &IndexMap<String, crate::value::Value>, env: &Env) -> BindingsDelta {
    let mut added = Vec::new();
    let mut changed = Vec::new();
    for (name, value) in env.iter() {
        if is_reserved(name) {
            continue;
        }
        match before.get(name) {
            None => added.push(name.clone()),
            Some(prev) if prev != value => changed.push(name.clone()),
            Some(_) => {}
        }
    }
    BindingsDelta { added, changed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn execute_before_load_is_no_document() {
        let mut session = Session::default();
        let resp = session.execute("(count (grep \"x\"))", None);
        assert!(!resp.ok);
        assert_eq!(resp.error.unwrap().kind, "NoDocument");
        assert_eq!(resp.turn, 1);
    }

    #[test]
    fn s1_basic_grep_and_count() {
        let mut session = Session::default();
        session.load(
            "line one\nERROR a\nline three\nERROR b\nline five\nERROR c\nline seven\nERROR d\nline nine\nERROR e",
            None,
        );
        let resp = session.execute("(grep \"ERROR\")", None);
        assert!(resp.ok);
        let resp = session.execute("(count RESULTS)", None);
        assert!(resp.ok);
        assert_eq!(resp.value.unwrap(), ValuePreview::Int { value: 5 });
    }

    #[test]
    fn error_turn_occupies_slot_1_as_a_distinguishable_record_not_null() {
        let mut session = Session::default();
        session.load("x", None);
        session.execute("(let a 1)", None); // RESULTS stays unset (a pure `let` returns a non-null value but never reads a document result)
        let before_results = session.bindings().get("RESULTS").cloned();

        let resp = session.execute("(bogus", None);
        assert!(!resp.ok);

        match session.bindings().get("_1") {
            Some(ValuePreview::Record { fields }) => {
                assert!(fields.iter().any(|(k, _)| k == "error"));
                assert!(fields.iter().any(|(k, _)| k == "message"));
            }
            other => panic!("expected `_1` to be an error record, got {other:?}"),
        }
        assert_eq!(session.bindings().get("RESULTS").cloned(), before_results);
    }

    #[test]
    fn s6_turn_monotonicity_on_error() {
        let mut session = Session::default();
        session.reset();
        let resp = session.execute("(bogus", None);
        assert!(!resp.ok);
        assert_eq!(resp.turn, 1);
        assert_eq!(resp.error.as_ref().unwrap().kind, "ParseError");

        session.load("x\ny", None);
        let resp = session.execute("(count (grep \"x\"))", None);
        assert!(resp.ok);
    }

    #[test]
    fn history_rotates_across_four_turns() {
        let mut session = Session::default();
        session.load("a\nb\nc", None);
        for _ in 0..4 {
            session.execute("(count (lines 1 3))", None);
        }
        let bindings = session.bindings();
        assert_eq!(bindings.get("_1"), Some(&ValuePreview::Int { value: 3 }));
        assert_eq!(bindings.get("RESULTS"), Some(&ValuePreview::Int { value: 3 }));
        assert_eq!(session.turn(), 4);
    }

    #[test]
    fn reset_then_pure_expression_matches_fresh_session() {
        let mut fresh = Session::default();
        fresh.load("alpha\nbeta", None);
        let fresh_resp = fresh.execute("(count (grep \"a\"))", None);

        let mut reused = Session::default();
        reused.load("alpha\nbeta", None);
        reused.execute("(let throwaway 1)", None);
        reused.reset();
        let reused_resp = reused.execute("(count (grep \"a\"))", None);

        assert_eq!(fresh_resp.value, reused_resp.value);
    }

    #[test]
    fn let_over_reserved_name_is_rejected_without_corrupting_bindings() {
        let mut session = Session::default();
        session.load("x", None);
        session.execute("(let a 1)", None);
        let resp = session.execute("(let RESULTS 2)", None);
        assert!(!resp.ok);
        assert_eq!(resp.error.unwrap().kind, "ReservedName");
        assert_eq!(session.bindings().get("a"), Some(&ValuePreview::Int { value: 1 }));
    }

    #[test]
    fn bindings_delta_reports_added_and_changed() {
        let mut session = Session::default();
        session.load("x", None);
        let resp = session.execute("(let a 1)", None);
        let delta = resp.bindings_delta.unwrap();
        assert_eq!(delta.added, vec!["a".to_string()]);

        let resp = session.execute("(let a 2)", None);
        let delta = resp.bindings_delta.unwrap();
        assert_eq!(delta.changed, vec!["a".to_string()]);
    }

    #[test]
    fn stats_requires_document() {
        let session = Session::default();
        assert!(session.stats().is_err());
    }

    #[test]
    fn unused_value_import_guard() {
        let _ = Value::Null;
    }
}
