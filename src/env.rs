//! The binding [`Env`]ironment (§3 "Environment"): user bindings plus the engine's
//! reserved names (`RESULTS`, `_1..._N`, `TURN`).

use indexmap::IndexMap;

use crate::value::Value;

pub const RESULTS: &str = "RESULTS";
pub const TURN: &str = "TURN";

/// Whether `name` is one of the engine-reserved bindings (§3, §6.3).
///
/// Reserved names are `RESULTS`, `TURN`, and the history slots `_1`, `_2`, ... (any
/// depth, not just the configured one, since a renamed-at-runtime depth must never let
/// a stale `_N` become bindable by `let`).
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    name == RESULTS
        || name == TURN
        || (name.starts_with('_')
            && name.len() > 1
            && name[1..].chars().all(|c| c.is_ascii_digit()))
}

/// A flat mapping from symbol to [`Value`] (§3 "Environment").
///
/// Cloning an `Env` is a shallow copy of the underlying map; used both for the
/// session's live environment and for value-snapshot lambda captures (§9).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Env {
    bindings: IndexMap<String, Value>,
}

impl Env {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) {
        self.bindings.shift_remove(name);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.bindings.iter()
    }

    #[must_use]
    pub fn turn(&self) -> i64 {
        match self.bindings.get(TURN) {
            Some(Value::Int(n)) => *n,
            _ => 0,
        }
    }

    /// Builds a lambda-closure snapshot containing only the `names` actually
    /// referenced by the lambda body (§9 "Lambdas and closures").
    #[must_use]
    pub fn snapshot(&self, names: &[String]) -> Self {
        let mut snap = Env::new();
        for name in names {
            if let Some(v) = self.bindings.get(name) {
                snap.set(name.clone(), v.clone());
            }
        }
        snap
    }

    /// Binds the result of a completed turn and rotates history (§3, §5): `_N =
    /// _{N-1}`, ..., `_1 = new`, `RESULTS = new` (unless `new` is explicitly `Null`, in
    /// which case `RESULTS` is left unchanged per the RESULTS invariant).
    pub fn rotate_history(&mut self, new_value: &Value, depth: u32) {
        for n in (2..=depth).rev() {
            let prev_key = format!("_{}", n - 1);
            if let Some(v) = self.bindings.get(&prev_key).cloned() {
                self.bindings.insert(format!("_{n}"), v);
            }
        }
        self.bindings.insert("_1".to_string(), new_value.clone());
        if !matches!(new_value, Value::Null) {
            self.bindings.insert(RESULTS.to_string(), new_value.clone());
        }
    }

    pub fn advance_turn(&mut self) {
        let next = self.turn() + 1;
        self.bindings.insert(TURN.to_string(), Value::Int(next));
    }

    /// Clears all bindings, including reserved ones, then resets `TURN` to `0` (§4.E
    /// `reset`).
    pub fn clear(&mut self) {
        self.bindings.clear();
        self.bindings.insert(TURN.to_string(), Value::Int(0));
    }
}
