//! The Relational Synthesizer (§4.F): given input/output examples, searches
//! a deterministic candidate space of primitive compositions and verifies
//! each candidate by strict forward evaluation.
//!
//! The miniKanren-style formulation in the distilled spec is a specification
//! device (§9 "Relational search"); this is a plain, deterministic
//! backtracking enumerator over the same template set, which the spec
//! explicitly allows as long as enumeration order stays deterministic.

mod quarter;
mod templates;

use indexmap::IndexMap;

use crate::env::Env;
use crate::error::{EngineError, ErrorKind};
use crate::eval::{apply_lambda, Ctx};
use crate::parser::Span;
use crate::value::{Lambda, Value};
use templates::OutputType;

fn as_record<'a>(v: &'a Value, span: Span) -> Result<&'a IndexMap<String, Value>, EngineError> {
    match v {
        Value::Record(map) => Ok(map),
        other => Err(EngineError::type_mismatch(1, "record", other.type_name(), span)),
    }
}

/// `(synthesize-extractor EXAMPLES)` (§4.D, §4.F).
pub fn synthesize_extractor(
    args: &[Value],
    span: Span,
    ctx: &mut Ctx<'_>,
) -> Result<Value, EngineError> {
    let [examples_val] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    let Value::List(items) = examples_val else {
        return Err(EngineError::type_mismatch(1, "list", examples_val.type_name(), span));
    };

    let mut examples = Vec::with_capacity(items.len());
    for item in items {
        let record = as_record(item, span)?;
        let input = record
            .get("input")
            .ok_or_else(|| EngineError::new(ErrorKind::TypeError, "example missing 'input' field").with_span(span))?
            .clone();
        let output = record
            .get("output")
            .ok_or_else(|| EngineError::new(ErrorKind::TypeError, "example missing 'output' field").with_span(span))?
            .clone();
        examples.push((input, output));
    }

    if examples.len() < 2 {
        return Err(EngineError::new(
            ErrorKind::NeedsMoreExamples,
            format!("synthesis requires at least 2 examples, got {}", examples.len()),
        )
        .with_span(span));
    }

    if let Some(lambda_value) = try_quarter_specializer(&examples) {
        return Ok(lambda_value);
    }

    let output_type = match &examples[0].1 {
        Value::Int(_) => OutputType::Int,
        Value::Float(_) => OutputType::Float,
        Value::Bool(_) => OutputType::Bool,
        Value::Str(s) if looks_like_iso_date(s) => OutputType::StrDated,
        Value::Str(_) => OutputType::Str,
        other => {
            return Err(EngineError::new(
                ErrorKind::NoCandidate,
                format!("no synthesis templates target output type '{}'", other.type_name()),
            )
            .with_span(span))
        }
    };

    let candidates = templates::enumerate(output_type);
    let budget = ctx.config.max_candidates as usize;
    let mut explored = 0usize;

    for candidate in candidates.into_iter().take(budget) {
        if ctx.deadline_exceeded() {
            return Err(EngineError::new(ErrorKind::TimeoutError, "synthesis deadline exceeded").with_span(span));
        }
        explored += 1;
        let lambda = Lambda::new("x".to_string(), candidate.body, Env::new());
        if verifies(&lambda, &examples, ctx) {
            return Ok(Value::Lambda(Box::new(lambda)));
        }
    }

    Err(EngineError::new(
        ErrorKind::NoCandidate,
        format!("no candidate out of {explored} explored satisfied every example"),
    )
    .with_span(span))
}

/// Whether `s` has the `YYYY-MM-DD` shape `parseDate` normalizes to —
/// distinguishes `Str-dated` examples (targeting `STR_DATED_TEMPLATES`) from
/// plain `Str` examples (targeting the `split`/`trim` template) (§4.F step 1).
fn looks_like_iso_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes.iter().enumerate().all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
}

fn verifies(lambda: &Lambda, examples: &[(Value, Value)], ctx: &mut Ctx<'_>) -> bool {
    examples.iter().all(|(input, expected)| {
        apply_lambda(lambda, input.clone(), ctx)
            .map(|actual| &actual == expected)
            .unwrap_or(false)
    })
}

fn try_quarter_specializer(examples: &[(Value, Value)]) -> Option<Value> {
    let pairs: Vec<(String, String)> = examples
        .iter()
        .filter_map(|(i, o)| match (i, o) {
            (Value::Str(a), Value::Str(b)) => Some((a.clone(), b.clone())),
            _ => None,
        })
        .collect();
    if pairs.len() != examples.len() || !quarter::matches(&pairs) {
        return None;
    }
    let lambda = Lambda::new("x".to_string(), quarter::build(), Env::new());
    Some(Value::Lambda(Box::new(lambda)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn make_example(input: Value, output: Value) -> Value {
        let mut map = IndexMap::new();
        map.insert("input".to_string(), input);
        map.insert("output".to_string(), output);
        Value::Record(map)
    }

    fn run(examples: Vec<Value>) -> Result<Value, EngineError> {
        let config = Config::default();
        let mut log = Vec::new();
        let mut ctx = Ctx::new(None, &config, &mut log);
        synthesize_extractor(&[Value::List(examples)], Span::default(), &mut ctx)
    }

    #[test]
    fn needs_more_examples_below_two() {
        let examples = vec![make_example(Value::Str("$1,000".into()), Value::Int(1000))];
        let err = run(examples).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NeedsMoreExamples);
    }

    #[test]
    fn synthesizes_currency_to_int_extractor() {
        let examples = vec![
            make_example(Value::Str("$1,000".into()), Value::Int(1000)),
            make_example(Value::Str("$2,500".into()), Value::Int(2500)),
            make_example(Value::Str("$10,000".into()), Value::Int(10000)),
        ];
        let v = run(examples).unwrap();
        let Value::Lambda(lambda) = v else {
            panic!("expected lambda");
        };
        let config = Config::default();
        let mut log = Vec::new();
        let mut ctx = Ctx::new(None, &config, &mut log);
        let result = apply_lambda(&lambda, Value::Str("$5,000".into()), &mut ctx).unwrap();
        assert_eq!(result, Value::Int(5000));
    }

    #[test]
    fn synthesizes_bool_presence_extractor() {
        let examples = vec![
            make_example(Value::Str("order 42 shipped".into()), Value::Bool(true)),
            make_example(Value::Str("order shipped".into()), Value::Bool(false)),
        ];
        let v = run(examples).unwrap();
        let Value::Lambda(lambda) = v else {
            panic!("expected lambda");
        };
        let config = Config::default();
        let mut log = Vec::new();
        let mut ctx = Ctx::new(None, &config, &mut log);
        let result = apply_lambda(&lambda, Value::Str("invoice 7".into()), &mut ctx).unwrap();
        assert_eq!(result, Value::Bool(true));
        let result = apply_lambda(&lambda, Value::Str("no data here".into()), &mut ctx).unwrap();
        assert_eq!(result, Value::Bool(false));
    }

    #[test]
    fn synthesizes_plain_string_extractor_via_split_index_trim() {
        let examples = vec![
            make_example(Value::Str("apple, 5kg".into()), Value::Str("apple".into())),
            make_example(Value::Str("banana, 3kg".into()), Value::Str("banana".into())),
        ];
        let v = run(examples).unwrap();
        let Value::Lambda(lambda) = v else {
            panic!("expected lambda");
        };
        let config = Config::default();
        let mut log = Vec::new();
        let mut ctx = Ctx::new(None, &config, &mut log);
        let result = apply_lambda(&lambda, Value::Str("cherry, 1kg".into()), &mut ctx).unwrap();
        assert_eq!(result, Value::Str("cherry".to_string()));
    }

    #[test]
    fn no_candidate_on_inconsistent_examples() {
        let examples = vec![
            make_example(Value::Str("$1,000".into()), Value::Int(1000)),
            make_example(Value::Str("$1,000".into()), Value::Int(2000)),
        ];
        let err = run(examples).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoCandidate);
    }

    #[test]
    fn quarter_specializer_precedes_generic_search() {
        let examples = vec![
            make_example(Value::Str("Q1-2024".into()), Value::Str("2024-01".into())),
            make_example(Value::Str("Q3-2023".into()), Value::Str("2023-07".into())),
        ];
        let v = run(examples).unwrap();
        let Value::Lambda(lambda) = v else {
            panic!("expected lambda");
        };
        let config = Config::default();
        let mut log = Vec::new();
        let mut ctx = Ctx::new(None, &config, &mut log);
        let result = apply_lambda(&lambda, Value::Str("Q4-2025".into()), &mut ctx).unwrap();
        assert_eq!(result, Value::Str("2025-10".to_string()));
    }
}
