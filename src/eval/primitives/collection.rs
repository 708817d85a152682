//! Collection primitives (§4.D "Collection primitives").

use indexmap::IndexMap;

use crate::error::{EngineError, ErrorKind};
use crate::eval::{apply_lambda, Ctx};
use crate::parser::Span;
use crate::value::{Lambda, Value};

pub fn call(
    name: &str,
    args: &[Value],
    span: Span,
    ctx: &mut Ctx<'_>,
) -> Option<Result<Value, EngineError>> {
    match name {
        "list" => Some(Ok(Value::List(args.to_vec()))),
        "record" => Some(record(args, span)),
        "count" => Some(count(args, span)),
        "sum" => Some(sum(args, span)),
        "filter" => Some(filter(args, span, ctx)),
        "map" => Some(map(args, span, ctx)),
        "reduce" => Some(reduce(args, span, ctx)),
        "take" => Some(take(args, span)),
        "drop" => Some(drop_(args, span)),
        "first" => Some(first(args, span)),
        "last" => Some(last(args, span)),
        "reverse" => Some(reverse(args, span)),
        "distinct" => Some(distinct(args, span)),
        "sort" => Some(sort(args, span)),
        "group-by" => Some(group_by(args, span, ctx)),
        "index" => Some(index(args, span)),
        _ => None,
    }
}

fn as_list<'a>(v: &'a Value, position: usize, span: Span) -> Result<&'a [Value], EngineError> {
    match v {
        Value::List(items) => Ok(items),
        other => Err(EngineError::type_mismatch(position, "list", other.type_name(), span)),
    }
}

fn as_lambda<'a>(v: &'a Value, position: usize, span: Span) -> Result<&'a Lambda, EngineError> {
    match v {
        Value::Lambda(l) => Ok(l),
        other => Err(EngineError::type_mismatch(position, "lambda", other.type_name(), span)),
    }
}

fn as_int(v: &Value, position: usize, span: Span) -> Result<i64, EngineError> {
    match v {
        Value::Int(i) => Ok(*i),
        other => Err(EngineError::type_mismatch(position, "int", other.type_name(), span)),
    }
}

/// Coerces a value to a number the way `sum`/`parseNumber` do (§4.D):
/// non-numeric values after coercion are skipped, not faulted.
fn coerce_numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Str(s) => crate::eval::primitives::numeric::parse_number_str(s),
        Value::GrepHit(hit) => crate::eval::primitives::numeric::parse_number_str(&hit.line),
        _ => None,
    }
}

/// `(record K1 V1 K2 V2 ...)`: builds a Record from alternating string keys
/// and values, preserving insertion order. Needed so `synthesize-extractor`'s
/// `{input, output}` examples (§4.F) can be assembled from Nucleus source
/// itself, not just constructed on the Rust side; grounded the same way
/// `list` is, in §8's own example usage.
fn record(args: &[Value], span: Span) -> Result<Value, EngineError> {
    if args.len() % 2 != 0 {
        return Err(EngineError::arity("an even number", args.len(), span));
    }
    let mut map = IndexMap::new();
    for (i, pair) in args.chunks(2).enumerate() {
        let [key, value] = pair else { unreachable!("chunks(2) on an even-length slice") };
        let key = key
            .promote_to_str()
            .ok_or_else(|| EngineError::type_mismatch(i * 2 + 1, "string", key.type_name(), span))?;
        map.insert(key.to_string(), value.clone());
    }
    Ok(Value::Record(map))
}

fn count(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [v] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    Ok(match v {
        Value::Null => Value::Int(0),
        Value::List(items) => Value::Int(items.len() as i64),
        Value::Str(s) => Value::Int(s.chars().count() as i64),
        other => return Err(EngineError::type_mismatch(1, "list, string, or null", other.type_name(), span)),
    })
}

fn sum(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [v] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    let items = as_list(v, 1, span)?;
    let mut total = 0.0;
    let mut all_int = true;
    for item in items {
        if let Value::Float(_) = item {
            all_int = false;
        }
        if let Some(n) = coerce_numeric(item) {
            total += n;
        }
        // non-numeric elements are skipped (§4.D `sum` contract)
    }
    if all_int {
        #[allow(clippy::cast_possible_truncation)]
        Ok(Value::Int(total as i64))
    } else {
        Ok(Value::Float(total))
    }
}

fn filter(args: &[Value], span: Span, ctx: &mut Ctx<'_>) -> Result<Value, EngineError> {
    let [list, pred] = args else {
        return Err(EngineError::arity("2", args.len(), span));
    };
    let items = as_list(list, 1, span)?;
    let lambda = as_lambda(pred, 2, span)?;
    let mut out = Vec::new();
    for item in items {
        let kept = apply_lambda(lambda, item.clone(), ctx)?;
        if kept.is_truthy() {
            out.push(item.clone());
        }
    }
    Ok(Value::List(out))
}

fn map(args: &[Value], span: Span, ctx: &mut Ctx<'_>) -> Result<Value, EngineError> {
    let [list, f] = args else {
        return Err(EngineError::arity("2", args.len(), span));
    };
    let items = as_list(list, 1, span)?;
    let lambda = as_lambda(f, 2, span)?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(apply_lambda(lambda, item.clone(), ctx)?);
    }
    Ok(Value::List(out))
}

/// `(reduce LIST INIT F)` folds left-to-right: `acc = F(acc, x)` (§4.D).
/// Lambdas take a single parameter (§4.D, §9 "currified manually by the
/// caller when needed"), so a two-argument `F` is supplied curried:
/// `F(acc)` must itself evaluate to a lambda, which is then applied to `x`.
fn reduce(args: &[Value], span: Span, ctx: &mut Ctx<'_>) -> Result<Value, EngineError> {
    let [list, init, f] = args else {
        return Err(EngineError::arity("3", args.len(), span));
    };
    let items = as_list(list, 1, span)?;
    let lambda = as_lambda(f, 3, span)?;
    let mut acc = init.clone();
    for item in items {
        let partial = apply_lambda(lambda, acc, ctx)?;
        let inner = as_lambda(&partial, 3, span)?;
        acc = apply_lambda(inner, item.clone(), ctx)?;
    }
    Ok(acc)
}

fn take(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [list, n] = args else {
        return Err(EngineError::arity("2", args.len(), span));
    };
    let items = as_list(list, 1, span)?;
    let n = as_int(n, 2, span)?.max(0) as usize;
    Ok(Value::List(items.iter().take(n).cloned().collect()))
}

fn drop_(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [list, n] = args else {
        return Err(EngineError::arity("2", args.len(), span));
    };
    let items = as_list(list, 1, span)?;
    let n = as_int(n, 2, span)?.max(0) as usize;
    Ok(Value::List(items.iter().skip(n).cloned().collect()))
}

fn first(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [list] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    let items = as_list(list, 1, span)?;
    Ok(items.first().cloned().unwrap_or(Value::Null))
}

fn last(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [list] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    let items = as_list(list, 1, span)?;
    Ok(items.last().cloned().unwrap_or(Value::Null))
}

fn reverse(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [list] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    let mut items = as_list(list, 1, span)?.to_vec();
    items.reverse();
    Ok(Value::List(items))
}

fn distinct(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [list] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    let items = as_list(list, 1, span)?;
    let mut out: Vec<Value> = Vec::new();
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    Ok(Value::List(out))
}

fn sort(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [list] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    let mut items = as_list(list, 1, span)?.to_vec();
    items.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Ok(Value::List(items))
}

fn group_by(args: &[Value], span: Span, ctx: &mut Ctx<'_>) -> Result<Value, EngineError> {
    let [list, f] = args else {
        return Err(EngineError::arity("2", args.len(), span));
    };
    let items = as_list(list, 1, span)?;
    let lambda = as_lambda(f, 2, span)?;
    let mut groups: IndexMap<String, Vec<Value>> = IndexMap::new();
    for item in items {
        let key_value = apply_lambda(lambda, item.clone(), ctx)?;
        let key = key_value.to_key_string();
        groups.entry(key).or_default().push(item.clone());
    }
    let record = groups
        .into_iter()
        .map(|(k, v)| (k, Value::List(v)))
        .collect();
    Ok(Value::Record(record))
}

/// `(index LIST N)`: element at position `N`, negative counting from the
/// end (§4.F primitive catalog). Out-of-range is `null`, not an error, so a
/// synthesis candidate built on it simply fails verification rather than
/// aborting the search.
fn index(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [list, n] = args else {
        return Err(EngineError::arity("2", args.len(), span));
    };
    let items = as_list(list, 1, span)?;
    let n = as_int(n, 2, span)?;
    let resolved = if n >= 0 {
        usize::try_from(n).ok()
    } else {
        usize::try_from(-n).ok().and_then(|from_end| items.len().checked_sub(from_end))
    };
    Ok(resolved.and_then(|i| items.get(i)).cloned().unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::env::Env;
    use crate::parser::parse;

    fn ctx_run(src: &str, env: &mut Env) -> Result<Value, EngineError> {
        let expr = parse(src).unwrap();
        let config = Config::default();
        let mut log = Vec::new();
        let mut ctx = Ctx::new(None, &config, &mut log);
        crate::eval::eval(&expr, env, &mut ctx)
    }

    #[test]
    fn record_builds_ordered_map_from_pairs() {
        let mut env = Env::new();
        let v = ctx_run(r#"(record "input" "$1,000" "output" 1000)"#, &mut env).unwrap();
        let Value::Record(map) = v else {
            panic!("expected record");
        };
        assert_eq!(map.get("input"), Some(&Value::Str("$1,000".to_string())));
        assert_eq!(map.get("output"), Some(&Value::Int(1000)));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["input", "output"]);
    }

    #[test]
    fn record_rejects_odd_argument_count() {
        let err = record(&[Value::Str("input".into())], Span::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArityError);
    }

    #[test]
    fn count_list_string_null() {
        assert_eq!(count(&[Value::List(vec![Value::Int(1), Value::Int(2)])], Span::default()).unwrap(), Value::Int(2));
        assert_eq!(count(&[Value::Str("abc".into())], Span::default()).unwrap(), Value::Int(3));
        assert_eq!(count(&[Value::Null], Span::default()).unwrap(), Value::Int(0));
    }

    #[test]
    fn sum_skips_non_numeric_and_stays_int_when_all_int() {
        let list = Value::List(vec![Value::Int(1), Value::Str("not a number".into()), Value::Int(2)]);
        assert_eq!(sum(&[list], Span::default()).unwrap(), Value::Int(3));
    }

    #[test]
    fn map_upper_on_strings() {
        let mut env = Env::new();
        let v = ctx_run(r#"(map (list "a" "b") (lambda x (upper x)))"#, &mut env).unwrap();
        assert_eq!(
            v,
            Value::List(vec![Value::Str("A".to_string()), Value::Str("B".to_string())])
        );
    }

    #[test]
    fn filter_keeps_truthy() {
        let mut env = Env::new();
        let v = ctx_run(r#"(filter (list "" "x" "") (lambda s (count s)))"#, &mut env).unwrap();
        assert_eq!(v, Value::List(vec![Value::Str("x".to_string())]));
    }

    #[test]
    fn reduce_sums_via_curried_lambda() {
        let mut env = Env::new();
        let v = ctx_run(
            r#"(reduce (list 1 2 3) 0 (lambda acc (lambda x (sum (list acc x)))))"#,
            &mut env,
        );
        assert_eq!(v.unwrap(), Value::Int(6));
    }

    #[test]
    fn group_by_preserves_first_appearance_order() {
        let mut env = Env::new();
        let v = ctx_run(
            r#"(group-by (list "aa" "b" "cc") (lambda s (count s)))"#,
            &mut env,
        )
        .unwrap();
        let Value::Record(map) = v else {
            panic!("expected record");
        };
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["2", "1"]);
    }

    #[test]
    fn index_supports_negative_and_out_of_range() {
        let list = Value::List(vec![Value::Str("a".into()), Value::Str("b".into()), Value::Str("c".into())]);
        assert_eq!(index(&[list.clone(), Value::Int(1)], Span::default()).unwrap(), Value::Str("b".into()));
        assert_eq!(index(&[list.clone(), Value::Int(-1)], Span::default()).unwrap(), Value::Str("c".into()));
        assert_eq!(index(&[list, Value::Int(5)], Span::default()).unwrap(), Value::Null);
    }

    #[test]
    fn distinct_and_sort() {
        let v = distinct(&[Value::List(vec![Value::Int(1), Value::Int(1), Value::Int(2)])], Span::default()).unwrap();
        assert_eq!(v, Value::List(vec![Value::Int(1), Value::Int(2)]));

        let v = sort(&[Value::List(vec![Value::Int(3), Value::Int(1), Value::Int(2)])], Span::default()).unwrap();
        assert_eq!(v, Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    }
}
