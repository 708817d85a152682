//! String / extraction primitives (§4.D "String / extraction primitives").

use fancy_regex::Regex;

use crate::error::{EngineError, ErrorKind};
use crate::parser::Span;
use crate::value::Value;

pub fn call(name: &str, args: &[Value], span: Span) -> Option<Result<Value, EngineError>> {
    match name {
        "match" => Some(match_(args, span)),
        "replace" => Some(replace(args, span)),
        "split" => Some(split(args, span)),
        "contains" => Some(contains(args, span)),
        "starts-with" => Some(starts_with(args, span)),
        "ends-with" => Some(ends_with(args, span)),
        "trim" => Some(trim(args, span)),
        "upper" => Some(upper(args, span)),
        "lower" => Some(lower(args, span)),
        _ => None,
    }
}

fn as_str<'a>(v: &'a Value, position: usize, span: Span) -> Result<&'a str, EngineError> {
    v.promote_to_str()
        .ok_or_else(|| EngineError::type_mismatch(position, "string", v.type_name(), span))
}

fn as_int(v: &Value, position: usize, span: Span) -> Result<i64, EngineError> {
    match v {
        Value::Int(i) => Ok(*i),
        other => Err(EngineError::type_mismatch(position, "int", other.type_name(), span)),
    }
}

fn compile(pattern: &str) -> Result<Regex, EngineError> {
    Regex::new(pattern).map_err(|e| EngineError::regex(pattern, &e))
}

fn match_(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [s, pattern, group] = args else {
        return Err(EngineError::arity("3", args.len(), span));
    };
    if matches!(s, Value::Null) {
        return Ok(Value::Null);
    }
    let s = as_str(s, 1, span)?;
    let pattern = as_str(pattern, 2, span)?;
    let group = as_int(group, 3, span)?;
    if group < 0 {
        return Err(EngineError::type_mismatch(3, "non-negative int", "negative int", span));
    }
    let re = compile(pattern)?;
    let caps = re
        .captures(s)
        .map_err(|e| EngineError::regex(pattern, &e))?;
    Ok(match caps {
        Some(c) => c
            .get(group as usize)
            .map(|m| Value::Str(m.as_str().to_string()))
            .unwrap_or(Value::Null),
        None => Value::Null,
    })
}

fn replace(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [s, from, to] = args else {
        return Err(EngineError::arity("3", args.len(), span));
    };
    if matches!(s, Value::Null) {
        return Ok(Value::Null);
    }
    let s = as_str(s, 1, span)?;
    let from = as_str(from, 2, span)?;
    let to = as_str(to, 3, span)?;
    let re = compile(from)?;
    Ok(Value::Str(re.replace_all(s, to).into_owned()))
}

fn split(args: &[Value], span: Span) -> Result<Value, EngineError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(EngineError::arity("2 or 3", args.len(), span));
    }
    if matches!(args[0], Value::Null) {
        return Ok(Value::Null);
    }
    let s = as_str(&args[0], 1, span)?;
    let delim = as_str(&args[1], 2, span)?;
    let parts: Vec<String> = if delim.is_empty() {
        s.chars().map(String::from).collect()
    } else {
        s.split(delim).map(str::to_string).collect()
    };

    match args.get(2) {
        None => Ok(Value::List(parts.into_iter().map(Value::Str).collect())),
        Some(index_val) => {
            let index = as_int(index_val, 3, span)?;
            let resolved = if index >= 0 {
                usize::try_from(index).ok()
            } else {
                usize::try_from(-index)
                    .ok()
                    .and_then(|from_end| parts.len().checked_sub(from_end))
            };
            Ok(resolved
                .and_then(|i| parts.get(i))
                .map(|p| Value::Str(p.clone()))
                .unwrap_or(Value::Null))
        }
    }
}

fn contains(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [s, sub] = args else {
        return Err(EngineError::arity("2", args.len(), span));
    };
    if matches!(s, Value::Null) {
        return Ok(Value::Null);
    }
    Ok(Value::Bool(as_str(s, 1, span)?.contains(as_str(sub, 2, span)?)))
}

fn starts_with(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [s, sub] = args else {
        return Err(EngineError::arity("2", args.len(), span));
    };
    if matches!(s, Value::Null) {
        return Ok(Value::Null);
    }
    Ok(Value::Bool(
        as_str(s, 1, span)?.starts_with(as_str(sub, 2, span)?),
    ))
}

fn ends_with(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [s, sub] = args else {
        return Err(EngineError::arity("2", args.len(), span));
    };
    if matches!(s, Value::Null) {
        return Ok(Value::Null);
    }
    Ok(Value::Bool(as_str(s, 1, span)?.ends_with(as_str(sub, 2, span)?)))
}

fn trim(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [s] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    if matches!(s, Value::Null) {
        return Ok(Value::Null);
    }
    Ok(Value::Str(as_str(s, 1, span)?.trim().to_string()))
}

fn upper(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [s] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    if matches!(s, Value::Null) {
        return Ok(Value::Null);
    }
    Ok(Value::Str(as_str(s, 1, span)?.to_uppercase()))
}

fn lower(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [s] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    if matches!(s, Value::Null) {
        return Ok(Value::Null);
    }
    Ok(Value::Str(as_str(s, 1, span)?.to_lowercase()))
}
