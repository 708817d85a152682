//! Search primitives (§4.D "Search primitives"): thin wrappers around the
//! Document Store.

use indexmap::IndexMap;

use crate::error::{EngineError, ErrorKind};
use crate::eval::Ctx;
use crate::parser::Span;
use crate::value::Value;

pub fn call(
    name: &str,
    args: &[Value],
    span: Span,
    ctx: &mut Ctx<'_>,
) -> Option<Result<Value, EngineError>> {
    match name {
        "grep" => Some(grep(args, span, ctx)),
        "fuzzy-search" => Some(fuzzy_search(args, span, ctx)),
        "lines" => Some(lines(args, span, ctx)),
        "text-stats" => Some(text_stats(args, span, ctx)),
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

fn grep(args: &[Value], span: Span, ctx: &mut Ctx<'_>) -> Result<Value, EngineError> {
    let [pattern] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    if matches!(pattern, Value::Null) {
        return Ok(Value::Null);
    }
    let pattern = as_str(pattern, 1, span)?;
    let doc = ctx.document(span)?;
    let hits = doc.grep(pattern, ctx.config.grep_default_flags)?;
    Ok(Value::List(
        hits.into_iter().map(|h| Value::GrepHit(Box::new(h))).collect(),
    ))
}

fn fuzzy_search(args: &[Value], span: Span, ctx: &mut Ctx<'_>) -> Result<Value, EngineError> {
    if args.is_empty() || args.len() > 2 {
        return Err(EngineError::arity("1 or 2", args.len(), span));
    }
    if matches!(args[0], Value::Null) {
        return Ok(Value::Null);
    }
    let query = as_str(&args[0], 1, span)?;
    let limit = match args.get(1) {
        Some(v) => as_int(v, 2, span)?.max(0) as usize,
        None => ctx.config.default_fuzzy_limit,
    };
    let doc = ctx.document(span)?;
    let hits = doc.fuzzy(query, limit);
    Ok(Value::List(
        hits.into_iter().map(|h| Value::FuzzyHit(Box::new(h))).collect(),
    ))
}

fn lines(args: &[Value], span: Span, ctx: &mut Ctx<'_>) -> Result<Value, EngineError> {
    let doc = ctx.document(span)?;
    match args {
        [n] => {
            let n = as_int(n, 1, span)?;
            Ok(Value::Str(doc.line(n)?.to_string()))
        }
        [start, end] => {
            let start = as_int(start, 1, span)?;
            let end = as_int(end, 2, span)?;
            Ok(Value::List(
                doc.lines(start, end).into_iter().map(Value::Str).collect(),
            ))
        }
        _ => Err(EngineError::arity("1 or 2", args.len(), span)),
    }
}

fn text_stats(args: &[Value], span: Span, ctx: &mut Ctx<'_>) -> Result<Value, EngineError> {
    if !args.is_empty() {
        return Err(EngineError::arity("0", args.len(), span));
    }
    let doc = ctx.document(span)?;
    let stats = doc.stats();
    let mut record = IndexMap::new();
    record.insert("length".to_string(), Value::Int(stats.length as i64));
    record.insert("line_count".to_string(), Value::Int(stats.line_count as i64));
    let to_list = |lines: Vec<String>| Value::List(lines.into_iter().map(Value::Str).collect());
    let mut sample = IndexMap::new();
    sample.insert("start".to_string(), to_list(stats.sample_start));
    sample.insert("middle".to_string(), to_list(stats.sample_middle));
    sample.insert("end".to_string(), to_list(stats.sample_end));
    record.insert("sample".to_string(), Value::Record(sample));
    Ok(Value::Record(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::document::Document;

    fn run(name: &str, args: &[Value], doc: &Document) -> Result<Value, EngineError> {
        let config = Config::default();
        let mut log = Vec::new();
        let mut ctx = Ctx::new(Some(doc), &config, &mut log);
        call(name, args, Span::default(), &mut ctx).unwrap()
    }

    #[test]
    fn grep_requires_document() {
        let config = Config::default();
        let mut log = Vec::new();
        let mut ctx = Ctx::new(None, &config, &mut log);
        let err = call("grep", &[Value::Str("x".into())], Span::default(), &mut ctx)
            .unwrap()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoDocument);
    }

    #[test]
    fn grep_returns_hits_as_list() {
        let doc = Document::new("one\nERROR here\nthree", None);
        let v = run("grep", &[Value::Str("error".into())], &doc).unwrap();
        match v {
            Value::List(items) => assert_eq!(items.len(), 1),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn lines_single_index() {
        let doc = Document::new("a\nb\nc", None);
        let v = run("lines", &[Value::Int(2)], &doc).unwrap();
        assert_eq!(v, Value::Str("b".to_string()));
    }
}
