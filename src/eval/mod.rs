//! The Nucleus evaluator (§4.D): a tree-walking interpreter over the Value
//! Model, with special forms and the primitive library.

pub mod primitives;

use crate::config::Config;
use crate::document::Document;
use crate::env::Env;
use crate::error::{EngineError, ErrorKind};
use crate::parser::{Atom, Expr, Span};
use crate::value::{Lambda, Value};

/// Everything a primitive needs beyond its evaluated arguments: the loaded
/// document (if any), the session configuration, the per-call log buffer
/// (§4.D), and an optional deadline (§5 "Cancellation and timeouts").
pub struct Ctx<'a> {
    pub doc: Option<&'a Document>,
    pub config: &'a Config,
    pub log: &'a mut Vec<String>,
    pub deadline: Option<std::time::Instant>,
}

impl<'a> Ctx<'a> {
    pub fn new(doc: Option<&'a Document>, config: &'a Config, log: &'a mut Vec<String>) -> Self {
        Self {
            doc,
            config,
            log,
            deadline: None,
        }
    }

    pub fn document(&self, span: Span) -> Result<&'a Document, EngineError> {
        self.doc
            .ok_or_else(|| EngineError::new(ErrorKind::NoDocument, "no document is loaded").with_span(span))
    }

    /// Whether the configured deadline, if any, has passed (§5; checked by
    /// the synthesizer between candidates).
    #[must_use]
    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|d| std::time::Instant::now() >= d)
    }
}

/// Evaluates `expr` against `env`, mutating `env` only via the `let` special
/// form (§4.D, §5 "no primitive may mutate an existing binding" other than
/// through `let`).
pub fn eval(expr: &Expr, env: &mut Env, ctx: &mut Ctx<'_>) -> Result<Value, EngineError> {
    if ctx.deadline_exceeded() {
        return Err(EngineError::new(ErrorKind::TimeoutError, "execution deadline exceeded").with_span(expr.span()));
    }
    match expr {
        Expr::Atom(atom, span) => eval_atom(atom, *span, env),
        Expr::List(items, span) => eval_list(items, *span, env, ctx),
    }
}

fn eval_atom(atom: &Atom, span: Span, env: &Env) -> Result<Value, EngineError> {
    Ok(match atom {
        Atom::Int(i) => Value::Int(*i),
        Atom::Float(f) => Value::Float(*f),
        Atom::Str(s) => Value::Str(s.clone()),
        Atom::Bool(b) => Value::Bool(*b),
        Atom::Symbol(name) => env.get(name).cloned().unwrap_or_else(|| {
            let _ = span;
            Value::Null
        }),
    })
}

fn eval_list(
    items: &[Expr],
    span: Span,
    env: &mut Env,
    ctx: &mut Ctx<'_>,
) -> Result<Value, EngineError> {
    let Some(Expr::Atom(Atom::Symbol(head), head_span)) = items.first() else {
        return Err(EngineError::new(
            ErrorKind::ParseError,
            "list head must be a symbol naming a special form or primitive",
        )
        .with_span(span));
    };
    let head_span = *head_span;
    let args = &items[1..];

    match head.as_str() {
        "let" => eval_let(args, span, env, ctx),
        "lambda" => eval_lambda(args, span, env),
        "if" => eval_if(args, span, env, ctx),
        "do" => eval_do(args, span, env, ctx),
        name => {
            // A name bound to a Lambda (e.g. one returned by
            // `synthesize-extractor`) is callable directly in head
            // position, applied to its single argument (§8 S4: `(f
            // "$5,000")`).
            if let Some(Value::Lambda(lambda)) = env.get(name).cloned() {
                let [arg] = args else {
                    return Err(EngineError::arity("1", args.len(), span));
                };
                let value = eval(arg, env, ctx)?;
                return apply_lambda(&lambda, value, ctx);
            }
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval(arg, env, ctx)?);
            }
            apply_named(name, &values, span, head_span, env, ctx)
        }
    }
}

fn eval_let(
    args: &[Expr],
    span: Span,
    env: &mut Env,
    ctx: &mut Ctx<'_>,
) -> Result<Value, EngineError> {
    let [name_expr, value_expr] = args else {
        return Err(EngineError::arity("2", args.len(), span));
    };
    let Expr::Atom(Atom::Symbol(name), name_span) = name_expr else {
        return Err(EngineError::type_mismatch(1, "symbol", "expression", span));
    };
    if crate::env::is_reserved(name) {
        return Err(EngineError::reserved_name(name, *name_span));
    }
    let value = eval(value_expr, env, ctx)?;
    env.set(name.clone(), value.clone());
    Ok(value)
}

fn eval_lambda(args: &[Expr], span: Span, env: &Env) -> Result<Value, EngineError> {
    let [param_expr, body] = args else {
        return Err(EngineError::arity("2", args.len(), span));
    };
    let Expr::Atom(Atom::Symbol(param), _) = param_expr else {
        return Err(EngineError::type_mismatch(1, "symbol", "expression", span));
    };
    let mut free = Vec::new();
    collect_free_vars(body, param, &mut free);
    let snapshot = env.snapshot(&free);
    Ok(Value::Lambda(Box::new(Lambda::new(
        param.clone(),
        body.clone(),
        snapshot,
    ))))
}

fn eval_if(
    args: &[Expr],
    span: Span,
    env: &mut Env,
    ctx: &mut Ctx<'_>,
) -> Result<Value, EngineError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(EngineError::arity("2 or 3", args.len(), span));
    }
    let cond = eval(&args[0], env, ctx)?;
    if cond.is_truthy() {
        eval(&args[1], env, ctx)
    } else if let Some(else_branch) = args.get(2) {
        eval(else_branch, env, ctx)
    } else {
        Ok(Value::Null)
    }
}

fn eval_do(
    args: &[Expr],
    span: Span,
    env: &mut Env,
    ctx: &mut Ctx<'_>,
) -> Result<Value, EngineError> {
    if args.is_empty() {
        return Err(EngineError::arity("at least 1", 0, span));
    }
    let mut result = Value::Null;
    for expr in args {
        result = eval(expr, env, ctx)?;
    }
    Ok(result)
}

/// Walks `expr` collecting symbol references that are not in head (dispatch)
/// position and not `exclude` (the lambda's own parameter), for the
/// value-snapshot closure capture described in §9.
fn collect_free_vars(expr: &Expr, exclude: &str, out: &mut Vec<String>) {
    match expr {
        Expr::Atom(Atom::Symbol(name), _) => {
            if name != exclude && !out.contains(name) {
                out.push(name.clone());
            }
        }
        Expr::Atom(_, _) => {}
        Expr::List(items, _) => {
            for item in items.iter().skip(1) {
                collect_free_vars(item, exclude, out);
            }
        }
    }
}

/// Applies a previously-constructed lambda to a single argument value. Used
/// both for direct calls (a lambda used as the list head is not supported;
/// lambdas are only invoked by collection primitives) and by the
/// synthesizer to run a candidate composition.
pub fn apply_lambda(
    lambda: &Lambda,
    arg: Value,
    ctx: &mut Ctx<'_>,
) -> Result<Value, EngineError> {
    let mut call_env = lambda.captured.clone();
    call_env.set(lambda.param.clone(), arg);
    eval(&lambda.body, &mut call_env, ctx)
}

fn apply_named(
    name: &str,
    args: &[Value],
    span: Span,
    head_span: Span,
    _env: &mut Env,
    ctx: &mut Ctx<'_>,
) -> Result<Value, EngineError> {
    if let Some(result) = primitives::search::call(name, args, span, ctx) {
        return result;
    }
    if let Some(result) = primitives::collection::call(name, args, span, ctx) {
        return result;
    }
    if let Some(result) = primitives::strings::call(name, args, span) {
        return result;
    }
    if let Some(result) = primitives::numeric::call(name, args, span) {
        return result;
    }
    if name == "synthesize-extractor" {
        return crate::synth::synthesize_extractor(args, span, ctx);
    }
    Err(EngineError::new(
        ErrorKind::ParseError,
        format!("unknown primitive or special form '{name}'"),
    )
    .with_span(head_span))
}
