//! Candidate structure templates and the regex pattern catalog (§4.F).

use crate::parser::{Atom, Expr, Span};

/// The output type a candidate's result is expected to strictly equal
/// (§4.F step 1 "Infer output type of the first example").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Int,
    Float,
    Str,
    StrDated,
    Bool,
}

fn span() -> Span {
    Span::default()
}

fn sym(name: &str) -> Expr {
    Expr::Atom(Atom::Symbol(name.to_string()), span())
}

fn string_lit(s: &str) -> Expr {
    Expr::Atom(Atom::Str(s.to_string()), span())
}

fn int_lit(i: i64) -> Expr {
    Expr::Atom(Atom::Int(i), span())
}

fn bool_lit(b: bool) -> Expr {
    Expr::Atom(Atom::Bool(b), span())
}

fn call(head: &str, args: Vec<Expr>) -> Expr {
    let mut items = vec![sym(head)];
    items.extend(args);
    Expr::List(items, span())
}

/// A candidate composition: a single-parameter Expr (parameter always named
/// `x`) plus the output type it targets, used to build the returned Lambda.
pub struct Candidate {
    pub output_type: OutputType,
    pub body: Expr,
}

/// A structure template: given an extraction pattern and capture group,
/// builds the Expr body of a candidate (§4.F "Candidate structure
/// templates").
type TemplateFn = fn(pattern: &str, group: i64) -> Expr;

struct TemplateSpec {
    output_type: OutputType,
    build: TemplateFn,
}

fn tmpl_match_parse_int(pattern: &str, group: i64) -> Expr {
    call(
        "parseInt",
        vec![call(
            "match",
            vec![sym("x"), string_lit(pattern), int_lit(group)],
        )],
    )
}

fn tmpl_match_parse_float(pattern: &str, group: i64) -> Expr {
    call(
        "parseFloat",
        vec![call(
            "match",
            vec![sym("x"), string_lit(pattern), int_lit(group)],
        )],
    )
}

fn tmpl_match_strip_commas_parse_float(pattern: &str, group: i64) -> Expr {
    call(
        "parseFloat",
        vec![call(
            "replace",
            vec![
                call("match", vec![sym("x"), string_lit(pattern), int_lit(group)]),
                string_lit(","),
                string_lit(""),
            ],
        )],
    )
}

fn tmpl_match_parse_currency(pattern: &str, group: i64) -> Expr {
    call(
        "parseCurrency",
        vec![call(
            "match",
            vec![sym("x"), string_lit(pattern), int_lit(group)],
        )],
    )
}

fn tmpl_match_parse_date(pattern: &str, group: i64) -> Expr {
    call(
        "parseDate",
        vec![call(
            "match",
            vec![sym("x"), string_lit(pattern), int_lit(group)],
        )],
    )
}

/// `[match(p,g)] → present?`: whether the pattern matched at all, reduced to
/// a strict `Bool` via `if` (`match` itself yields the captured string or
/// `null`, never a `Bool`).
fn tmpl_match_is_present(pattern: &str, group: i64) -> Expr {
    call(
        "if",
        vec![
            call("match", vec![sym("x"), string_lit(pattern), int_lit(group)]),
            bool_lit(true),
            bool_lit(false),
        ],
    )
}

const INT_TEMPLATES: &[TemplateSpec] = &[TemplateSpec {
    output_type: OutputType::Int,
    build: tmpl_match_parse_int,
}];

const BOOL_TEMPLATES: &[TemplateSpec] = &[TemplateSpec {
    output_type: OutputType::Bool,
    build: tmpl_match_is_present,
}];

const FLOAT_TEMPLATES: &[TemplateSpec] = &[
    TemplateSpec {
        output_type: OutputType::Float,
        build: tmpl_match_parse_float,
    },
    TemplateSpec {
        output_type: OutputType::Float,
        build: tmpl_match_strip_commas_parse_float,
    },
    TemplateSpec {
        output_type: OutputType::Float,
        build: tmpl_match_parse_currency,
    },
];

const STR_DATED_TEMPLATES: &[TemplateSpec] = &[TemplateSpec {
    output_type: OutputType::StrDated,
    build: tmpl_match_parse_date,
}];

/// `[split(d,i)] → trim`: the plain (non-dated) string-extraction template
/// (§4.F). Delimiter/index pairs are their own small fixed catalog, since
/// the regex `PATTERN_CATALOG` above has no bearing on a split delimiter.
fn tmpl_split_index_trim(delim: &str, index: i64) -> Expr {
    call(
        "trim",
        vec![call(
            "index",
            vec![call("split", vec![sym("x"), string_lit(delim)]), int_lit(index)],
        )],
    )
}

const DELIM_CATALOG: &[(&str, i64)] = &[
    (",", 0),
    (",", 1),
    (",", -1),
    (":", 0),
    (":", 1),
    (":", -1),
    ("|", 0),
    ("|", 1),
    ("|", -1),
    (" ", 0),
    (" ", 1),
    (" ", -1),
];

/// Fixed catalog of extraction patterns (§4.F): currency with/without
/// decimals, plain integer, percentage, key-value suffix, date shapes.
/// `(pattern, group)` pairs, in the deterministic order the search walks.
const PATTERN_CATALOG: &[(&str, i64)] = &[
    (r"\$?([\d,]+\.\d{2})", 1),
    (r"\$?([\d,]+)", 1),
    (r"(-?\d+(?:\.\d+)?)\s*%", 1),
    (r"(-?\d+)", 1),
    (r":\s*([^\s]+)", 1),
    (r"(\d{4}-\d{2}-\d{2})", 0),
    (r"(\d{1,2}/\d{1,2}/\d{4})", 0),
    (r"(\d{1,2}-[A-Za-z]{3}-\d{2})", 0),
    (r"([A-Za-z]+ \d{1,2}, \d{4})", 0),
];

/// Returns the ordered `(template, pattern_index)` enumeration for `output`
/// (§4.F step 3: "breadth-first by template index, then pattern index").
pub fn enumerate(output: OutputType) -> Vec<Candidate> {
    if output == OutputType::Str {
        return DELIM_CATALOG
            .iter()
            .map(|(delim, index)| Candidate {
                output_type: OutputType::Str,
                body: tmpl_split_index_trim(delim, *index),
            })
            .collect();
    }
    let templates: &[TemplateSpec] = match output {
        OutputType::Int => INT_TEMPLATES,
        OutputType::Float => FLOAT_TEMPLATES,
        OutputType::Bool => BOOL_TEMPLATES,
        OutputType::StrDated => STR_DATED_TEMPLATES,
        OutputType::Str => unreachable!("handled above"),
    };
    let mut out = Vec::new();
    for tmpl in templates {
        for (pattern, group) in PATTERN_CATALOG {
            out.push(Candidate {
                output_type: tmpl.output_type,
                body: (tmpl.build)(pattern, *group),
            });
        }
    }
    out
}
