//! The "quarter -> month" closed-form specializer (§4.F, §9): recognizes
//! examples shaped `(Q[1-4]-YYYY, YYYY-MM)` and emits a direct mapping even
//! when no generic pattern template suffices. Checked before the generic
//! search.

use fancy_regex::Regex;

use crate::parser::{Atom, Expr, Span};

fn span() -> Span {
    Span::default()
}

fn sym(name: &str) -> Expr {
    Expr::Atom(Atom::Symbol(name.to_string()), span())
}

fn string_lit(s: &str) -> Expr {
    Expr::Atom(Atom::Str(s.to_string()), span())
}

fn call(head: &str, args: Vec<Expr>) -> Expr {
    let mut items = vec![sym(head)];
    items.extend(args);
    Expr::List(items, span())
}

/// Whether every `(input, output)` example matches the `Qn-YYYY -> YYYY-MM`
/// shape with `n`'s declared month.
pub fn matches(examples: &[(String, String)]) -> bool {
    let input_re = Regex::new(r"^Q([1-4])-(\d{4})$").unwrap();
    let output_re = Regex::new(r"^(\d{4})-(0[1-9]|1[0-2])$").unwrap();
    let month_for = |q: &str| match q {
        "1" => "01",
        "2" => "04",
        "3" => "07",
        "4" => "10",
        _ => unreachable!(),
    };

    !examples.is_empty()
        && examples.iter().all(|(input, output)| {
            let Ok(Some(in_caps)) = input_re.captures(input) else {
                return false;
            };
            let Ok(Some(out_caps)) = output_re.captures(output) else {
                return false;
            };
            let quarter = &in_caps[1];
            let year = &in_caps[2];
            year == &out_caps[1] && month_for(quarter) == &out_caps[2]
        })
}

/// Builds the closed-form composition: four chained regex replaces, one per
/// quarter, each a no-op unless its quarter pattern matches (§9 "emits a
/// closed-form mapping").
pub fn build() -> Expr {
    let mut expr = sym("x");
    for (q, month) in [("1", "01"), ("2", "04"), ("3", "07"), ("4", "10")] {
        expr = call(
            "replace",
            vec![
                expr,
                string_lit(&format!(r"Q{q}-(\d{{4}})")),
                string_lit(&format!("${{1}}-{month}")),
            ],
        );
    }
    expr
}
