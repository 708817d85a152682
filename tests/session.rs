//! End-to-end scenarios (§8 "Seed end-to-end scenarios"), driving the public
//! `Session` API directly, the way the teacher's `tests/cli.rs` drives the
//! compiled binary end-to-end instead of unit-testing internals.

use std::time::Duration;

use nucleus::preview::ValuePreview;
use nucleus::{Config, Session};
use pretty_assertions::assert_eq;

const SALES_DOC: &str = "\
Q1 report
SALES_NORTH: $2,340,000
notes: pending review
SALES_SOUTH: $3,120,000
SALES_EAST: $2,890,000
footer
SALES_WEST: $2,670,000
SALES_CENTRAL: $1,980,000
end of report";

fn value_of(session: &mut Session, source: &str) -> ValuePreview {
    let response = session.execute(source, None);
    assert!(response.ok, "expected success, got error: {:?}", response.error);
    response.value.unwrap()
}

#[test]
fn s1_basic_grep_and_count() {
    let mut session = Session::default();
    session.load(
        "line one\nERROR a\nline three\nERROR b\nline five\nERROR c\nline seven\nERROR d\nline nine\nERROR e",
        None,
    );

    let grep_response = session.execute(r#"(grep "ERROR")"#, None);
    assert!(grep_response.ok);
    match grep_response.value.unwrap() {
        ValuePreview::List { len, .. } => assert_eq!(len, 5),
        other => panic!("unexpected: {other:?}"),
    }

    assert_eq!(value_of(&mut session, "(count RESULTS)"), ValuePreview::Int { value: 5 });
}

#[test]
fn s2_extraction_pipeline() {
    let mut session = Session::default();
    session.load(SALES_DOC, None);

    let grep_response = session.execute(r#"(grep "SALES_")"#, None);
    assert!(grep_response.ok);
    match grep_response.value.unwrap() {
        ValuePreview::List { len, .. } => assert_eq!(len, 5),
        other => panic!("unexpected: {other:?}"),
    }

    let mapped = value_of(
        &mut session,
        r#"(map RESULTS (lambda x (parseCurrency (match x "\\$([\\d,]+)" 1))))"#,
    );
    match mapped {
        ValuePreview::List { items, len, .. } => {
            assert_eq!(len, 5);
            let values: Vec<f64> = items
                .into_iter()
                .map(|v| match v {
                    ValuePreview::Float { value } => value,
                    other => panic!("unexpected element: {other:?}"),
                })
                .collect();
            assert_eq!(
                values,
                vec![2_340_000.0, 3_120_000.0, 2_890_000.0, 2_670_000.0, 1_980_000.0]
            );
        }
        other => panic!("unexpected: {other:?}"),
    }

    // `parseCurrency` always yields a Float (§4.D), so `sum` over its
    // results stays a Float too (§4.D `sum` contract: `Int` only when every
    // coerced element is non-`Float`).
    assert_eq!(
        value_of(&mut session, "(sum RESULTS)"),
        ValuePreview::Float { value: 13_000_000.0 }
    );
}

#[test]
fn s3_history_rotation_over_four_turns() {
    let mut session = Session::default();
    session.load("x", None);

    for _ in 0..4 {
        assert_eq!(
            value_of(&mut session, "(sum (list 1 2))"),
            ValuePreview::Int { value: 3 }
        );
    }

    let bindings = session.bindings();
    assert_eq!(bindings.get("_1"), Some(&ValuePreview::Int { value: 3 }));
    assert_eq!(bindings.get("_2"), Some(&ValuePreview::Int { value: 3 }));
    assert_eq!(bindings.get("_3"), Some(&ValuePreview::Int { value: 3 }));
    assert_eq!(bindings.get("_4"), Some(&ValuePreview::Int { value: 3 }));
    assert_eq!(bindings.get("RESULTS"), Some(&ValuePreview::Int { value: 3 }));
    assert_eq!(bindings.get("TURN"), Some(&ValuePreview::Int { value: 4 }));
}

#[test]
fn s4_synthesis_success() {
    let mut session = Session::default();
    session.load("x", None);

    let examples = r#"(list
         (record "input" "$1,000" "output" 1000)
         (record "input" "$2,500" "output" 2500)
         (record "input" "$10,000" "output" 10000))"#;

    let response = session.execute(&format!("(synthesize-extractor {examples})"), None);
    assert!(response.ok, "synthesis unexpectedly failed: {:?}", response.error);
    match response.value.unwrap() {
        ValuePreview::Lambda { .. } => {}
        other => panic!("expected a lambda, got {other:?}"),
    }

    session.execute(&format!("(let extract (synthesize-extractor {examples}))"), None);
    assert_eq!(
        value_of(&mut session, r#"(extract "$5,000")"#),
        ValuePreview::Int { value: 5000 }
    );
}

#[test]
fn s5_synthesis_failure_surfaces_no_candidate() {
    let mut session = Session::default();
    session.load("x", None);

    let response = session.execute(
        r#"(synthesize-extractor (list
             (record "input" "$1,000" "output" 1000)
             (record "input" "$1,000" "output" 2000)))"#,
        None,
    );
    assert!(!response.ok);
    assert_eq!(response.error.unwrap().kind, "NoCandidate");
    assert!(!session.is_poisoned());

    let response = session.execute(r#"(synthesize-extractor (list 1))"#, None);
    assert!(!response.ok);
    assert_eq!(response.error.unwrap().kind, "NeedsMoreExamples");
}

#[test]
fn s6_turn_monotonicity_on_error() {
    let mut session = Session::default();
    session.reset();

    let response = session.execute("(bogus", None);
    assert!(!response.ok);
    assert_eq!(response.turn, 1);
    assert_eq!(response.error.unwrap().kind, "ParseError");

    session.load("x\ny", None);
    let response = session.execute(r#"(count (grep "x"))"#, None);
    assert!(response.ok);
    assert_eq!(response.turn, 2);
}

#[test]
fn execute_before_load_yields_no_document() {
    let mut session = Session::default();
    let response = session.execute(r#"(grep "x")"#, None);
    assert!(!response.ok);
    assert_eq!(response.error.unwrap().kind, "NoDocument");
}

#[test]
fn reset_then_pure_expression_matches_a_fresh_session() {
    let mut fresh = Session::default();
    fresh.load("alpha\nbeta\ngamma", None);
    let fresh_value = value_of(&mut fresh, r#"(count (grep "a"))"#);

    let mut reused = Session::default();
    reused.load("alpha\nbeta\ngamma", None);
    reused.execute("(let scratch 1)", None);
    reused.reset();
    let reused_value = value_of(&mut reused, r#"(count (grep "a"))"#);

    assert_eq!(fresh_value, reused_value);
}

#[test]
fn line_out_of_range_boundaries() {
    let mut session = Session::default();
    session.load("a\nb\nc", None);

    // `lines/2` clamps rather than faulting, except when both endpoints land
    // out of range on the same side, which yields an empty list (§4.A).
    assert_eq!(
        value_of(&mut session, "(lines 0 0)"),
        ValuePreview::List {
            items: vec![ValuePreview::Str { value: "a".to_string(), truncated: false }],
            len: 1,
            truncated: false,
        }
    );
    assert_eq!(
        value_of(&mut session, "(lines 4 4)"),
        ValuePreview::List { items: vec![], len: 0, truncated: false }
    );
    assert_eq!(
        value_of(&mut session, "(lines -4 -4)"),
        ValuePreview::List { items: vec![], len: 0, truncated: false }
    );
    assert_eq!(
        value_of(&mut session, "(lines 10 20)"),
        ValuePreview::List { items: vec![], len: 0, truncated: false }
    );

    // the single-arg `lines/1` form is the one that reports `LineOutOfRange`.
    let response = session.execute("(lines 0)", None);
    assert_eq!(response.error.unwrap().kind, "LineOutOfRange");
    let response = session.execute("(lines 4)", None);
    assert_eq!(response.error.unwrap().kind, "LineOutOfRange");
}

#[test]
fn grep_empty_pattern_terminates_with_one_hit_per_boundary() {
    let mut session = Session::default();
    session.load("ab", None);
    assert_eq!(
        value_of(&mut session, r#"(count (grep ""))"#),
        ValuePreview::Int { value: 3 }
    );
}

#[test]
fn currency_and_date_boundary_cases() {
    let mut session = Session::default();
    session.load("x", None);

    assert_eq!(
        value_of(&mut session, r#"(parseCurrency "($1.234,56)")"#),
        ValuePreview::Float { value: -1234.56 }
    );
    assert_eq!(
        value_of(&mut session, r#"(parseDate "29-Feb-24")"#),
        ValuePreview::Str {
            value: "2024-02-29".to_string(),
            truncated: false
        }
    );
    assert_eq!(value_of(&mut session, r#"(parseDate "30-Feb-24")"#), ValuePreview::Null);
}

#[test]
fn evaluator_purity_on_pure_repeated_expression() {
    let mut session = Session::default();
    session.load("x", None);
    let a = value_of(&mut session, r#"(upper "abc")"#);
    let b = value_of(&mut session, r#"(upper "abc")"#);
    assert_eq!(a, b);
}

#[test]
fn timeout_exceeded_reports_timeout_error_without_poisoning() {
    let mut session = Session::default();
    session.load("x", None);
    let response = session.execute("(count (list 1 2 3))", Some(Duration::from_nanos(1)));
    assert!(!response.ok);
    assert_eq!(response.error.unwrap().kind, "TimeoutError");
    assert!(!session.is_poisoned());
}

#[test]
fn config_history_depth_is_respected() {
    let mut config = Config::default();
    config.history_depth = 2;
    let mut session = Session::new(config);
    session.load("x", None);

    session.execute("(sum (list 1))", None);
    session.execute("(sum (list 2))", None);
    session.execute("(sum (list 3))", None);

    let bindings = session.bindings();
    assert_eq!(bindings.get("_1"), Some(&ValuePreview::Int { value: 3 }));
    assert_eq!(bindings.get("_2"), Some(&ValuePreview::Int { value: 2 }));
    assert_eq!(bindings.get("_3"), None);
}
