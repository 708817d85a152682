//! Numeric parsers (§4.D "Numeric parsers").

use chrono::NaiveDate;

use crate::error::EngineError;
use crate::parser::Span;
use crate::value::Value;

pub fn call(name: &str, args: &[Value], span: Span) -> Option<Result<Value, EngineError>> {
    match name {
        "parseInt" => Some(parse_int(args, span)),
        "parseFloat" => Some(parse_float(args, span)),
        "parseCurrency" => Some(parse_currency(args, span)),
        "parseNumber" => Some(parse_number(args, span)),
        "parseDate" => Some(parse_date(args, span)),
        _ => None,
    }
}

fn as_str<'a>(v: &'a Value, position: usize, span: Span) -> Result<&'a str, EngineError> {
    v.promote_to_str()
        .ok_or_else(|| EngineError::type_mismatch(position, "string", v.type_name(), span))
}

/// `(parseInt S)` (§4.D): decimal with optional leading minus; commas
/// stripped; invalid input is `null`, never an error.
fn parse_int(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [s] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    if matches!(s, Value::Null) {
        return Ok(Value::Null);
    }
    let s = as_str(s, 1, span)?;
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    Ok(cleaned
        .parse::<i64>()
        .map(Value::Int)
        .unwrap_or(Value::Null))
}

/// `(parseFloat S)` (§4.D): permissive decimal/scientific notation, commas
/// stripped.
fn parse_float(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [s] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    if matches!(s, Value::Null) {
        return Ok(Value::Null);
    }
    let s = as_str(s, 1, span)?;
    Ok(parse_float_str(s).map(Value::Float).unwrap_or(Value::Null))
}

fn parse_float_str(s: &str) -> Option<f64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// `(parseCurrency S)` (§4.D): strips one leading currency symbol; detects
/// US vs EU thousands/decimal convention by the position of the last `,`
/// versus `.`; `(X)` denotes a negative `X`.
fn parse_currency(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [s] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    if matches!(s, Value::Null) {
        return Ok(Value::Null);
    }
    let raw = as_str(s, 1, span)?.trim();
    Ok(parse_currency_str(raw).map(Value::Float).unwrap_or(Value::Null))
}

fn parse_currency_str(raw: &str) -> Option<f64> {
    let mut negative = false;
    let mut body = raw;
    if let Some(inner) = body.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        negative = true;
        body = inner;
    }
    // Strip a single leading non-digit, non-sign currency symbol (e.g. $, €, £).
    body = body
        .trim_start_matches(|c: char| !c.is_ascii_digit() && c != '-' && c != '.' && c != ',');

    let last_comma = body.rfind(',');
    let last_dot = body.rfind('.');
    let normalized = match (last_comma, last_dot) {
        (Some(c), Some(d)) if c > d => {
            // EU: '.' is thousands, ',' is decimal.
            body.chars()
                .filter(|ch| *ch != '.')
                .map(|ch| if ch == ',' { '.' } else { ch })
                .collect::<String>()
        }
        (Some(_), None) => {
            // Ambiguous single comma group: treat as US thousands separator.
            body.chars().filter(|ch| *ch != ',').collect::<String>()
        }
        _ => {
            // US (or unambiguous): ',' is thousands, '.' is decimal.
            body.chars().filter(|ch| *ch != ',').collect::<String>()
        }
    };

    let value = normalized.parse::<f64>().ok()?;
    Some(if negative { -value } else { value })
}

/// `(parseNumber S)` (§4.D): a trailing `%` divides by 100; otherwise
/// behaves as `parseFloat`.
fn parse_number(args: &[Value], span: Span) -> Result<Value, EngineError> {
    let [s] = args else {
        return Err(EngineError::arity("1", args.len(), span));
    };
    if matches!(s, Value::Null) {
        return Ok(Value::Null);
    }
    let s = as_str(s, 1, span)?;
    Ok(parse_number_str(s).map(Value::Float).unwrap_or(Value::Null))
}

/// Shared with [`crate::eval::primitives::collection::coerce_numeric`] for
/// `sum`'s best-effort numeric coercion.
pub(crate) fn parse_number_str(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if let Some(pct) = trimmed.strip_suffix('%') {
        return parse_float_str(pct).map(|v| v / 100.0);
    }
    parse_float_str(trimmed)
}

/// `(parseDate S FMT?)` (§4.D): recognizes ISO, US/EU slash dates, long
/// month names, and two-digit `D-Mon-YY` years (<50 -> 20YY, else 19YY).
/// Output is always `YYYY-MM-DD`; unrecognized input is `null`.
fn parse_date(args: &[Value], span: Span) -> Result<Value, EngineError> {
    if args.is_empty() || args.len() > 2 {
        return Err(EngineError::arity("1 or 2", args.len(), span));
    }
    if matches!(args[0], Value::Null) {
        return Ok(Value::Null);
    }
    let s = as_str(&args[0], 1, span)?.trim();
    let fmt = match args.get(1) {
        Some(v) if matches!(v, Value::Null) => None,
        Some(v) => Some(as_str(v, 2, span)?),
        None => None,
    };
    Ok(parse_date_str(s, fmt)
        .map(|d| Value::Str(d.format("%Y-%m-%d").to_string()))
        .unwrap_or(Value::Null))
}

fn parse_date_str(s: &str, fmt: Option<&str>) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    match fmt {
        Some("US") => {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
                return Some(d);
            }
        }
        Some("EU") => {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
                return Some(d);
            }
        }
        _ => {}
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%B %d, %Y") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%d %B %Y") {
        return Some(d);
    }
    parse_d_mon_yy(s)
}

/// `"D-Mon-YY"`: two-digit year, <50 -> 20YY, else 19YY (§4.D).
fn parse_d_mon_yy(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('-').collect();
    let [day, mon, yy] = parts.as_slice() else {
        return None;
    };
    let day: u32 = day.parse().ok()?;
    let yy: i32 = yy.parse().ok()?;
    if yy > 99 {
        return None;
    }
    let year = if yy < 50 { 2000 + yy } else { 1900 + yy };
    let month = month_from_abbrev(mon)?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_from_abbrev(s: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = s.to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower)
        .map(|i| (i + 1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1,234", Value::Int(1234))]
    #[case("-7", Value::Int(-7))]
    #[case("not a number", Value::Null)]
    fn parse_int_cases(#[case] input: &str, #[case] expected: Value) {
        let args = [Value::Str(input.to_string())];
        assert_eq!(parse_int(&args, Span::default()).unwrap(), expected);
    }

    #[test]
    fn parse_currency_eu_parenthesized_negative() {
        let args = [Value::Str("($1.234,56)".to_string())];
        let v = parse_currency(&args, Span::default()).unwrap();
        assert_eq!(v, Value::Float(-1234.56));
    }

    #[test]
    fn parse_number_percent_divides_by_100() {
        let args = [Value::Str("42%".to_string())];
        assert_eq!(parse_number(&args, Span::default()).unwrap(), Value::Float(0.42));
    }

    #[rstest]
    #[case("29-Feb-24", Some("2024-02-29"))]
    #[case("30-Feb-24", None)]
    fn parse_date_leap_year_boundary(#[case] input: &str, #[case] expected: Option<&str>) {
        let args = [Value::Str(input.to_string())];
        let v = parse_date(&args, Span::default()).unwrap();
        match expected {
            Some(d) => assert_eq!(v, Value::Str(d.to_string())),
            None => assert_eq!(v, Value::Null),
        }
    }

    #[test]
    fn parse_date_iso_passthrough() {
        let args = [Value::Str("2024-01-05".to_string())];
        assert_eq!(
            parse_date(&args, Span::default()).unwrap(),
            Value::Str("2024-01-05".to_string())
        );
    }
}
