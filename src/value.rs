use serde_json::{Number, Value};

/// Coerces a JSON cell to a finite number.
///
/// Numbers pass through; strings are trimmed and parsed as decimal floats
/// (sign, fraction and exponent allowed) or `0x`/`0o`/`0b` prefixed integers.
/// Blank strings, null, booleans, arrays, objects and anything that would be
/// non-finite yield `None`, so callers can tell "could not compute" from zero.
pub fn to_finite_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_number_like(s)?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn parse_number_like(text: &str) -> Option<f64> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }

    let radix = match t.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&t[2..], radix).ok().map(|v| v as f64);
    }

    // Letters other than an exponent marker: covers "inf"/"nan" spellings f64 parsing accepts.
    if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    t.parse::<f64>().ok()
}

/// Multiplies two cells when both coerce to finite numbers.
pub fn product(a: &Value, b: &Value) -> Option<f64> {
    Some(to_finite_number(a)? * to_finite_number(b)?)
}

/// Renders a number the way JavaScript's `String(number)` does for the values
/// that occur in order data: integers without a fraction, everything else in
/// shortest round-trip form.
pub fn format_number(v: f64) -> String {
    if !v.is_finite() {
        return if v.is_nan() {
            "NaN".to_string()
        } else if v.is_sign_negative() {
            "-Infinity".to_string()
        } else {
            "Infinity".to_string()
        };
    }
    if v == 0.0 {
        // Covers -0 as well.
        return "0".to_string();
    }
    if v.fract() == 0.0 && v.abs() < 1e21 {
        return format!("{v:.0}");
    }

    let mut buf = ryu::Buffer::new();
    let s = buf.format_finite(v);
    match s.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => s.to_string(),
    }
}

/// Display string for a table cell.
pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => format_number(f),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// A computed amount as a JSON cell: a number, or `""` when nothing could be computed.
pub fn amount_cell(amount: Option<f64>) -> Value {
    let Some(v) = amount.filter(|v| v.is_finite()) else {
        return Value::String(String::new());
    };
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        return Value::from(v as i64);
    }
    Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(String::new()))
}

/// JavaScript truthiness of a JSON value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// JavaScript `===` for JSON scalars. Numbers compare by value regardless of
/// integer/float representation; containers are never equal (distinct references).
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        (Value::String(x), Value::String(y)) => x == y,
        _ => false,
    }
}

/// Strips a single leading and a single trailing quote (`'` or `"`).
pub fn strip_one_quote(s: &str) -> &str {
    let s = s.strip_prefix(['\'', '"']).unwrap_or(s);
    s.strip_suffix(['\'', '"']).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_finite_number_accepts_numbers_and_numeric_strings() {
        assert_eq!(to_finite_number(&json!(3)), Some(3.0));
        assert_eq!(to_finite_number(&json!(2.5)), Some(2.5));
        assert_eq!(to_finite_number(&json!(" 12 ")), Some(12.0));
        assert_eq!(to_finite_number(&json!("-1.5e2")), Some(-150.0));
        assert_eq!(to_finite_number(&json!(".5")), Some(0.5));
        assert_eq!(to_finite_number(&json!("0x1F")), Some(31.0));
        assert_eq!(to_finite_number(&json!("0b101")), Some(5.0));
    }

    #[test]
    fn to_finite_number_rejects_everything_else() {
        assert_eq!(to_finite_number(&json!("abc")), None);
        assert_eq!(to_finite_number(&json!("")), None);
        assert_eq!(to_finite_number(&json!("   ")), None);
        assert_eq!(to_finite_number(&json!("Infinity")), None);
        assert_eq!(to_finite_number(&json!("inf")), None);
        assert_eq!(to_finite_number(&json!("NaN")), None);
        assert_eq!(to_finite_number(&json!("1,000")), None);
        assert_eq!(to_finite_number(&json!(null)), None);
        assert_eq!(to_finite_number(&json!(true)), None);
        assert_eq!(to_finite_number(&json!([1])), None);
        assert_eq!(to_finite_number(&json!({"a": 1})), None);
    }

    #[test]
    fn product_is_none_when_either_side_is_not_numeric() {
        assert_eq!(product(&json!("abc"), &json!(5)), None);
        assert_eq!(product(&json!("4"), &json!(5)), Some(20.0));
        assert_eq!(product(&json!(0), &json!(5)), Some(0.0));
    }

    #[test]
    fn format_number_matches_javascript_rendering() {
        assert_eq!(format_number(80.0), "80");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1e-7), "1e-7");
    }

    #[test]
    fn format_cell_renders_scalars_and_containers() {
        assert_eq!(format_cell(&json!(null)), "");
        assert_eq!(format_cell(&json!("x")), "x");
        assert_eq!(format_cell(&json!(100)), "100");
        assert_eq!(format_cell(&json!(2.25)), "2.25");
        assert_eq!(format_cell(&json!(false)), "false");
        assert_eq!(format_cell(&json!([1, "a"])), r#"[1,"a"]"#);
    }

    #[test]
    fn amount_cell_keeps_integers_integral() {
        assert_eq!(amount_cell(Some(80.0)), json!(80));
        assert_eq!(amount_cell(Some(2.5)), json!(2.5));
        assert_eq!(amount_cell(None), json!(""));
        assert_eq!(amount_cell(Some(f64::NAN)), json!(""));
    }

    #[test]
    fn truthiness_and_strict_equality() {
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(null)));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!(7)));

        assert!(strict_equals(&json!(1), &json!(1.0)));
        assert!(!strict_equals(&json!(1), &json!("1")));
        assert!(strict_equals(&json!("A1"), &json!("A1")));
        assert!(!strict_equals(&json!({}), &json!({})));
    }

    #[test]
    fn strip_one_quote_removes_only_one_layer() {
        assert_eq!(strip_one_quote("\"a\""), "a");
        assert_eq!(strip_one_quote("'a"), "a");
        assert_eq!(strip_one_quote("\"\"a\"\""), "\"a\"");
        assert_eq!(strip_one_quote("a"), "a");
    }
}
