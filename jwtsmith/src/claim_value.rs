//! Typed values for free-form claims given as text
//!
//! A claim written on a command line as `admin=true` should land in the
//! payload as a JSON boolean, not the string `"true"`. The inference here is
//! total: anything that is not recognizably typed stays a string.

use serde_json::{Number, Value};

use crate::error;

/// Infers the JSON type of a raw claim value
///
/// Tried in order: the literals `true` and `false`, a 64-bit signed integer,
/// a finite floating-point number, a JSON array or object. Anything else is
/// kept as the raw string.
///
/// ```
/// use jwtsmith::claim_value::parse_claim_value;
/// use serde_json::json;
///
/// assert_eq!(parse_claim_value("42"), json!(42));
/// assert_eq!(parse_claim_value("true"), json!(true));
/// assert_eq!(parse_claim_value("[1,2]"), json!([1, 2]));
/// assert_eq!(parse_claim_value("hello"), json!("hello"));
/// ```
#[must_use]
pub fn parse_claim_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(i) = raw.parse::<i64>() {
        return Value::Number(i.into());
    }

    if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }

    if raw.starts_with('[') || raw.starts_with('{') {
        if let Ok(v @ (Value::Array(_) | Value::Object(_))) = serde_json::from_str(raw) {
            return v;
        }
    }

    Value::String(raw.to_owned())
}

/// Splits a `key=value` claim on the first `=` and infers the value's type
///
/// # Errors
///
/// The input has no `=`, or the key is empty.
pub fn parse_claim_pair(pair: &str) -> Result<(String, Value), error::InvalidFormat> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), parse_claim_value(value))),
        _ => Err(error::InvalidFormat::ClaimPair(pair.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use serde_json::json;

    use super::*;

    #[test]
    fn booleans_are_exact_literals() {
        assert_eq!(parse_claim_value("true"), json!(true));
        assert_eq!(parse_claim_value("false"), json!(false));
        assert_eq!(parse_claim_value("True"), json!("True"));
        assert_eq!(parse_claim_value("FALSE"), json!("FALSE"));
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_claim_value("42"), json!(42));
        assert_eq!(parse_claim_value("-7"), json!(-7));
        assert_eq!(parse_claim_value("1.5"), json!(1.5));
        assert_eq!(parse_claim_value("1e3"), json!(1000.0));
        assert!(parse_claim_value("42").is_i64());
    }

    #[test]
    fn integers_beyond_i64_become_floats() {
        let v = parse_claim_value("18446744073709551616");
        assert!(v.is_f64());
    }

    #[test]
    fn non_finite_floats_stay_strings() {
        for raw in ["NaN", "inf", "-inf", "infinity"] {
            assert_eq!(parse_claim_value(raw), json!(raw));
        }
    }

    #[test]
    fn structured_values() {
        assert_eq!(parse_claim_value("[1,2]"), json!([1, 2]));
        assert_eq!(
            parse_claim_value(r#"{"role":"admin","level":3}"#),
            json!({"role": "admin", "level": 3})
        );
    }

    #[test]
    fn everything_else_is_a_string() {
        assert_eq!(parse_claim_value("hello"), json!("hello"));
        assert_eq!(parse_claim_value(""), json!(""));
        assert_eq!(parse_claim_value("[1,"), json!("[1,"));
        assert_eq!(parse_claim_value("null"), json!("null"));
        assert_eq!(parse_claim_value("\"quoted\""), json!("\"quoted\""));
    }

    #[test]
    fn pairs_split_on_the_first_equals() -> Result<()> {
        assert_eq!(parse_claim_pair("role=admin")?, ("role".into(), json!("admin")));
        assert_eq!(parse_claim_pair("expr=a=b")?, ("expr".into(), json!("a=b")));
        assert_eq!(parse_claim_pair("n=5")?, ("n".into(), json!(5)));
        assert_eq!(parse_claim_pair("empty=")?, ("empty".into(), json!("")));
        Ok(())
    }

    #[test]
    fn malformed_pairs() {
        for pair in ["role", "=admin", ""] {
            let err = parse_claim_pair(pair).unwrap_err();
            assert!(matches!(err, error::InvalidFormat::ClaimPair(ref p) if p == pair));
        }
    }
}
