use serde_json::Value;

use crate::constants::{DEFAULT_VALUE, VALUE_FIELD};
use crate::error::ProtocolError;

/// A reading decoded from a sensor payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f64,
    /// `true` when the `value` field was missing or unusable and
    /// [`DEFAULT_VALUE`] was substituted.
    pub defaulted: bool,
}

/// Decodes the `value` field of a JSON object payload.
///
/// The payload itself must be a UTF-8 JSON object; anything else is an error.
/// Inside the object the policy is lenient: a missing, null, or non-numeric
/// `value` is recorded as `0.0`. Numbers are taken as-is and strings holding a
/// float (`"21.5"`, `"nan"`, `"inf"`) are parsed, so NaN and infinities pass
/// through unfiltered. Bare `NaN`, `Infinity` and numbers too large for an
/// f64 (`1e400`) are not strict JSON but are accepted the same way.
pub fn decode_reading(payload: &[u8]) -> Result<Reading, ProtocolError> {
    let text = std::str::from_utf8(payload)?;
    let Value::Object(fields) = parse_lenient(text)? else {
        return Err(ProtocolError::NotAnObject);
    };

    let parsed = fields.get(VALUE_FIELD).and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    });

    Ok(match parsed {
        Some(value) => Reading {
            value,
            defaulted: false,
        },
        None => Reading {
            value: DEFAULT_VALUE,
            defaulted: true,
        },
    })
}

/// Parses strict JSON, falling back to a copy with non-finite number tokens
/// quoted. The original error is returned if the fallback fails too.
fn parse_lenient(text: &str) -> Result<Value, serde_json::Error> {
    let err = match serde_json::from_str(text) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    match quote_non_finite(text) {
        Some(relaxed) => serde_json::from_str(&relaxed).map_err(|_| err),
        None => Err(err),
    }
}

/// Wraps every bare token outside string literals that reads as a non-finite
/// float in quotes. Returns `None` if there was nothing to rewrite.
fn quote_non_finite(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len() + 8);
    let mut token = String::new();
    let mut changed = false;
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.') {
            token.push(c);
            continue;
        }
        changed |= flush_token(&mut out, &mut token);
        in_string = c == '"';
        out.push(c);
    }
    changed |= flush_token(&mut out, &mut token);

    changed.then_some(out)
}

fn flush_token(out: &mut String, token: &mut String) -> bool {
    let non_finite = token.parse::<f64>().is_ok_and(|v| !v.is_finite());
    if non_finite {
        out.push('"');
        out.push_str(token);
        out.push('"');
    } else {
        out.push_str(token);
    }
    token.clear();
    non_finite
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_value() {
        let r = decode_reading(br#"{"value": 21.5}"#).unwrap();
        assert_eq!(r.value, 21.5);
        assert!(!r.defaulted);

        let r = decode_reading(br#"{"value": 40, "unit": "%"}"#).unwrap();
        assert_eq!(r.value, 40.0);
    }

    #[test]
    fn numeric_string_value() {
        let r = decode_reading(br#"{"value": " 22.25 "}"#).unwrap();
        assert_eq!(r.value, 22.25);
        assert!(!r.defaulted);
    }

    #[test]
    fn non_finite_strings_pass_through() {
        assert!(decode_reading(br#"{"value": "nan"}"#).unwrap().value.is_nan());
        assert_eq!(
            decode_reading(br#"{"value": "-inf"}"#).unwrap().value,
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn bare_non_finite_literals_pass_through() {
        let r = decode_reading(br#"{"value": NaN}"#).unwrap();
        assert!(r.value.is_nan());
        assert!(!r.defaulted);

        let r = decode_reading(br#"{"value": Infinity, "unit": "C"}"#).unwrap();
        assert_eq!(r.value, f64::INFINITY);

        let r = decode_reading(br#"{"value": -Infinity}"#).unwrap();
        assert_eq!(r.value, f64::NEG_INFINITY);
    }

    #[test]
    fn overflowing_number_is_infinite() {
        let r = decode_reading(br#"{"value": 1e400}"#).unwrap();
        assert_eq!(r.value, f64::INFINITY);
        assert!(!r.defaulted);

        assert_eq!(
            decode_reading(br#"{"value": -1e400}"#).unwrap().value,
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn non_finite_tokens_inside_strings_are_untouched() {
        let r = decode_reading(br#"{"note": "NaN 1e400 \" Infinity", "value": 2.5}"#).unwrap();
        assert_eq!(r.value, 2.5);
        assert_eq!(quote_non_finite(r#"{"a": "x\"NaN"}"#), None);
    }

    #[test]
    fn lenient_fallback_keeps_original_error() {
        assert!(matches!(
            decode_reading(br#"{"value": NaN"#),
            Err(ProtocolError::Json(_))
        ));
    }

    // Missing or malformed values are recorded as a real 0.0 reading, not
    // rejected. Changing this policy must update these assertions.
    #[test]
    fn missing_value_defaults_to_zero() {
        let r = decode_reading(b"{}").unwrap();
        assert_eq!(r.value, 0.0);
        assert!(r.defaulted);
    }

    #[test]
    fn malformed_value_defaults_to_zero() {
        let payloads: [&[u8]; 5] = [
            br#"{"value": null}"#,
            br#"{"value": "warm"}"#,
            br#"{"value": [1, 2]}"#,
            br#"{"value": {"c": 1}}"#,
            br#"{"value": true}"#,
        ];
        for payload in payloads {
            let r = decode_reading(payload).unwrap();
            assert_eq!(r.value, 0.0, "payload {:?}", String::from_utf8_lossy(payload));
            assert!(r.defaulted);
        }
    }

    #[test]
    fn invalid_json_rejected() {
        assert!(matches!(
            decode_reading(b"{value: 1"),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(decode_reading(b""), Err(ProtocolError::Json(_))));
    }

    #[test]
    fn non_object_rejected() {
        assert!(matches!(
            decode_reading(b"21.5"),
            Err(ProtocolError::NotAnObject)
        ));
        assert!(matches!(
            decode_reading(b"[1]"),
            Err(ProtocolError::NotAnObject)
        ));
    }

    #[test]
    fn invalid_utf8_rejected() {
        assert!(matches!(
            decode_reading(&[0xff, 0xfe, b'{', b'}']),
            Err(ProtocolError::NotUtf8(_))
        ));
    }
}
