//! Tolerant type coercion for configuration values.
//!
//! Configuration documents are often written by hand, so integers may arrive
//! as strings and booleans as `"yes"`/`"off"`/`1`. These helpers are used as
//! serde `deserialize_with` functions on the config schema. A JSON `null`
//! counts as an absent integer, but is rejected as a boolean.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const TRUE_WORDS: [&str; 5] = ["1", "true", "yes", "y", "on"];
const FALSE_WORDS: [&str; 5] = ["0", "false", "no", "n", "off"];

/// Interprets a JSON value as a boolean.
///
/// Booleans pass through, numbers are true when non-zero, and strings are
/// matched case-insensitively (after trimming) against the usual yes/no
/// spellings. Anything else is rejected with a message naming the value.
pub fn coerce_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => {
            let word = s.trim().to_lowercase();
            if TRUE_WORDS.contains(&word.as_str()) {
                Ok(true)
            } else if FALSE_WORDS.contains(&word.as_str()) {
                Ok(false)
            } else {
                Err(format!("Cannot interpret {value} as a boolean"))
            }
        }
        other => Err(format!("Cannot interpret {other} as a boolean")),
    }
}

/// Interprets a JSON value as an integer.
///
/// Accepts integers, floats without a fractional part, and strings holding a
/// decimal integer.
pub fn coerce_int(value: &Value) -> Result<i64, String> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| format!("Cannot interpret {value} as an integer"))
}

/// Only called when the field is present, so an explicit `null` reaches
/// [`coerce_bool`] and is reported like any other unreadable value.
pub fn optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    coerce_bool(&value).map(Some).map_err(D::Error::custom)
}

pub fn optional_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer)?
        .filter(|v| !v.is_null())
        .map(|v| coerce_int(&v))
        .transpose()
        .map_err(D::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bool_words() {
        for word in ["1", "true", "YES", " y ", "On"] {
            assert_eq!(coerce_bool(&json!(word)), Ok(true), "{word}");
        }
        for word in ["0", "False", "no", "N", " off"] {
            assert_eq!(coerce_bool(&json!(word)), Ok(false), "{word}");
        }
    }

    #[test]
    fn test_bool_passthrough_and_numbers() {
        assert_eq!(coerce_bool(&json!(true)), Ok(true));
        assert_eq!(coerce_bool(&json!(false)), Ok(false));
        assert_eq!(coerce_bool(&json!(0)), Ok(false));
        assert_eq!(coerce_bool(&json!(2)), Ok(true));
        assert_eq!(coerce_bool(&json!(0.5)), Ok(true));
    }

    #[test]
    fn test_bool_rejects_unknown_values() {
        let err = coerce_bool(&json!("maybe")).unwrap_err();
        assert!(err.contains("maybe"));
        assert!(coerce_bool(&json!([true])).is_err());
        assert!(coerce_bool(&json!({})).is_err());
        assert_eq!(
            coerce_bool(&Value::Null),
            Err("Cannot interpret null as a boolean".to_string())
        );
    }

    #[derive(Debug, Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "optional_bool")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "optional_int")]
        count: Option<i64>,
    }

    #[test]
    fn test_null_and_absent_fields() {
        let absent: Fields = serde_json::from_value(json!({})).unwrap();
        assert_eq!((absent.flag, absent.count), (None, None));

        let null_count: Fields = serde_json::from_value(json!({ "count": null })).unwrap();
        assert_eq!(null_count.count, None);

        let err = serde_json::from_value::<Fields>(json!({ "flag": null })).unwrap_err();
        assert!(err.to_string().contains("Cannot interpret null as a boolean"));
    }

    #[test]
    fn test_int_coercion() {
        assert_eq!(coerce_int(&json!(2048)), Ok(2048));
        assert_eq!(coerce_int(&json!("4096")), Ok(4096));
        assert_eq!(coerce_int(&json!(" 30 ")), Ok(30));
        assert_eq!(coerce_int(&json!(365.0)), Ok(365));
        assert!(coerce_int(&json!(1.5)).is_err());
        assert!(coerce_int(&json!("lots")).is_err());
        assert!(coerce_int(&json!(true)).is_err());
    }
}
