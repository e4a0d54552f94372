//! Attribute casting
//!
//! `cast` is a pure function from a raw attribute value to a typed JSON
//! value. Records apply it on read; join keys and pivot values are never cast.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

use crate::error::{ModelError, ModelResult};

/// Target type for an attribute cast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
    Integer,
    Float,
    Boolean,
    String,
    Json,
    DateTime,
    Date,
}

/// Cast `raw` (the value stored under `key`) to `spec`. Null stays null.
pub fn cast(key: &str, raw: &JsonValue, spec: &CastType) -> ModelResult<JsonValue> {
    if raw.is_null() {
        return Ok(JsonValue::Null);
    }

    let failed = |expected: &str| {
        ModelError::Cast(format!("cannot cast attribute '{}' value {} to {}", key, raw, expected))
    };

    match spec {
        CastType::Integer => match raw {
            JsonValue::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .map(JsonValue::from)
                .ok_or_else(|| failed("integer")),
            JsonValue::String(s) => s
                .trim()
                .parse::<i64>()
                .map(JsonValue::from)
                .map_err(|_| failed("integer")),
            JsonValue::Bool(b) => Ok(JsonValue::from(*b as i64)),
            _ => Err(failed("integer")),
        },
        CastType::Float => match raw {
            JsonValue::Number(n) => n.as_f64().map(JsonValue::from).ok_or_else(|| failed("float")),
            JsonValue::String(s) => s
                .trim()
                .parse::<f64>()
                .map(JsonValue::from)
                .map_err(|_| failed("float")),
            _ => Err(failed("float")),
        },
        CastType::Boolean => match raw {
            JsonValue::Bool(b) => Ok(JsonValue::Bool(*b)),
            JsonValue::Number(n) => Ok(JsonValue::Bool(n.as_f64().map(|f| f != 0.0).unwrap_or(false))),
            JsonValue::String(s) => match s.trim().to_lowercase().as_str() {
                "1" | "true" | "t" | "yes" => Ok(JsonValue::Bool(true)),
                "0" | "false" | "f" | "no" | "" => Ok(JsonValue::Bool(false)),
                _ => Err(failed("boolean")),
            },
            _ => Err(failed("boolean")),
        },
        CastType::String => match raw {
            JsonValue::String(s) => Ok(JsonValue::String(s.clone())),
            other => Ok(JsonValue::String(other.to_string())),
        },
        CastType::Json => match raw {
            JsonValue::String(s) => serde_json::from_str(s).map_err(|_| failed("json")),
            other => Ok(other.clone()),
        },
        CastType::DateTime => {
            let text = raw.as_str().ok_or_else(|| failed("datetime"))?;
            parse_datetime(text)
                .map(|dt| JsonValue::String(dt.to_rfc3339()))
                .ok_or_else(|| failed("datetime"))
        }
        CastType::Date => {
            let text = raw.as_str().ok_or_else(|| failed("date"))?;
            let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .or_else(|| parse_datetime(text).map(|dt| dt.date_naive()))
                .ok_or_else(|| failed("date"))?;
            Ok(JsonValue::String(date.format("%Y-%m-%d").to_string()))
        }
    }
}

fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_casts() {
        assert_eq!(cast("votes", &json!("42"), &CastType::Integer).unwrap(), json!(42));
        assert_eq!(cast("ratio", &json!("0.5"), &CastType::Float).unwrap(), json!(0.5));
        assert_eq!(cast("active", &json!(1), &CastType::Boolean).unwrap(), json!(true));
        assert_eq!(cast("active", &json!("f"), &CastType::Boolean).unwrap(), json!(false));
        assert_eq!(cast("code", &json!(7), &CastType::String).unwrap(), json!("7"));
    }

    #[test]
    fn test_null_stays_null() {
        assert_eq!(cast("votes", &JsonValue::Null, &CastType::Integer).unwrap(), JsonValue::Null);
    }

    #[test]
    fn test_json_and_dates() {
        let meta = cast("meta", &json!("{\"a\": [1, 2]}"), &CastType::Json).unwrap();
        assert_eq!(meta["a"][1], json!(2));

        let at = cast("created_at", &json!("2024-03-01 10:30:00"), &CastType::DateTime).unwrap();
        assert_eq!(at, json!("2024-03-01T10:30:00+00:00"));

        let day = cast("born_on", &json!("2024-03-01T23:00:00+00:00"), &CastType::Date).unwrap();
        assert_eq!(day, json!("2024-03-01"));
    }

    #[test]
    fn test_cast_failure() {
        let err = cast("votes", &json!("many"), &CastType::Integer).unwrap_err();
        assert!(matches!(err, ModelError::Cast(_)));
    }
}
