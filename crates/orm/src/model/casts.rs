//! Declarative attribute casts

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Target type of an attribute cast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cast {
    Int,
    Float,
    String,
    Bool,
    /// JSON array (or object) decoded from text
    Array,
    /// JSON object decoded from text
    Object,
    Date,
    DateTime,
}

impl Cast {
    /// Coerce `value`. Null stays null for every cast.
    pub fn apply(&self, value: &Value) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        match self {
            Cast::Int => Value::from(to_int(value)),
            Cast::Float => Number::from_f64(to_float(value))
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cast::String => Value::String(to_text(value)),
            Cast::Bool => Value::Bool(is_truthy(value)),
            Cast::Array => decode_json(value, |v| v.is_array() || v.is_object()),
            Cast::Object => decode_json(value, Value::is_object),
            Cast::Date => parse_datetime(value)
                .map(|dt| Value::String(dt.format(DATE_FORMAT).to_string()))
                .unwrap_or(Value::Null),
            Cast::DateTime => parse_datetime(value)
                .map(|dt| Value::String(dt.format(DATETIME_FORMAT).to_string()))
                .unwrap_or(Value::Null),
        }
    }
}

/// Leading numeric prefix of a string, as a float (`"12abc"` is 12)
fn numeric_prefix(text: &str) -> f64 {
    let text = text.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in text.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return 0.0;
    }
    text[..end].parse().unwrap_or(0.0)
}

fn to_int(value: &Value) -> i64 {
    match value {
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .unwrap_or_else(|_| numeric_prefix(s) as i64),
        Value::Array(a) => i64::from(!a.is_empty()),
        Value::Object(o) => i64::from(!o.is_empty()),
        Value::Null => 0,
    }
}

fn to_float(value: &Value) -> f64 {
    match value {
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or_else(|_| numeric_prefix(s)),
        Value::Array(a) => f64::from(u8::from(!a.is_empty())),
        Value::Object(o) => f64::from(u8::from(!o.is_empty())),
        Value::Null => 0.0,
    }
}

fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Loose truthiness: `0`, `0.0`, `""`, `"0"`, `[]` and `{}` are false
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn decode_json(value: &Value, accept: impl Fn(&Value) -> bool) -> Value {
    let decoded = match value {
        Value::String(s) => serde_json::from_str(s).unwrap_or(Value::Null),
        other => other.clone(),
    };
    if accept(&decoded) {
        decoded
    } else {
        Value::Null
    }
}

/// Parse a stored date or timestamp. Integers are unix seconds.
pub fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                .ok()
                .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
                .or_else(|| {
                    NaiveDate::parse_from_str(s, DATE_FORMAT)
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.naive_utc()),
        _ => None,
    }
}
