//! Coercion from untyped source values into an option's semantic type.
//!
//! Sources hand over a [`toml::Value`]: environment variables always arrive as
//! strings, config files may carry native integers, booleans, arrays or tables.
//! Each function here accepts every shape that has an obvious reading for its
//! target type and returns a plain error string otherwise. The binder attaches
//! the option name and raw value.

use std::collections::BTreeMap;
use std::time::Duration;

use toml::Value;

use crate::duration;
use crate::error::BindError;

/// The shared integer narrowing rule.
///
/// Integer defaults of any width are carried as `i128`; this converts one to the
/// destination's width, rejecting values that do not fit instead of truncating.
pub fn widen<T: TryFrom<i128>>(flag: &str, value: i128) -> Result<T, BindError> {
    T::try_from(value).map_err(|_| BindError::DefaultOutOfRange {
        flag: flag.to_string(),
        value,
        target: std::any::type_name::<T>(),
    })
}

/// Render a source value the way it appears in error messages: strings
/// unquoted, everything else in TOML syntax.
pub fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn to_string(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(d) => Ok(d.to_string()),
        Value::Array(_) => Err("an array cannot be used as a single value".to_string()),
        Value::Table(_) => Err("a table cannot be used as a single value".to_string()),
    }
}

pub fn to_int<T: TryFrom<i128>>(value: &Value) -> Result<T, String> {
    let wide = match value {
        Value::Integer(i) => i128::from(*i),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => *f as i128,
        Value::Float(f) => return Err(format!("{f} is not a whole number")),
        Value::Boolean(b) => i128::from(*b),
        Value::String(s) => parse_int(s)?,
        other => return Err(format!("cannot read a {} as an integer", other.type_str())),
    };
    T::try_from(wide)
        .map_err(|_| format!("{wide} is out of range for {}", std::any::type_name::<T>()))
}

/// Parse decimal, `0x`, `0o` or `0b` integers. A zero fraction (`"42.0"`) is
/// tolerated since some writers emit integers that way.
fn parse_int(s: &str) -> Result<i128, String> {
    let trimmed = s.trim();
    let digits = match trimmed.split_once('.') {
        Some((int, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => int,
        _ => trimmed,
    };
    let (negative, unsigned) = match digits.as_bytes().first() {
        Some(b'-') => (true, &digits[1..]),
        Some(b'+') => (false, &digits[1..]),
        _ => (false, digits),
    };
    let (radix, body) = match unsigned.get(..2) {
        Some("0x" | "0X") => (16, &unsigned[2..]),
        Some("0o" | "0O") => (8, &unsigned[2..]),
        Some("0b" | "0B") => (2, &unsigned[2..]),
        _ => (10, unsigned),
    };
    if body.is_empty() || body.starts_with(['+', '-']) {
        return Err(format!("{s:?} is not an integer"));
    }
    let magnitude =
        i128::from_str_radix(body, radix).map_err(|_| format!("{s:?} is not an integer"))?;
    Ok(if negative { -magnitude } else { magnitude })
}

pub fn to_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::Integer(i) => Ok(*i != 0),
        Value::String(s) => match s.trim() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            other => Err(format!("{other:?} is not a boolean")),
        },
        other => Err(format!("cannot read a {} as a boolean", other.type_str())),
    }
}

/// Strings are duration expressions; bare numbers are nanoseconds.
pub fn to_duration(value: &Value) -> Result<Duration, String> {
    match value {
        Value::Integer(i) => u64::try_from(*i)
            .map(Duration::from_nanos)
            .map_err(|_| format!("negative duration {i} is not supported")),
        Value::Float(f) if *f >= 0.0 && f.is_finite() => Ok(Duration::from_nanos(*f as u64)),
        Value::Float(f) => Err(format!("{f} is not a valid duration")),
        Value::String(s) => {
            let t = s.trim();
            if !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()) {
                let nanos: u64 = t.parse().map_err(|_| format!("duration {s:?} overflows"))?;
                return Ok(Duration::from_nanos(nanos));
            }
            duration::parse(t)
        }
        other => Err(format!("cannot read a {} as a duration", other.type_str())),
    }
}

/// Arrays map element-wise; strings split on commas.
pub fn to_string_list(value: &Value) -> Result<Vec<String>, String> {
    match value {
        Value::Array(items) => items.iter().map(to_string).collect(),
        Value::String(s) => Ok(split_list(s)),
        Value::Table(_) => Err("a table cannot be used as a list".to_string()),
        scalar => Ok(vec![to_string(scalar)?]),
    }
}

fn split_list(s: &str) -> Vec<String> {
    if s.trim().is_empty() {
        return Vec::new();
    }
    s.split(',').map(|part| part.trim().to_string()).collect()
}

/// Tables map value-wise; strings are a JSON object or `k=v,k2=v2`; arrays are
/// lists of such pair strings. On duplicate keys the last occurrence wins.
pub fn to_string_map(value: &Value) -> Result<BTreeMap<String, String>, String> {
    let mut out = BTreeMap::new();
    match value {
        Value::Table(table) => {
            for (k, v) in table {
                out.insert(k.clone(), to_string(v)?);
            }
        }
        Value::String(s) => parse_pairs(s, &mut out)?,
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(s) => parse_pairs(s, &mut out)?,
                    other => {
                        return Err(format!("expected key=value, found a {}", other.type_str()));
                    }
                }
            }
        }
        other => return Err(format!("cannot read a {} as a map", other.type_str())),
    }
    Ok(out)
}

fn parse_pairs(s: &str, out: &mut BTreeMap<String, String>) -> Result<(), String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    if trimmed.starts_with('{') {
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(trimmed).map_err(|e| e.to_string())?;
        for (k, v) in object {
            let text = match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            out.insert(k, text);
        }
        return Ok(());
    }
    for pair in trimmed.split(',') {
        let pair = pair.trim();
        let (k, v) = pair
            .split_once('=')
            .ok_or_else(|| format!("{pair:?} must be formatted as key=value"))?;
        out.insert(k.to_string(), v.to_string());
    }
    Ok(())
}
