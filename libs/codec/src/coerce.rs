//! Field coercion into canonical Rust types
//!
//! Contract integers travel as JSON numbers, decimal strings or `0x` hex strings
//! depending on the transport. All of them are widened to `u128`; anything larger
//! is rejected instead of truncated.

use serde_json::Value;
use types::Address;

/// Unsigned integer from a number, decimal string or `0x` hex string
pub fn uint(value: &Value) -> Result<u128, String> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| format!("{} is not an unsigned integer", n)),
        Value::String(s) => parse_uint_str(s),
        other => Err(format!("expected integer, got {}", crate::raw::value_kind(other))),
    }
}

fn parse_uint_str(text: &str) -> Result<u128, String> {
    let trimmed = text.trim();
    if let Some(digits) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        let significant = digits.trim_start_matches('0');
        if significant.is_empty() {
            return Ok(0);
        }
        if significant.len() > 32 {
            return Err(format!("{} overflows 128 bits", trimmed));
        }
        return u128::from_str_radix(significant, 16).map_err(|e| format!("'{}': {}", trimmed, e));
    }
    trimmed
        .parse::<u128>()
        .map_err(|e| format!("'{}': {}", trimmed, e))
}

/// Unsigned integer narrowed to `u64`
pub fn uint64(value: &Value) -> Result<u64, String> {
    let wide = uint(value)?;
    u64::try_from(wide).map_err(|_| format!("{} does not fit in 64 bits", wide))
}

/// Strict boolean. Missing values are false; integers are true when non-zero.
pub fn boolean(value: Option<&Value>) -> Result<bool, String> {
    match value {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            _ => parse_uint_str(s).map(|n| n != 0),
        },
        Some(number @ Value::Number(_)) => uint(number).map(|n| n != 0),
        Some(other) => Err(format!("expected bool, got {}", crate::raw::value_kind(other))),
    }
}

/// Text field; missing values become the empty string
pub fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// List of text labels; a non-list value yields an empty list
pub fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(|item| text(Some(item))).collect(),
        _ => Vec::new(),
    }
}

pub fn address(value: &Value) -> Result<Address, String> {
    match value {
        Value::String(s) => s.parse::<Address>().map_err(|e| e.to_string()),
        other => Err(format!("expected address string, got {}", crate::raw::value_kind(other))),
    }
}
