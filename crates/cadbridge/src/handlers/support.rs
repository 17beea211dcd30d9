//! Parameter extraction shared by handlers.
//!
//! Absent and `null` values fall back to the handler's default; values of
//! the wrong JSON type are rejected with [`HandlerError::InvalidParameter`].

use serde_json::Value;

use crate::handler::HandlerError;
use crate::protocol::Params;

fn present<'a>(params: &'a Params, key: &str) -> Option<&'a Value> {
    params.get(key).filter(|value| !value.is_null())
}

/// Reads a numeric parameter.
pub(crate) fn number(params: &Params, key: &str, default: f64) -> Result<f64, HandlerError> {
    match present(params, key) {
        None => Ok(default),
        Some(value) => value
            .as_f64()
            .ok_or_else(|| HandlerError::invalid_parameter(key, "a number")),
    }
}

/// Reads an optional integer parameter.
pub(crate) fn optional_integer(params: &Params, key: &str) -> Result<Option<i64>, HandlerError> {
    present(params, key)
        .map(|value| {
            value
                .as_i64()
                .ok_or_else(|| HandlerError::invalid_parameter(key, "an integer"))
        })
        .transpose()
}

/// Reads an integer parameter.
pub(crate) fn integer(params: &Params, key: &str, default: i64) -> Result<i64, HandlerError> {
    optional_integer(params, key).map(|value| value.unwrap_or(default))
}

/// Reads an optional string parameter.
pub(crate) fn optional_text<'a>(
    params: &'a Params,
    key: &str,
) -> Result<Option<&'a str>, HandlerError> {
    present(params, key)
        .map(|value| {
            value
                .as_str()
                .ok_or_else(|| HandlerError::invalid_parameter(key, "a string"))
        })
        .transpose()
}

/// Reads a string parameter.
pub(crate) fn text<'a>(
    params: &'a Params,
    key: &str,
    default: &'a str,
) -> Result<&'a str, HandlerError> {
    optional_text(params, key).map(|value| value.unwrap_or(default))
}

/// Renders a scalar parameter the way the controller wrote it.
///
/// Strings are used verbatim and numbers keep their JSON spelling, so `2`
/// stays `2` and `2.50` is rendered by `serde_json` as `2.5`.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Formats a measurement for result messages: whole values drop the
/// fractional part.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Rounds to four decimal places for reporting.
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
