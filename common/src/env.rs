//! Helpers for reading process environment variables.
use std::env;

/// Read an environment variable, falling back to `fallback` when it is not set.
pub fn get_env(key: &str, fallback: &str) -> String {
    env::var(key).unwrap_or_else(|_| fallback.to_owned())
}

/// Read an environment variable as a boolean.
///
/// Absent or unparseable values are reported as `false`.
pub fn get_bool_env(key: &str) -> bool {
    parse_bool(&get_env(key, "false")).unwrap_or(false)
}

/// Parse a boolean literal.
///
/// Accepts `1`, `t`, `T`, `TRUE`, `true`, `True`, `0`, `f`, `F`, `FALSE`, `false` and `False`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
