//! JSON output formatter

use serde::Serialize;

pub fn format_value<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string()) + "\n"
}
