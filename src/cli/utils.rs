//! Shared utilities for CLI commands

use serde::Serialize;
use serde_json::{Map, Value};
use tabled::{Table, settings::Style};

use crate::cli::error::{CliError, CliResult};

/// Truncate a string with ellipsis if it exceeds max length
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional text attribute for display
pub fn format_optional(value: Option<&str>, max: usize) -> String {
    value
        .map(|v| truncate_with_ellipsis(v, max))
        .unwrap_or_else(|| "-".to_string())
}

/// Check that a user-supplied argument is a JSON object before sending it.
pub fn ensure_json_object(flag: &str, raw: &str) -> CliResult<()> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(_)) => Ok(()),
        Ok(_) => Err(CliError::InvalidInput {
            message: format!("--{} must be a JSON object", flag),
            help: Some(format!(r#"Example: --{} '{{"title": "Buy milk"}}'"#, flag)),
        }),
        Err(e) => Err(CliError::InvalidInput {
            message: format!("--{} is not valid JSON: {}", flag, e),
            help: None,
        }),
    }
}

/// Build a PATCH body from the given attributes, sending `null` for each
/// attribute named in `clear`.
pub fn patch_body<T: Serialize>(fields: &T, clear: &[String]) -> CliResult<Value> {
    let mut body = match serde_json::to_value(fields) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => {
            return Err(CliError::InvalidInput {
                message: format!("Cannot encode attributes: {}", e),
                help: None,
            });
        }
    };

    for name in clear {
        if body.contains_key(name) {
            return Err(CliError::InvalidInput {
                message: format!("Attribute '{}' is both set and cleared", name),
                help: Some(format!("Drop either --{} or --clear {}", name, name)),
            });
        }
        body.insert(name.clone(), Value::Null);
    }

    Ok(Value::Object(body))
}

/// Apply consistent table styling
pub fn apply_table_style(table: &mut Table) {
    table.with(Style::rounded());
}
