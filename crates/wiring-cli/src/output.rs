//! Formatted output helpers for CLI commands.

use wiring_common::types::Value;
use wiring_definition::EntryDefinition;

/// Double horizontal rule under headings.
#[must_use]
pub fn rule(width: usize) -> String {
    "\u{2550}".repeat(width)
}

/// One-line summary of an entry: source, lifetime, and type default.
#[must_use]
pub fn describe_entry(entry: &EntryDefinition) -> String {
    let mut line = format!("{entry}, {}", entry.lifetime);
    if let Some(type_name) = &entry.default_for {
        line.push_str(&format!(", default-for {type_name}"));
    }
    if !entry.properties.is_empty() {
        let names: Vec<&str> = entry.properties.iter().map(|(name, _)| name.as_str()).collect();
        line.push_str(&format!(", sets {}", names.join(", ")));
    }
    line
}

/// Pretty JSON rendering of a resolved value.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn render_value(value: &Value) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&value.to_json())?)
}
