//! JSON formatter, minifier, validator and YAML converter

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use super::{ToolError, ToolResult};

pub const MAX_INDENT: usize = 8;

/// Shape of a valid JSON document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonSummary {
    /// Top-level type: object, array, string, number, boolean or null
    pub kind: &'static str,
    /// Number of keys or elements at the top level (0 for scalars)
    pub entries: usize,
    /// Deepest nesting level; scalars have depth 0
    pub depth: usize,
}

fn parse(text: &str) -> ToolResult<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Pretty-print JSON with `indent` spaces per level, keeping key order
pub fn format(text: &str, indent: usize) -> ToolResult<String> {
    if indent == 0 || indent > MAX_INDENT {
        return Err(ToolError::out_of_range(format!(
            "indent must be between 1 and {}",
            MAX_INDENT
        )));
    }
    let value = parse(text)?;
    let indent_str = " ".repeat(indent);
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent_str.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| ToolError::invalid_input(e.to_string()))?;
    String::from_utf8(out).map_err(|_| ToolError::InvalidUtf8)
}

/// Strip all insignificant whitespace
pub fn minify(text: &str) -> ToolResult<String> {
    let value = parse(text)?;
    serde_json::to_string(&value).map_err(|e| ToolError::invalid_input(e.to_string()))
}

/// Check that `text` is JSON and describe it
pub fn validate(text: &str) -> ToolResult<JsonSummary> {
    let value = parse(text)?;
    let (kind, entries) = match &value {
        Value::Object(map) => ("object", map.len()),
        Value::Array(items) => ("array", items.len()),
        Value::String(_) => ("string", 0),
        Value::Number(_) => ("number", 0),
        Value::Bool(_) => ("boolean", 0),
        Value::Null => ("null", 0),
    };
    Ok(JsonSummary {
        kind,
        entries,
        depth: depth(&value),
    })
}

fn depth(value: &Value) -> usize {
    match value {
        Value::Object(map) => 1 + map.values().map(depth).max().unwrap_or(0),
        Value::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
        _ => 0,
    }
}

/// Convert a JSON document to YAML
pub fn to_yaml(text: &str) -> ToolResult<String> {
    let value = parse(text)?;
    Ok(serde_yaml::to_string(&value)?)
}

/// Convert a YAML document to pretty-printed JSON
pub fn from_yaml(text: &str) -> ToolResult<String> {
    let value: Value = serde_yaml::from_str(text)?;
    serde_json::to_string_pretty(&value).map_err(|e| ToolError::invalid_input(e.to_string()))
}
