//! Tool error type

use thiserror::Error;

/// Failure of a single tool invocation.
///
/// Every variant is caused by the input; none of them indicate a server fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("Invalid Base64 input: {0}")]
    InvalidBase64(String),

    #[error("Decoded bytes are not valid UTF-8")]
    InvalidUtf8,

    #[error("Invalid JSON at line {line}, column {column}: {message}")]
    InvalidJson {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Invalid YAML: {0}")]
    InvalidYaml(String),

    #[error("Invalid regular expression: {0}")]
    InvalidRegex(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Value out of range: {0}")]
    OutOfRange(String),
}

impl ToolError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Self::OutOfRange(msg.into())
    }

    /// Stable machine-readable code for API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidBase64(_) => "invalid_base64",
            Self::InvalidUtf8 => "invalid_utf8",
            Self::InvalidJson { .. } => "invalid_json",
            Self::InvalidYaml(_) => "invalid_yaml",
            Self::InvalidRegex(_) => "invalid_regex",
            Self::InvalidInput(_) => "invalid_input",
            Self::UnknownUnit(_) => "unknown_unit",
            Self::DivisionByZero => "division_by_zero",
            Self::OutOfRange(_) => "out_of_range",
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        let message = err.to_string();
        // serde_json appends " at line X column Y" to its messages
        let message = match message.find(" at line ") {
            Some(idx) => message[..idx].to_string(),
            None => message,
        };
        Self::InvalidJson {
            line: err.line(),
            column: err.column(),
            message,
        }
    }
}

impl From<serde_yaml::Error> for ToolError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::InvalidYaml(err.to_string())
    }
}

impl From<regex::Error> for ToolError {
    fn from(err: regex::Error) -> Self {
        Self::InvalidRegex(err.to_string())
    }
}

/// Result alias for tool operations
pub type ToolResult<T> = std::result::Result<T, ToolError>;
