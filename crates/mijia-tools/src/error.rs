//! Error types for tool registration, validation, and dispatch.
//!
//! Every variant's `Display` text is what the agent sees in the `error`
//! field of a failed [`ExecutionResult`](crate::tools::ExecutionResult), so
//! messages name the offending tool or parameter.

use serde_json::Value;
use thiserror::Error;

/// Boxed error returned by tool handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool '{0}' not found")]
    NotFound(String),

    #[error("Tool '{0}' has no associated function")]
    NotExecutable(String),

    #[error("Required parameter '{0}' is missing")]
    MissingParameter(String),

    #[error("Parameter '{name}' must be of type {expected}")]
    InvalidType { name: String, expected: String },

    #[error("Parameter '{name}' must be one of {}", format_allowed(.allowed))]
    InvalidEnum { name: String, allowed: Vec<Value> },

    #[error("Parameter '{name}' must be >= {minimum}")]
    BelowMinimum { name: String, minimum: f64 },

    #[error("Parameter '{name}' must be <= {maximum}")]
    AboveMaximum { name: String, maximum: f64 },

    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Execution(String),

    #[error("tool '{0}' panicked during execution")]
    Panicked(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ToolError>;

fn format_allowed(allowed: &[Value]) -> String {
    let items: Vec<String> = allowed.iter().map(Value::to_string).collect();
    format!("[{}]", items.join(", "))
}
