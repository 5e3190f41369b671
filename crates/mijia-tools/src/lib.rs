//! Smart-home device control exposed as function-calling tools for LLM agents.
//!
//! `mijia-tools` wraps a device cloud (discovery, property get/set, action
//! invocation) behind a small, declarative tool registry. An agent asks the
//! registry for its function-calling schema, then dispatches tool calls by
//! name with a loosely-typed JSON argument map. The registry validates the
//! arguments against each tool's declared parameters, runs the bound handler,
//! and always answers with a uniform envelope:
//!
//! ```json
//! { "success": true, "result": { "value": 42 }, "tool_name": "get_property_value" }
//! { "success": false, "error": "Required parameter 'device_id' is missing", "tool_name": "get_property_value" }
//! ```
//!
//! # Getting started
//!
//! ```ignore
//! use std::sync::Arc;
//! use mijia_tools::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let adapter: Arc<dyn DeviceAdapter> = Arc::new(MemoryAdapter::new(MijiaConfig::load(None)?));
//! let registry = ToolRegistry::new().with_device_tools(adapter);
//!
//! // Hand the schema to the LLM API.
//! let schema = registry.export_schema("openai")?;
//!
//! // Dispatch a tool call coming back from the model.
//! let result = registry
//!     .execute_json("get_property_value", r#"{"device_id": "123", "siid": 2, "piid": 1}"#)
//!     .await;
//! println!("{}", serde_json::to_string(&result)?);
//! # Ok(())
//! # }
//! ```
//!
//! # Where to find things
//!
//! - **Declare a tool:** [`ToolDefinition`](tools::ToolDefinition) and
//!   [`ToolParameter`](tools::ToolParameter) for manual declaration, or
//!   [`ToolDefinition::from_fn`](tools::ToolDefinition::from_fn) to derive the
//!   parameter list from a typed argument struct.
//! - **Register and dispatch:** [`ToolRegistry`](tools::ToolRegistry).
//! - **Talk to devices:** the [`DeviceAdapter`](device::DeviceAdapter) trait,
//!   the in-process [`MemoryAdapter`](device::memory::MemoryAdapter), and the
//!   device tools in [`device::tools`].
//! - **Load credentials:** [`MijiaConfig`](config::MijiaConfig).

pub mod config;
pub mod device;
pub mod error;
pub mod prelude;
pub mod tools;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use error::{HandlerError, Result, ToolError};

// Re-export schemars for downstream crates deriving argument structs.
pub use schemars;

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`.
///
/// Subschemas are inlined so every property carries its own `type`, which
/// is what [`ToolDefinition::from_fn`](tools::ToolDefinition::from_fn) reads
/// when inferring parameter types.
///
/// # Example
///
/// ```
/// use mijia_tools::json_schema_for;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct GetValueArgs {
///     device_id: String,
///     #[serde(default)]
///     siid: Option<i64>,
/// }
///
/// let schema = json_schema_for::<GetValueArgs>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"device_id".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let settings = schemars::r#gen::SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
    });
    let schema = settings.into_generator().into_root_schema_for::<T>();
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Tool wire types ────────────────────────────────────────────────

/// The type of a tool definition. Currently always `Function`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ToolType {
    #[serde(rename = "function")]
    Function,
}

/// Tool definition in the OpenAI function-calling format.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ToolDef {
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    pub function: FunctionDef,
}

impl ToolDef {
    /// Create a function-calling tool definition.
    ///
    /// `ToolType` is always `Function` in the current API, so there's no
    /// reason to specify it manually.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: ToolType::Function,
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}
