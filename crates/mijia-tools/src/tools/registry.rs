//! The tool registry: catalog, schema export, and validated dispatch.
//!
//! [`ToolRegistry::execute`] is the boundary between an LLM-driven caller
//! and tool code. Every outcome, including unknown tools, invalid arguments,
//! handler errors and handler panics, comes back as an [`ExecutionResult`]
//! envelope rather than an `Err`.

use crate::ToolDef;
use crate::error::{Result, ToolError};
use crate::tools::definition::ToolDefinition;
use crate::tools::param::ToolParameter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use tracing::{debug, error, info, trace};

/// Characters of the argument payload shown in the INFO-level call log.
const ARGS_PREVIEW_CHARS: usize = 120;

// ── ExecutionResult ────────────────────────────────────────────────

/// The uniform envelope returned by every dispatch.
///
/// Serializes as `{"success": true, "result": ..., "tool_name": ...}` or
/// `{"success": false, "error": "...", "tool_name": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub tool_name: String,
}

impl ExecutionResult {
    pub fn ok(tool_name: impl Into<String>, result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            tool_name: tool_name.into(),
        }
    }

    pub fn failure(tool_name: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.to_string()),
            tool_name: tool_name.into(),
        }
    }

    /// Serialize the envelope as a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({
                "success": false,
                "error": format!("failed to serialize result: {e}"),
                "tool_name": self.tool_name,
            })
        })
    }
}

// ── SchemaFormat ───────────────────────────────────────────────────

/// Output formats supported by [`ToolRegistry::export_schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// A JSON array of OpenAI function-calling tool definitions.
    OpenAi,
}

impl FromStr for SchemaFormat {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "openai" => Ok(SchemaFormat::OpenAi),
            other => Err(ToolError::UnsupportedFormat(other.to_string())),
        }
    }
}

// ── ToolRegistry ───────────────────────────────────────────────────

#[derive(Default)]
struct RegistryState {
    tools: HashMap<String, ToolDefinition>,
    /// Tool names in first-registration order.
    order: Vec<String>,
    /// Category name to tool names, both in first-registration order.
    categories: Vec<(String, Vec<String>)>,
}

impl RegistryState {
    fn add_to_category(&mut self, category: &str, name: &str) {
        match self.categories.iter_mut().find(|(c, _)| c == category) {
            Some((_, names)) => {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
            None => self
                .categories
                .push((category.to_string(), vec![name.to_string()])),
        }
    }

    fn remove_from_category(&mut self, category: &str, name: &str) {
        if let Some((_, names)) = self.categories.iter_mut().find(|(c, _)| c == category) {
            names.retain(|n| n != name);
        }
        self.categories.retain(|(_, names)| !names.is_empty());
    }
}

/// A catalog of tools that can be dispatched by name.
///
/// Registration normally happens once at startup, but the catalog sits
/// behind an `RwLock`, so registering while other tasks dispatch is safe.
/// Handlers never run while the lock is held.
///
/// # Example
///
/// ```ignore
/// let registry = ToolRegistry::new()
///     .with(ToolDefinition::from_fn(read_temperature).category("climate").build())
///     .with(set_mode_definition());
///
/// let schema = registry.export_schema("openai")?;
/// let result = registry.execute_json("read_temperature", r#"{"room": "den"}"#).await;
/// assert!(result.success);
/// ```
pub struct ToolRegistry {
    state: RwLock<RegistryState>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .field("categories", &self.categories())
            .finish()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a tool, replacing any existing tool with the same name.
    ///
    /// A replaced tool keeps its position in [`tool_names`](Self::tool_names).
    /// Each name is listed once, under the category of its latest definition.
    pub fn register(&self, tool: ToolDefinition) {
        let name = tool.name.clone();
        let category = tool.category.clone();

        {
            let mut state = self.write();
            match state.tools.insert(name.clone(), tool) {
                None => state.order.push(name.clone()),
                Some(previous) if previous.category != category => {
                    state.remove_from_category(&previous.category, &name);
                    debug!("Tool {name} moved from category {} to {category}", previous.category);
                }
                Some(_) => debug!("Tool {name} re-registered, replacing previous definition"),
            }
            state.add_to_category(&category, &name);
        }

        info!("Registered tool: {name} in category {category}");
    }

    /// Register a tool (builder pattern).
    pub fn with(self, tool: ToolDefinition) -> Self {
        self.register(tool);
        self
    }

    /// Conditionally register a tool (builder pattern).
    pub fn with_if(self, condition: bool, tool: ToolDefinition) -> Self {
        if condition { self.with(tool) } else { self }
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<ToolDefinition> {
        self.read().tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().tools.contains_key(name)
    }

    /// All tools in registration order.
    pub fn tools(&self) -> Vec<ToolDefinition> {
        let state = self.read();
        state
            .order
            .iter()
            .filter_map(|name| state.tools.get(name).cloned())
            .collect()
    }

    /// Tools in `category`, in registration order. Unknown categories yield
    /// an empty list.
    pub fn tools_by_category(&self, category: &str) -> Vec<ToolDefinition> {
        let state = self.read();
        state
            .categories
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, names)| {
                names
                    .iter()
                    .filter_map(|name| state.tools.get(name).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every tool rendered in the OpenAI function-calling format.
    pub fn openai_tools(&self) -> Vec<ToolDef> {
        self.tools().iter().map(ToolDefinition::to_openai_schema).collect()
    }

    /// Tool names in registration order.
    pub fn tool_names(&self) -> Vec<String> {
        self.read().order.clone()
    }

    /// Category names in the order they were first used.
    pub fn categories(&self) -> Vec<String> {
        self.read()
            .categories
            .iter()
            .map(|(c, _)| c.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().tools.is_empty()
    }

    /// Serialize the schema of every registered tool.
    ///
    /// The only supported format is `"openai"`: a pretty-printed JSON array
    /// of function-calling definitions in registration order.
    pub fn export_schema(&self, format: &str) -> Result<String> {
        match format.parse::<SchemaFormat>()? {
            SchemaFormat::OpenAi => Ok(serde_json::to_string_pretty(&self.openai_tools())?),
        }
    }

    /// Validate `arguments` against the tool's parameters and run it.
    ///
    /// Never fails: unknown tools, tools without a handler, validation
    /// errors, handler errors and handler panics are all reported in the
    /// returned envelope.
    pub async fn execute(&self, tool_name: &str, arguments: &Map<String, Value>) -> ExecutionResult {
        log_tool_call(tool_name, arguments);
        let start = Instant::now();

        match self.dispatch(tool_name, arguments).await {
            Ok(result) => {
                debug!(
                    "Tool {tool_name} completed in {:.0}ms",
                    start.elapsed().as_secs_f64() * 1000.0
                );
                trace!("Tool {tool_name} result: {result}");
                ExecutionResult::ok(tool_name, result)
            }
            Err(e) => {
                error!("Error executing tool {tool_name}: {e}");
                ExecutionResult::failure(tool_name, e)
            }
        }
    }

    /// Like [`execute`](Self::execute), but takes the raw JSON arguments
    /// string delivered by function-calling APIs. A blank string means no
    /// arguments; anything other than a JSON object is rejected.
    pub async fn execute_json(&self, tool_name: &str, arguments: &str) -> ExecutionResult {
        if arguments.trim().is_empty() {
            return self.execute(tool_name, &Map::new()).await;
        }
        match serde_json::from_str::<Value>(arguments) {
            Ok(Value::Object(map)) => self.execute(tool_name, &map).await,
            Ok(other) => {
                let e = ToolError::InvalidArguments(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                ));
                error!("Error executing tool {tool_name}: {e}");
                ExecutionResult::failure(tool_name, e)
            }
            Err(e) => {
                let e = ToolError::InvalidArguments(e.to_string());
                error!("Error executing tool {tool_name}: {e}");
                ExecutionResult::failure(tool_name, e)
            }
        }
    }

    async fn dispatch(&self, tool_name: &str, arguments: &Map<String, Value>) -> Result<Value> {
        let tool = self
            .get(tool_name)
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;
        let handler = tool
            .handler
            .as_ref()
            .ok_or_else(|| ToolError::NotExecutable(tool_name.to_string()))?;

        let validated = validate_parameters(&tool, arguments)?;
        handler.invoke(tool_name, validated).await
    }
}

// ── Validation ─────────────────────────────────────────────────────

/// Check `arguments` against the tool's declared parameters, in declaration
/// order, stopping at the first violation.
///
/// Returns the map actually passed to the handler: supplied values for
/// declared parameters plus defaults for omitted optional ones. Keys that
/// match no declared parameter are dropped.
pub fn validate_parameters(
    tool: &ToolDefinition,
    arguments: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    let mut validated = Map::new();

    for param in &tool.parameters {
        match arguments.get(&param.name) {
            Some(value) => {
                check_value(param, value)?;
                validated.insert(param.name.clone(), value.clone());
            }
            None if param.required => {
                return Err(ToolError::MissingParameter(param.name.clone()));
            }
            None => {
                if let Some(default) = param.default_value() {
                    validated.insert(param.name.clone(), default.clone());
                }
            }
        }
    }

    Ok(validated)
}

fn check_value(param: &ToolParameter, value: &Value) -> Result<()> {
    if !param.param_type.accepts(value) {
        return Err(ToolError::InvalidType {
            name: param.name.clone(),
            expected: param.param_type.to_string(),
        });
    }

    if let Some(allowed) = param.allowed_values()
        && !allowed.iter().any(|a| values_equal(a, value))
    {
        return Err(ToolError::InvalidEnum {
            name: param.name.clone(),
            allowed: allowed.to_vec(),
        });
    }

    if let Some(n) = value.as_f64() {
        if let Some(minimum) = param.minimum
            && n < minimum
        {
            return Err(ToolError::BelowMinimum {
                name: param.name.clone(),
                minimum,
            });
        }
        if let Some(maximum) = param.maximum
            && n > maximum
        {
            return Err(ToolError::AboveMaximum {
                name: param.name.clone(),
                maximum,
            });
        }
    }

    Ok(())
}

/// Equality for enum membership: numbers compare by value, so `1` matches
/// an allowed `1.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Log a tool call at INFO level with a truncated preview of arguments.
fn log_tool_call(name: &str, arguments: &Map<String, Value>) {
    let rendered = Value::Object(arguments.clone()).to_string();
    let preview: String = rendered.chars().take(ARGS_PREVIEW_CHARS).collect();
    info!(
        "[tool] {name}({preview}{})",
        if rendered.chars().count() > ARGS_PREVIEW_CHARS { "..." } else { "" }
    );
    trace!("[tool] {name} arguments: {rendered}");
}

// ── Tests ──────────────────────────────────────────────────────────
