//! Tool definitions: declared contract, bound handler, and schema rendering.
//!
//! A [`ToolDefinition`] is declared either manually with
//! [`ToolDefinition::new`] plus [`ToolParameter`] builders, or derived from a
//! typed handler with [`ToolDefinition::from_fn`] /
//! [`ToolDefinition::from_sync_fn`], which read the parameter list from the
//! handler's argument struct via `schemars`.

use crate::error::{HandlerError, ToolError};
use crate::tools::param::{ParamType, ToolParameter};
use crate::{ToolDef, json_schema_for};
use futures::FutureExt;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;

/// Category assigned to tools that don't declare one.
pub const DEFAULT_CATEGORY: &str = "general";

/// Boxed future returned by async tool handlers.
pub type ToolFuture = Pin<Box<dyn Future<Output = Result<Value, HandlerError>> + Send>>;

type SyncFn = dyn Fn(Map<String, Value>) -> Result<Value, HandlerError> + Send + Sync;
type AsyncFn = dyn Fn(Map<String, Value>) -> ToolFuture + Send + Sync;

// ── ToolHandler ────────────────────────────────────────────────────

/// The callable bound to a tool.
///
/// Handlers receive the validated argument map (declared parameters only,
/// defaults injected) and return a JSON value or an error. `Sync` handlers
/// run to completion on the calling task; `Async` handlers are awaited.
#[derive(Clone)]
pub enum ToolHandler {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
}

impl ToolHandler {
    /// Wrap a synchronous handler.
    pub fn from_sync<F, E>(f: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Result<Value, E> + Send + Sync + 'static,
        E: Into<HandlerError>,
    {
        ToolHandler::Sync(Arc::new(move |args| f(args).map_err(Into::into)))
    }

    /// Wrap an asynchronous handler.
    pub fn from_async<F, Fut, E>(f: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
        E: Into<HandlerError>,
    {
        ToolHandler::Async(Arc::new(move |args| {
            let fut = f(args);
            Box::pin(async move { fut.await.map_err(Into::into) })
        }))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, ToolHandler::Async(_))
    }

    /// Run the handler, converting handler errors and panics into
    /// [`ToolError`]s.
    pub async fn invoke(&self, tool_name: &str, args: Map<String, Value>) -> Result<Value, ToolError> {
        let outcome = match self {
            ToolHandler::Sync(f) => panic::catch_unwind(AssertUnwindSafe(|| f(args))),
            ToolHandler::Async(f) => match panic::catch_unwind(AssertUnwindSafe(|| f(args))) {
                Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
                Err(payload) => Err(payload),
            },
        };

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ToolError::Execution(e.to_string())),
            Err(_) => Err(ToolError::Panicked(tool_name.to_string())),
        }
    }
}

impl fmt::Debug for ToolHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolHandler::Sync(_) => f.write_str("ToolHandler::Sync"),
            ToolHandler::Async(_) => f.write_str("ToolHandler::Async"),
        }
    }
}

// ── ToolDefinition ─────────────────────────────────────────────────

/// One registrable capability: name, description, parameters, category,
/// and the handler that implements it.
///
/// # Example
///
/// ```ignore
/// let def = ToolDefinition::new("set_brightness", "Set lamp brightness")
///     .with_parameter(ToolParameter::new("device_id", ParamType::String, "Lamp ID"))
///     .with_parameter(
///         ToolParameter::new("level", ParamType::Integer, "Brightness percent")
///             .with_minimum(1.0)
///             .with_maximum(100.0),
///     )
///     .with_category("lighting")
///     .with_handler(ToolHandler::from_sync(|args| Ok::<_, String>(args.into())));
/// ```
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
    pub handler: Option<ToolHandler>,
    pub category: String,
}

impl ToolDefinition {
    /// Create a definition with no parameters, no handler, and the default
    /// category.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            handler: None,
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_parameters(mut self, parameters: impl IntoIterator<Item = ToolParameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_handler(mut self, handler: ToolHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Look up a declared parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Render the definition in the OpenAI function-calling format.
    ///
    /// Every parameter appears under `properties`; only required ones are
    /// listed in `required`.
    pub fn to_openai_schema(&self) -> ToolDef {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            properties.insert(param.name.clone(), param.to_property_schema());
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        let mut parameters = Map::new();
        parameters.insert("type".into(), Value::String("object".into()));
        parameters.insert("properties".into(), Value::Object(properties));
        parameters.insert("required".into(), Value::Array(required));

        ToolDef::new(&self.name, &self.description, Value::Object(parameters))
    }

    /// Derive a definition from an async handler taking a typed argument
    /// struct.
    ///
    /// The tool name defaults to the handler's function name, the
    /// description to the argument struct's doc comment (or
    /// `"Execute <name>"`), and each struct field becomes a parameter: fields
    /// without a serde default are required, field types map onto
    /// [`ParamType`] with `"string"` as the fallback, and field doc comments
    /// become parameter descriptions.
    ///
    /// ```ignore
    /// /// Read one property of a device.
    /// #[derive(Deserialize, JsonSchema)]
    /// struct ReadArgs {
    ///     device_id: String,
    ///     siid: i64,
    /// }
    ///
    /// async fn read_property(args: ReadArgs) -> Result<Value, DeviceError> { /* ... */ }
    ///
    /// let def = ToolDefinition::from_fn(read_property).category("mijia").build();
    /// assert_eq!(def.name, "read_property");
    /// ```
    pub fn from_fn<A, F, Fut, R, E>(f: F) -> FnToolBuilder
    where
        A: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: Serialize,
        E: Into<HandlerError>,
    {
        let handler = ToolHandler::from_async(move |args: Map<String, Value>| {
            let call = parse_args::<A>(args).map(&f);
            async move {
                let output = call?.await.map_err(Into::<HandlerError>::into)?;
                Ok::<_, HandlerError>(serde_json::to_value(output)?)
            }
        });
        FnToolBuilder::from_schema(fn_name::<F>(), &json_schema_for::<A>(), handler)
    }

    /// Synchronous counterpart of [`from_fn`](Self::from_fn).
    pub fn from_sync_fn<A, F, R, E>(f: F) -> FnToolBuilder
    where
        A: DeserializeOwned + JsonSchema + 'static,
        F: Fn(A) -> Result<R, E> + Send + Sync + 'static,
        R: Serialize,
        E: Into<HandlerError>,
    {
        let handler = ToolHandler::from_sync(move |args: Map<String, Value>| {
            let output = f(parse_args::<A>(args)?).map_err(Into::<HandlerError>::into)?;
            Ok::<_, HandlerError>(serde_json::to_value(output)?)
        });
        FnToolBuilder::from_schema(fn_name::<F>(), &json_schema_for::<A>(), handler)
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("category", &self.category)
            .field(
                "parameters",
                &self.parameters.iter().map(|p| &p.name).collect::<Vec<_>>(),
            )
            .field("handler", &self.handler)
            .finish()
    }
}

pub(crate) fn parse_args<A: DeserializeOwned>(args: Map<String, Value>) -> Result<A, HandlerError> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| ToolError::InvalidArguments(e.to_string()).into())
}

/// The declared name of a function item, taken from its type path.
/// Closure segments and generic arguments are stripped.
fn fn_name<F>() -> String {
    let full = std::any::type_name::<F>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::")
        .find(|segment| !segment.is_empty() && !segment.starts_with('{'))
        .unwrap_or(base)
        .to_string()
}

// ── FnToolBuilder ──────────────────────────────────────────────────

/// Builder returned by [`ToolDefinition::from_fn`] for overriding the
/// derived name, description, and category.
pub struct FnToolBuilder {
    derived_name: String,
    doc: Option<String>,
    parameters: Vec<ToolParameter>,
    handler: ToolHandler,
    name: Option<String>,
    description: Option<String>,
    category: Option<String>,
}

impl FnToolBuilder {
    fn from_schema(derived_name: String, schema: &Value, handler: ToolHandler) -> Self {
        Self {
            derived_name,
            doc: schema
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            parameters: parameters_from_schema(schema),
            handler,
            name: None,
            description: None,
            category: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn build(self) -> ToolDefinition {
        let name = self.name.unwrap_or(self.derived_name);
        let description = self
            .description
            .or(self.doc)
            .unwrap_or_else(|| format!("Execute {name}"));
        ToolDefinition {
            name,
            description,
            parameters: self.parameters,
            handler: Some(self.handler),
            category: self
                .category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        }
    }
}

/// Turn the `properties` of an object schema into a parameter list,
/// preserving field declaration order.
fn parameters_from_schema(schema: &Value) -> Vec<ToolParameter> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };

    properties
        .iter()
        .map(|(name, prop)| {
            let is_required = required.contains(&name.as_str());
            ToolParameter {
                name: name.clone(),
                param_type: infer_param_type(prop),
                description: prop
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Parameter {name}")),
                required: is_required,
                enum_values: prop.get("enum").and_then(Value::as_array).cloned(),
                minimum: prop.get("minimum").and_then(Value::as_f64),
                maximum: prop.get("maximum").and_then(Value::as_f64),
                default: prop
                    .get("default")
                    .filter(|v| !is_required && !v.is_null())
                    .cloned(),
            }
        })
        .collect()
}

/// Best-effort mapping from a field schema's declared `type` onto a
/// [`ParamType`]. Nullable unions use their first non-null member; anything
/// absent or unrecognized becomes `String`.
fn infer_param_type(prop: &Value) -> ParamType {
    let declared = match prop.get("type") {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    };

    match declared {
        Some("integer") => ParamType::Integer,
        Some("number") => ParamType::Number,
        Some("boolean") => ParamType::Boolean,
        Some("array") => ParamType::Array,
        Some("object") => ParamType::Object,
        _ => ParamType::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    /// Read one property of a device.
    #[derive(Deserialize, JsonSchema)]
    struct ReadArgs {
        /// Target device.
        device_id: String,
        siid: i64,
        scale: f64,
        #[serde(default)]
        verbose: bool,
        #[serde(default)]
        params: Option<Vec<Value>>,
        #[serde(default = "default_retries")]
        retries: u32,
        extra: Value,
    }

    fn default_retries() -> u32 {
        3
    }

    #[derive(Deserialize, JsonSchema)]
    struct NoArgs {}

    async fn read_property(args: ReadArgs) -> Result<Value, String> {
        Ok(json!({
            "device_id": args.device_id,
            "siid": args.siid,
            "scale": args.scale,
            "verbose": args.verbose,
            "params": args.params,
            "retries": args.retries,
            "extra": args.extra,
        }))
    }

    fn ping(_args: NoArgs) -> Result<&'static str, String> {
        Ok("pong")
    }

    #[test]
    fn from_fn_derives_name_and_description() {
        let def = ToolDefinition::from_fn(read_property).build();
        assert_eq!(def.name, "read_property");
        assert_eq!(def.description, "Read one property of a device.");
        assert_eq!(def.category, DEFAULT_CATEGORY);
        assert!(def.handler.as_ref().is_some_and(ToolHandler::is_async));
    }

    #[test]
    fn from_fn_overrides_win() {
        let def = ToolDefinition::from_fn(read_property)
            .name("read")
            .description("Read it")
            .category("mijia")
            .build();
        assert_eq!(def.name, "read");
        assert_eq!(def.description, "Read it");
        assert_eq!(def.category, "mijia");
    }

    #[test]
    fn undocumented_tool_gets_synthesized_description() {
        let def = ToolDefinition::from_sync_fn(ping).build();
        assert_eq!(def.name, "ping");
        assert_eq!(def.description, "Execute ping");
        assert!(def.parameters.is_empty());

        let renamed = ToolDefinition::from_sync_fn(ping).name("health").build();
        assert_eq!(renamed.description, "Execute health");
    }

    #[test]
    fn closure_names_fall_back_to_enclosing_fn() {
        let def = ToolDefinition::from_sync_fn(|_: NoArgs| Ok::<_, String>(1)).build();
        assert_eq!(def.name, "closure_names_fall_back_to_enclosing_fn");
    }

    #[test]
    fn from_fn_infers_parameters_in_declaration_order() {
        let def = ToolDefinition::from_fn(read_property).build();
        let names: Vec<&str> = def.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            ["device_id", "siid", "scale", "verbose", "params", "retries", "extra"]
        );

        let p = |n: &str| def.parameter(n).unwrap();
        assert_eq!(p("device_id").param_type, ParamType::String);
        assert_eq!(p("device_id").description, "Target device.");
        assert!(p("device_id").required);

        assert_eq!(p("siid").param_type, ParamType::Integer);
        assert_eq!(p("siid").description, "Parameter siid");
        assert_eq!(p("scale").param_type, ParamType::Number);
        assert_eq!(p("verbose").param_type, ParamType::Boolean);
        assert!(!p("verbose").required);

        assert_eq!(p("params").param_type, ParamType::Array);
        assert!(!p("params").required);
        assert_eq!(p("params").default, None);

        assert_eq!(p("retries").param_type, ParamType::Integer);
        assert_eq!(p("retries").default, Some(json!(3)));
        assert_eq!(p("retries").minimum, Some(0.0));
    }

    #[test]
    fn untyped_field_falls_back_to_string() {
        let def = ToolDefinition::from_fn(read_property).build();
        let extra = def.parameter("extra").unwrap();
        assert_eq!(extra.param_type, ParamType::String);
        assert!(extra.required);
    }

    #[test]
    fn openai_schema_lists_only_required_names() {
        let def = ToolDefinition::new("set_property_value", "Set a property")
            .with_parameter(ToolParameter::new("device_id", ParamType::String, "Device"))
            .with_parameter(ToolParameter::new("siid", ParamType::Integer, "Service"))
            .with_parameter(
                ToolParameter::new("note", ParamType::String, "Free text").with_default("none"),
            );

        let schema = serde_json::to_value(def.to_openai_schema()).unwrap();
        assert_eq!(schema["type"], "function");
        assert_eq!(schema["function"]["name"], "set_property_value");
        assert_eq!(schema["function"]["parameters"]["type"], "object");
        assert_eq!(
            schema["function"]["parameters"]["required"],
            json!(["device_id", "siid"])
        );
        let props = schema["function"]["parameters"]["properties"]
            .as_object()
            .unwrap();
        assert_eq!(props.len(), 3);
        assert_eq!(props["note"]["default"], "none");
    }

    #[test]
    fn rendered_parameters_are_valid_json_schema() {
        let def = ToolDefinition::from_fn(read_property).build();
        let params = def.to_openai_schema().function.parameters;
        let validator = jsonschema::validator_for(&params).unwrap();
        assert!(validator.is_valid(&json!({
            "device_id": "abc",
            "siid": 2,
            "scale": 1.5,
            "extra": "x"
        })));
        assert!(!validator.is_valid(&json!({"siid": 2})));
    }

    #[tokio::test]
    async fn typed_handler_receives_parsed_arguments() {
        let def = ToolDefinition::from_fn(read_property).build();
        let handler = def.handler.unwrap();
        let mut args = Map::new();
        args.insert("device_id".into(), json!("lamp"));
        args.insert("siid".into(), json!(2));
        args.insert("scale".into(), json!(0.5));
        args.insert("extra".into(), json!({"k": 1}));

        let out = handler.invoke("read_property", args).await.unwrap();
        assert_eq!(out["device_id"], "lamp");
        assert_eq!(out["retries"], 3);
        assert_eq!(out["params"], Value::Null);
    }

    #[tokio::test]
    async fn typed_handler_reports_bad_arguments() {
        let def = ToolDefinition::from_fn(read_property).build();
        let err = def
            .handler
            .unwrap()
            .invoke("read_property", Map::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid tool arguments"));
    }

    #[tokio::test]
    async fn handler_panics_become_errors() {
        let sync = ToolHandler::from_sync(|_| -> Result<Value, String> { panic!("boom") });
        let err = sync.invoke("explode", Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::Panicked(name) if name == "explode"));

        let asynchronous = ToolHandler::from_async(|_| async {
            if true {
                panic!("boom");
            }
            Ok::<Value, String>(Value::Null)
        });
        let err = asynchronous.invoke("explode", Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::Panicked(_)));
    }
}
