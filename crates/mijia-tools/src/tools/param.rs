//! Declared tool parameters and their JSON types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// The declared JSON type of a tool parameter.
///
/// The six standard types are type-checked at dispatch time. Any other
/// declared type string is kept verbatim in [`ParamType::Other`]; it is
/// rendered into the schema as-is and skips type checking entirely.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Other(String),
}

impl ParamType {
    /// A parameter that accepts any value (`"any"`).
    pub fn any() -> Self {
        ParamType::Other("any".into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
            ParamType::Other(s) => s,
        }
    }

    /// Whether `value` satisfies this type.
    ///
    /// Dispatches on the JSON tag: booleans are never numbers, and an
    /// integer must be a whole number without a fractional representation
    /// (`2` matches, `2.0` does not). `Other` accepts everything.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
            ParamType::Other(_) => true,
        }
    }
}

impl From<&str> for ParamType {
    fn from(s: &str) -> Self {
        match s {
            "string" => ParamType::String,
            "integer" => ParamType::Integer,
            "number" => ParamType::Number,
            "boolean" => ParamType::Boolean,
            "array" => ParamType::Array,
            "object" => ParamType::Object,
            other => ParamType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ParamType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ParamType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ParamType::from(s.as_str()))
    }
}

/// One declared argument of a tool.
///
/// Parameters are required by default; call [`optional`](Self::optional) or
/// [`with_default`](Self::with_default) to relax that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub description: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn default_required() -> bool {
    true
}

impl ToolParameter {
    pub fn new(
        name: impl Into<String>,
        param_type: impl Into<ParamType>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
            enum_values: None,
            minimum: None,
            maximum: None,
            default: None,
        }
    }

    /// Mark the parameter as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Restrict the parameter to a closed set of literal values.
    pub fn with_enum(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.enum_values = Some(values.into_iter().collect());
        self
    }

    /// Inclusive lower bound for numeric values.
    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    /// Inclusive upper bound for numeric values.
    pub fn with_maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    /// Value injected when the caller omits the parameter. Implies optional.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self.required = false;
        self
    }

    /// The default injected on omission. Required parameters never have one,
    /// and a declared `null` default counts as no default.
    pub fn default_value(&self) -> Option<&Value> {
        if self.required {
            return None;
        }
        self.default.as_ref().filter(|v| !v.is_null())
    }

    /// The closed set of accepted values. An empty list restricts nothing.
    pub fn allowed_values(&self) -> Option<&[Value]> {
        self.enum_values.as_deref().filter(|values| !values.is_empty())
    }

    /// Render this parameter's entry for the `properties` map of a
    /// function-calling schema. Absent constraints are omitted, and the
    /// default is only emitted for optional parameters.
    pub fn to_property_schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), Value::String(self.param_type.to_string()));
        schema.insert("description".into(), Value::String(self.description.clone()));
        if let Some(values) = self.allowed_values() {
            schema.insert("enum".into(), Value::Array(values.to_vec()));
        }
        if let Some(min) = self.minimum.and_then(number_value) {
            schema.insert("minimum".into(), min);
        }
        if let Some(max) = self.maximum.and_then(number_value) {
            schema.insert("maximum".into(), max);
        }
        if let Some(default) = self.default_value() {
            schema.insert("default".into(), default.clone());
        }
        Value::Object(schema)
    }
}

/// Render a bound as an integer when it has no fractional part, so `1.0`
/// appears in the schema as `1`. Non-finite bounds have no JSON form.
fn number_value(n: f64) -> Option<Value> {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Some(Value::from(n as i64))
    } else {
        serde_json::Number::from_f64(n).map(Value::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_checks_dispatch_on_tag() {
        assert!(ParamType::String.accepts(&json!("on")));
        assert!(!ParamType::String.accepts(&json!(1)));

        assert!(ParamType::Integer.accepts(&json!(3)));
        assert!(ParamType::Integer.accepts(&json!(-3)));
        assert!(!ParamType::Integer.accepts(&json!(3.5)));
        assert!(!ParamType::Integer.accepts(&json!(true)));

        assert!(ParamType::Number.accepts(&json!(3)));
        assert!(ParamType::Number.accepts(&json!(3.5)));
        assert!(!ParamType::Number.accepts(&json!("3")));

        assert!(ParamType::Boolean.accepts(&json!(false)));
        assert!(!ParamType::Boolean.accepts(&json!(0)));

        assert!(ParamType::Array.accepts(&json!([1, 2])));
        assert!(ParamType::Object.accepts(&json!({"a": 1})));
        assert!(!ParamType::Object.accepts(&json!(null)));
    }

    #[test]
    fn unknown_type_names_skip_checks() {
        let ty = ParamType::from("any");
        assert_eq!(ty, ParamType::any());
        assert!(ty.accepts(&json!(null)));
        assert!(ty.accepts(&json!({"nested": [1]})));
        assert_eq!(ty.to_string(), "any");
    }

    #[test]
    fn with_default_makes_parameter_optional() {
        let param = ToolParameter::new("params", ParamType::Array, "Action inputs")
            .with_default(json!([]));
        assert!(!param.required);
        assert_eq!(param.default, Some(json!([])));
    }

    #[test]
    fn property_schema_omits_absent_fields() {
        let param = ToolParameter::new("device_id", "string", "Device ID");
        let schema = param.to_property_schema();
        assert_eq!(schema, json!({"type": "string", "description": "Device ID"}));
    }

    #[test]
    fn property_schema_includes_constraints() {
        let param = ToolParameter::new("brightness", ParamType::Integer, "Brightness")
            .with_minimum(1.0)
            .with_maximum(100.0)
            .with_default(50);
        let schema = param.to_property_schema();
        assert_eq!(schema["minimum"], json!(1));
        assert_eq!(schema["maximum"], json!(100));
        assert_eq!(schema["default"], json!(50));

        let param = ToolParameter::new("mode", "string", "Mode")
            .with_enum([json!("auto"), json!("sleep")]);
        assert_eq!(param.to_property_schema()["enum"], json!(["auto", "sleep"]));
    }

    #[test]
    fn required_parameter_never_renders_default() {
        let mut param = ToolParameter::new("siid", ParamType::Integer, "Service ID");
        param.default = Some(json!(2));
        assert!(param.required);
        assert!(param.to_property_schema().get("default").is_none());
    }

    #[test]
    fn null_default_counts_as_absent() {
        let param = ToolParameter::new("note", ParamType::String, "Note").with_default(Value::Null);
        assert!(!param.required);
        assert!(param.default_value().is_none());
        assert!(param.to_property_schema().get("default").is_none());
    }

    #[test]
    fn empty_enum_is_not_rendered() {
        let param = ToolParameter::new("mode", ParamType::String, "Mode").with_enum(Vec::new());
        assert!(param.allowed_values().is_none());
        assert!(param.to_property_schema().get("enum").is_none());
    }

    #[test]
    fn non_finite_bounds_are_omitted() {
        let param = ToolParameter::new("n", ParamType::Number, "n")
            .with_minimum(f64::NAN)
            .with_maximum(f64::INFINITY);
        assert_eq!(
            param.to_property_schema(),
            json!({"type": "number", "description": "n"})
        );
    }

    #[test]
    fn fractional_bounds_stay_floats() {
        let param = ToolParameter::new("t", ParamType::Number, "Temp").with_maximum(30.5);
        assert_eq!(param.to_property_schema()["maximum"], json!(30.5));
    }

    #[test]
    fn deserializes_from_declaration() {
        let param: ToolParameter = serde_json::from_value(json!({
            "name": "value",
            "type": "any",
            "description": "Value to write"
        }))
        .unwrap();
        assert!(param.required);
        assert_eq!(param.param_type, ParamType::any());
    }
}
