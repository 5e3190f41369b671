//! The device tools: one tool per [`DeviceAdapter`] operation.
//!
//! Every tool lives in the [`MIJIA_CATEGORY`](names::MIJIA_CATEGORY)
//! category and answers with a JSON object. Register them all with
//! [`DeviceToolsExt::with_device_tools`].

use crate::HandlerError;
use crate::device::DeviceAdapter;
use crate::tools::definition::parse_args;
use crate::tools::names;
use crate::tools::{ParamType, ToolDefinition, ToolHandler, ToolParameter, ToolRegistry};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

// ── Argument types ──────────────────────────────────────────────────

#[derive(Deserialize, JsonSchema)]
struct NoArgs {}

#[derive(Deserialize, JsonSchema)]
struct DeviceArgs {
    /// Device ID (`did`) returned by discover_devices.
    device_id: String,
}

#[derive(Deserialize, JsonSchema)]
struct PropertyArgs {
    /// Device ID (`did`) returned by discover_devices.
    device_id: String,
    /// Service instance ID.
    siid: u32,
    /// Property instance ID.
    piid: u32,
}

#[derive(Deserialize)]
struct SetPropertyArgs {
    device_id: String,
    siid: u32,
    piid: u32,
    value: Value,
}

#[derive(Deserialize, JsonSchema)]
struct ActionArgs {
    /// Device ID (`did`) returned by discover_devices.
    device_id: String,
    /// Service instance ID.
    siid: u32,
    /// Action instance ID.
    aiid: u32,
    /// Input values, in the order of the action's `in_params`.
    #[serde(default)]
    params: Vec<Value>,
}

// ── Tools ───────────────────────────────────────────────────────────

fn connect_tool(adapter: Arc<dyn DeviceAdapter>) -> ToolDefinition {
    ToolDefinition::from_fn(move |_: NoArgs| {
        let adapter = adapter.clone();
        async move {
            let connected = adapter.connect().await?;
            let message = if connected {
                "Connected to Mijia cloud service"
            } else {
                "Failed to connect to Mijia cloud service"
            };
            Ok::<_, HandlerError>(json!({"connected": connected, "message": message}))
        }
    })
    .name(names::CONNECT)
    .description("Connect to the Mijia cloud service")
    .category(names::MIJIA_CATEGORY)
    .build()
}

fn disconnect_tool(adapter: Arc<dyn DeviceAdapter>) -> ToolDefinition {
    ToolDefinition::from_fn(move |_: NoArgs| {
        let adapter = adapter.clone();
        async move {
            adapter.disconnect().await?;
            Ok::<_, HandlerError>(json!({
                "connected": false,
                "message": "Disconnected from Mijia cloud service",
            }))
        }
    })
    .name(names::DISCONNECT)
    .description("Disconnect from the Mijia cloud service")
    .category(names::MIJIA_CATEGORY)
    .build()
}

fn discover_devices_tool(adapter: Arc<dyn DeviceAdapter>) -> ToolDefinition {
    ToolDefinition::from_fn(move |_: NoArgs| {
        let adapter = adapter.clone();
        async move {
            let devices = adapter.discover_devices().await?;
            Ok::<_, HandlerError>(json!({"count": devices.len(), "devices": devices}))
        }
    })
    .name(names::DISCOVER_DEVICES)
    .description("List the devices on the Mijia account")
    .category(names::MIJIA_CATEGORY)
    .build()
}

fn get_device_properties_tool(adapter: Arc<dyn DeviceAdapter>) -> ToolDefinition {
    ToolDefinition::from_fn(move |args: DeviceArgs| {
        let adapter = adapter.clone();
        async move {
            let properties = adapter.get_device_properties(&args.device_id).await?;
            Ok::<_, HandlerError>(json!({"device_id": args.device_id, "properties": properties}))
        }
    })
    .name(names::GET_DEVICE_PROPERTIES)
    .description("List a device's properties with their siid/piid, access and value range")
    .category(names::MIJIA_CATEGORY)
    .build()
}

fn get_device_actions_tool(adapter: Arc<dyn DeviceAdapter>) -> ToolDefinition {
    ToolDefinition::from_fn(move |args: DeviceArgs| {
        let adapter = adapter.clone();
        async move {
            let actions = adapter.get_device_actions(&args.device_id).await?;
            Ok::<_, HandlerError>(json!({"device_id": args.device_id, "actions": actions}))
        }
    })
    .name(names::GET_DEVICE_ACTIONS)
    .description("List a device's actions with their siid/aiid")
    .category(names::MIJIA_CATEGORY)
    .build()
}

fn get_property_value_tool(adapter: Arc<dyn DeviceAdapter>) -> ToolDefinition {
    ToolDefinition::from_fn(move |args: PropertyArgs| {
        let adapter = adapter.clone();
        async move {
            let value = adapter
                .get_property_value(&args.device_id, args.siid, args.piid)
                .await?;
            Ok::<_, HandlerError>(json!({
                "device_id": args.device_id,
                "siid": args.siid,
                "piid": args.piid,
                "value": value,
            }))
        }
    })
    .name(names::GET_PROPERTY_VALUE)
    .description("Read the current value of a device property")
    .category(names::MIJIA_CATEGORY)
    .build()
}

/// Declared by hand: `value` takes any JSON type, which an argument struct
/// can't express.
fn set_property_value_tool(adapter: Arc<dyn DeviceAdapter>) -> ToolDefinition {
    ToolDefinition::new(names::SET_PROPERTY_VALUE, "Write a device property")
        .with_parameters([
            ToolParameter::new(
                "device_id",
                ParamType::String,
                "Device ID (`did`) returned by discover_devices.",
            ),
            ToolParameter::new("siid", ParamType::Integer, "Service instance ID.").with_minimum(0.0),
            ToolParameter::new("piid", ParamType::Integer, "Property instance ID.")
                .with_minimum(0.0),
            ToolParameter::new(
                "value",
                ParamType::any(),
                "Value to write, matching the property's format.",
            ),
        ])
        .with_category(names::MIJIA_CATEGORY)
        .with_handler(ToolHandler::from_async(move |args| {
            let adapter = adapter.clone();
            async move {
                let args: SetPropertyArgs = parse_args(args)?;
                let success = adapter
                    .set_property_value(&args.device_id, args.siid, args.piid, args.value.clone())
                    .await?;
                Ok::<_, HandlerError>(json!({
                    "device_id": args.device_id,
                    "siid": args.siid,
                    "piid": args.piid,
                    "value": args.value,
                    "success": success,
                }))
            }
        }))
}

fn call_action_tool(adapter: Arc<dyn DeviceAdapter>) -> ToolDefinition {
    ToolDefinition::from_fn(move |args: ActionArgs| {
        let adapter = adapter.clone();
        async move {
            let result = adapter
                .call_action(&args.device_id, args.siid, args.aiid, args.params.clone())
                .await?;
            Ok::<_, HandlerError>(json!({
                "device_id": args.device_id,
                "siid": args.siid,
                "aiid": args.aiid,
                "params": args.params,
                "result": result,
            }))
        }
    })
    .name(names::CALL_ACTION)
    .description("Run a device action")
    .category(names::MIJIA_CATEGORY)
    .build()
}

/// All device tools bound to `adapter`, in [`names::DEVICE_TOOLS`] order.
pub fn device_tools(adapter: Arc<dyn DeviceAdapter>) -> Vec<ToolDefinition> {
    vec![
        connect_tool(adapter.clone()),
        disconnect_tool(adapter.clone()),
        discover_devices_tool(adapter.clone()),
        get_device_properties_tool(adapter.clone()),
        get_device_actions_tool(adapter.clone()),
        get_property_value_tool(adapter.clone()),
        set_property_value_tool(adapter.clone()),
        call_action_tool(adapter),
    ]
}

// ── Extension trait ─────────────────────────────────────────────────

/// Extension trait for registering the device tools on a [`ToolRegistry`].
///
/// # Example
///
/// ```ignore
/// use mijia_tools::prelude::*;
///
/// let adapter: Arc<dyn DeviceAdapter> = Arc::new(MemoryAdapter::new(config));
/// let registry = ToolRegistry::new().with_device_tools(adapter);
/// ```
pub trait DeviceToolsExt {
    fn with_device_tools(self, adapter: Arc<dyn DeviceAdapter>) -> Self;
}

impl DeviceToolsExt for ToolRegistry {
    fn with_device_tools(self, adapter: Arc<dyn DeviceAdapter>) -> Self {
        device_tools(adapter).into_iter().fold(self, ToolRegistry::with)
    }
}
