//! Canonical tool name constants.
//!
//! All tool-name string literals should reference these constants to avoid
//! scattered magic strings. When a tool is renamed, only this file needs
//! to change.

/// Category shared by every device tool.
pub const MIJIA_CATEGORY: &str = "mijia";

pub const CONNECT: &str = "connect";
pub const DISCONNECT: &str = "disconnect";
pub const DISCOVER_DEVICES: &str = "discover_devices";
pub const GET_DEVICE_PROPERTIES: &str = "get_device_properties";
pub const GET_DEVICE_ACTIONS: &str = "get_device_actions";
pub const GET_PROPERTY_VALUE: &str = "get_property_value";
pub const SET_PROPERTY_VALUE: &str = "set_property_value";
pub const CALL_ACTION: &str = "call_action";

/// Every device tool, in registration order.
pub const DEVICE_TOOLS: [&str; 8] = [
    CONNECT,
    DISCONNECT,
    DISCOVER_DEVICES,
    GET_DEVICE_PROPERTIES,
    GET_DEVICE_ACTIONS,
    GET_PROPERTY_VALUE,
    SET_PROPERTY_VALUE,
    CALL_ACTION,
];
