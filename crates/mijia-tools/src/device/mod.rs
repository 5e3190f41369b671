//! Device access behind a small async trait.
//!
//! The device tools never talk to a cloud directly. They call a
//! [`DeviceAdapter`], which any backend can implement: the in-process
//! [`MemoryAdapter`](memory::MemoryAdapter) ships with the crate, and a
//! cloud-backed adapter plugs in the same way.
//!
//! Devices are addressed the MIoT way: a property is `(siid, piid)` and an
//! action is `(siid, aiid)` within a service instance.

pub mod memory;
pub mod tools;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by [`DeviceAdapter`] methods.
pub type AdapterFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, DeviceError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Not connected to Mijia cloud service")]
    NotConnected,

    #[error("Device {0} not found. Please discover devices first.")]
    DeviceNotFound(String),

    #[error("Property {siid}:{piid} not found on device {device_id}")]
    PropertyNotFound {
        device_id: String,
        siid: u32,
        piid: u32,
    },

    #[error("Action {siid}:{aiid} not found on device {device_id}")]
    ActionNotFound {
        device_id: String,
        siid: u32,
        aiid: u32,
    },

    #[error("Property {siid}:{piid} on device {device_id} is not writable")]
    ReadOnly {
        device_id: String,
        siid: u32,
        piid: u32,
    },

    #[error("Mijia API error: {0}")]
    Api(String),
}

/// A device visible to the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(alias = "did")]
    pub device_id: String,
    pub name: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(default)]
    pub online: bool,
}

/// One labelled entry of a property's value list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueListItem {
    pub value: Value,
    pub description: String,
}

/// The spec of one device property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub siid: u32,
    pub piid: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Any of `read`, `write`, `notify`.
    #[serde(default)]
    pub access: Vec<String>,
    /// Value format, e.g. `bool`, `uint8`, `float`, `string`.
    pub format: String,
    /// `[min, max, step]` for numeric properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_range: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_list: Option<Vec<ValueListItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl PropertyInfo {
    pub fn is_readable(&self) -> bool {
        self.access.iter().any(|a| a == "read")
    }

    pub fn is_writable(&self) -> bool {
        self.access.iter().any(|a| a == "write")
    }
}

/// The spec of one device action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub siid: u32,
    pub aiid: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// `piid`s of the input arguments, in call order.
    #[serde(default)]
    pub in_params: Vec<u32>,
    /// `piid`s of the returned values, in result order.
    #[serde(default)]
    pub out_params: Vec<u32>,
}

/// Access to a set of devices.
///
/// Every method except [`connect`](Self::connect) fails with
/// [`DeviceError::NotConnected`] while disconnected. Methods taking a
/// `device_id` fail with [`DeviceError::DeviceNotFound`] for devices not
/// returned by the last [`discover_devices`](Self::discover_devices).
pub trait DeviceAdapter: Send + Sync {
    /// Log in. Returns `false` when the backend rejects the login.
    fn connect(&self) -> AdapterFuture<'_, bool>;

    /// Drop the session and the discovered-device cache.
    fn disconnect(&self) -> AdapterFuture<'_, ()>;

    fn is_connected(&self) -> bool;

    /// List devices and refresh the device cache.
    fn discover_devices(&self) -> AdapterFuture<'_, Vec<DeviceInfo>>;

    fn get_device_properties<'a>(&'a self, device_id: &'a str)
    -> AdapterFuture<'a, Vec<PropertyInfo>>;

    fn get_device_actions<'a>(&'a self, device_id: &'a str) -> AdapterFuture<'a, Vec<ActionInfo>>;

    fn get_property_value<'a>(
        &'a self,
        device_id: &'a str,
        siid: u32,
        piid: u32,
    ) -> AdapterFuture<'a, Value>;

    /// Write a property. Returns whether the device accepted the value.
    fn set_property_value<'a>(
        &'a self,
        device_id: &'a str,
        siid: u32,
        piid: u32,
        value: Value,
    ) -> AdapterFuture<'a, bool>;

    /// Run an action and return its output values.
    fn call_action<'a>(
        &'a self,
        device_id: &'a str,
        siid: u32,
        aiid: u32,
        params: Vec<Value>,
    ) -> AdapterFuture<'a, Vec<Value>>;
}
