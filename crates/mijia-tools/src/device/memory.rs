//! An in-process [`DeviceAdapter`] backed by a device fixture.
//!
//! The fixture lists devices with their property specs, current values and
//! actions. Property writes are kept in memory for the adapter's lifetime.
//!
//! ```yaml
//! devices:
//!   - did: "lamp-001"
//!     name: Desk Lamp
//!     model: yeelink.light.lamp4
//!     online: true
//!     properties:
//!       - { siid: 2, piid: 1, name: "on", access: [read, write], format: bool, value: false }
//!     actions:
//!       - { siid: 2, aiid: 1, name: toggle }
//! ```

use crate::config::{ConfigError, MijiaConfig};
use crate::device::{
    ActionInfo, AdapterFuture, DeviceAdapter, DeviceError, DeviceInfo, PropertyInfo,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

// ── Fixture ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceFixture {
    #[serde(default)]
    pub devices: Vec<FixtureDevice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureDevice {
    #[serde(flatten)]
    pub info: DeviceInfo,
    #[serde(default)]
    pub properties: Vec<FixtureProperty>,
    #[serde(default)]
    pub actions: Vec<FixtureAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureProperty {
    #[serde(flatten)]
    pub spec: PropertyInfo,
    /// Current value.
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureAction {
    #[serde(flatten)]
    pub spec: ActionInfo,
    /// Values returned by every call.
    #[serde(default)]
    pub outputs: Vec<Value>,
}

impl DeviceFixture {
    /// Load a fixture from a `.json` file, or YAML for any other extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(&text).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&text).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

impl FixtureDevice {
    fn property_mut(&mut self, siid: u32, piid: u32) -> Result<&mut FixtureProperty, DeviceError> {
        let device_id = self.info.device_id.clone();
        self.properties
            .iter_mut()
            .find(|p| p.spec.siid == siid && p.spec.piid == piid)
            .ok_or(DeviceError::PropertyNotFound {
                device_id,
                siid,
                piid,
            })
    }

    fn action(&self, siid: u32, aiid: u32) -> Result<&FixtureAction, DeviceError> {
        self.actions
            .iter()
            .find(|a| a.spec.siid == siid && a.spec.aiid == aiid)
            .ok_or_else(|| DeviceError::ActionNotFound {
                device_id: self.info.device_id.clone(),
                siid,
                aiid,
            })
    }
}

// ── MemoryAdapter ──────────────────────────────────────────────────

#[derive(Default)]
struct AdapterState {
    connected: bool,
    devices: Vec<FixtureDevice>,
    /// Device IDs returned by the last discovery.
    discovered: HashSet<String>,
}

/// In-memory device backend.
///
/// `connect` succeeds when the [`MijiaConfig`] has usable credentials or QR
/// login enabled. Devices become addressable after `discover_devices`.
pub struct MemoryAdapter {
    config: MijiaConfig,
    state: Mutex<AdapterState>,
}

impl MemoryAdapter {
    /// An adapter with no devices.
    pub fn new(config: MijiaConfig) -> Self {
        Self {
            config,
            state: Mutex::new(AdapterState::default()),
        }
    }

    /// Replace the device set (builder pattern).
    pub fn with_fixture(self, fixture: DeviceFixture) -> Self {
        self.lock().devices = fixture.devices;
        self
    }

    pub fn from_fixture_file(
        config: MijiaConfig,
        path: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(config).with_fixture(DeviceFixture::from_file(path)?))
    }

    /// Number of devices in the discovered-device cache.
    pub fn device_count(&self) -> usize {
        self.lock().discovered.len()
    }

    fn lock(&self) -> MutexGuard<'_, AdapterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` on a connected, discovered device.
    fn with_device<T>(
        &self,
        device_id: &str,
        f: impl FnOnce(&mut FixtureDevice) -> Result<T, DeviceError>,
    ) -> Result<T, DeviceError> {
        let mut state = self.lock();
        if !state.connected {
            return Err(DeviceError::NotConnected);
        }
        if !state.discovered.contains(device_id) {
            return Err(DeviceError::DeviceNotFound(device_id.to_string()));
        }
        let device = state
            .devices
            .iter_mut()
            .find(|d| d.info.device_id == device_id)
            .ok_or_else(|| DeviceError::DeviceNotFound(device_id.to_string()))?;
        f(device)
    }
}

impl DeviceAdapter for MemoryAdapter {
    fn connect(&self) -> AdapterFuture<'_, bool> {
        Box::pin(async move {
            if !self.config.has_credentials() {
                warn!("Failed to connect to Mijia cloud service: no usable credentials");
                return Ok(false);
            }
            self.lock().connected = true;
            info!("Successfully connected to Mijia cloud service");
            Ok(true)
        })
    }

    fn disconnect(&self) -> AdapterFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.lock();
            state.connected = false;
            state.discovered.clear();
            info!("Disconnected from Mijia cloud service");
            Ok(())
        })
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    fn discover_devices(&self) -> AdapterFuture<'_, Vec<DeviceInfo>> {
        Box::pin(async move {
            let mut state = self.lock();
            if !state.connected {
                return Err(DeviceError::NotConnected);
            }
            let infos: Vec<DeviceInfo> = state.devices.iter().map(|d| d.info.clone()).collect();
            state.discovered = infos.iter().map(|d| d.device_id.clone()).collect();
            info!(
                "Discovered {} devices: {:?}",
                infos.len(),
                infos.iter().map(|d| d.name.as_str()).collect::<Vec<_>>()
            );
            Ok(infos)
        })
    }

    fn get_device_properties<'a>(
        &'a self,
        device_id: &'a str,
    ) -> AdapterFuture<'a, Vec<PropertyInfo>> {
        Box::pin(async move {
            self.with_device(device_id, |device| {
                Ok(device.properties.iter().map(|p| p.spec.clone()).collect())
            })
        })
    }

    fn get_device_actions<'a>(&'a self, device_id: &'a str) -> AdapterFuture<'a, Vec<ActionInfo>> {
        Box::pin(async move {
            self.with_device(device_id, |device| {
                Ok(device.actions.iter().map(|a| a.spec.clone()).collect())
            })
        })
    }

    fn get_property_value<'a>(
        &'a self,
        device_id: &'a str,
        siid: u32,
        piid: u32,
    ) -> AdapterFuture<'a, Value> {
        Box::pin(async move {
            self.with_device(device_id, |device| {
                Ok(device.property_mut(siid, piid)?.value.clone())
            })
        })
    }

    fn set_property_value<'a>(
        &'a self,
        device_id: &'a str,
        siid: u32,
        piid: u32,
        value: Value,
    ) -> AdapterFuture<'a, bool> {
        Box::pin(async move {
            self.with_device(device_id, |device| {
                let property = device.property_mut(siid, piid)?;
                if !property.spec.is_writable() {
                    warn!("Failed to set property {siid}:{piid} = {value} (device: {device_id}): read-only");
                    return Err(DeviceError::ReadOnly {
                        device_id: device_id.to_string(),
                        siid,
                        piid,
                    });
                }
                info!("Set property {siid}:{piid} = {value} (device: {device_id})");
                property.value = value;
                Ok(true)
            })
        })
    }

    fn call_action<'a>(
        &'a self,
        device_id: &'a str,
        siid: u32,
        aiid: u32,
        params: Vec<Value>,
    ) -> AdapterFuture<'a, Vec<Value>> {
        Box::pin(async move {
            self.with_device(device_id, |device| {
                let action = device.action(siid, aiid)?;
                let expected = action.spec.in_params.len();
                if params.len() != expected {
                    return Err(DeviceError::Api(format!(
                        "action {siid}:{aiid} expects {expected} params, got {}",
                        params.len()
                    )));
                }
                debug!("Action {siid}:{aiid} params: {params:?}");
                info!("Executed action {siid}:{aiid} (device: {device_id})");
                Ok(action.outputs.clone())
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = include_str!("../../fixtures/devices.yaml");

    fn sample_adapter() -> MemoryAdapter {
        MemoryAdapter::new(MijiaConfig::with_credentials("user", "pw"))
            .with_fixture(DeviceFixture::from_yaml_str(SAMPLE).unwrap())
    }

    async fn ready_adapter() -> MemoryAdapter {
        let adapter = sample_adapter();
        assert!(adapter.connect().await.unwrap());
        adapter.discover_devices().await.unwrap();
        adapter
    }

    #[test]
    fn sample_fixture_parses() {
        let fixture = DeviceFixture::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(fixture.devices.len(), 2);
        let lamp = &fixture.devices[0];
        assert_eq!(lamp.info.device_id, "lamp-001");
        assert_eq!(lamp.properties[0].spec.name, "on");
        assert_eq!(lamp.properties[1].value, json!(50));
        assert_eq!(fixture.devices[1].actions[0].outputs, vec![json!(100)]);
    }

    #[test]
    fn fixture_loads_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.json");
        std::fs::write(
            &path,
            r#"{"devices": [{"did": "plug-1", "name": "Plug", "model": "cuco.plug.v3"}]}"#,
        )
        .unwrap();
        let fixture = DeviceFixture::from_file(&path).unwrap();
        assert_eq!(fixture.devices[0].info.device_id, "plug-1");
        assert!(fixture.devices[0].properties.is_empty());
    }

    #[test]
    fn fixture_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DeviceFixture::from_file(dir.path().join("none.yaml")),
            Err(ConfigError::NotFound(_))
        ));

        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "devices: {not: [a list").unwrap();
        assert!(matches!(
            DeviceFixture::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn connect_requires_credentials() {
        let adapter = MemoryAdapter::new(MijiaConfig::default());
        assert!(!adapter.connect().await.unwrap());
        assert!(!adapter.is_connected());

        let adapter = MemoryAdapter::new(MijiaConfig::with_qr_login());
        assert!(adapter.connect().await.unwrap());
        assert!(adapter.is_connected());
    }

    #[tokio::test]
    async fn calls_fail_while_disconnected() {
        let adapter = sample_adapter();
        assert!(matches!(
            adapter.discover_devices().await,
            Err(DeviceError::NotConnected)
        ));
        assert!(matches!(
            adapter.get_property_value("lamp-001", 2, 1).await,
            Err(DeviceError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn devices_need_discovery() {
        let adapter = sample_adapter();
        adapter.connect().await.unwrap();
        assert!(matches!(
            adapter.get_device_properties("lamp-001").await,
            Err(DeviceError::DeviceNotFound(_))
        ));

        let devices = adapter.discover_devices().await.unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(adapter.device_count(), 2);
        assert_eq!(adapter.get_device_properties("lamp-001").await.unwrap().len(), 3);
        assert!(matches!(
            adapter.get_device_actions("ghost").await,
            Err(DeviceError::DeviceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn disconnect_clears_device_cache() {
        let adapter = ready_adapter().await;
        adapter.disconnect().await.unwrap();
        assert!(!adapter.is_connected());
        assert_eq!(adapter.device_count(), 0);
    }

    #[tokio::test]
    async fn writes_persist_and_respect_access() {
        let adapter = ready_adapter().await;

        assert!(adapter
            .set_property_value("lamp-001", 2, 2, json!(80))
            .await
            .unwrap());
        assert_eq!(
            adapter.get_property_value("lamp-001", 2, 2).await.unwrap(),
            json!(80)
        );

        assert!(matches!(
            adapter.set_property_value("purifier-002", 3, 4, json!(0)).await,
            Err(DeviceError::ReadOnly { .. })
        ));
        assert_eq!(
            adapter.get_property_value("purifier-002", 3, 4).await.unwrap(),
            json!(12)
        );
    }

    #[tokio::test]
    async fn unknown_property_fails() {
        let adapter = ready_adapter().await;
        let err = adapter.get_property_value("lamp-001", 9, 9).await.unwrap_err();
        assert_eq!(err.to_string(), "Property 9:9 not found on device lamp-001");
    }

    #[tokio::test]
    async fn actions_return_configured_outputs() {
        let adapter = ready_adapter().await;
        assert_eq!(
            adapter
                .call_action("purifier-002", 4, 1, vec![json!(1)])
                .await
                .unwrap(),
            vec![json!(100)]
        );
        assert!(adapter
            .call_action("lamp-001", 2, 1, vec![])
            .await
            .unwrap()
            .is_empty());

        assert!(matches!(
            adapter.call_action("purifier-002", 4, 1, vec![]).await,
            Err(DeviceError::Api(_))
        ));
        assert!(matches!(
            adapter.call_action("lamp-001", 5, 5, vec![]).await,
            Err(DeviceError::ActionNotFound { .. })
        ));
    }
}
