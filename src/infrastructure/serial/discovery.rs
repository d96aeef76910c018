use crate::domain::{
    config::DiscoveryConfig,
    error::{ReplComError, ReplComResult},
};
use async_trait::async_trait;
use serialport::{SerialPortInfo, SerialPortType};
use tracing::debug;

/// Lists device paths an operator can connect to
#[async_trait]
pub trait DeviceEnumerator: Send + Sync {
    async fn list_devices(&self) -> ReplComResult<Vec<String>>;
}

/// A port reported by the operating system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPort {
    pub path: String,
    pub usb: bool,
}

impl From<SerialPortInfo> for DiscoveredPort {
    fn from(info: SerialPortInfo) -> Self {
        Self {
            usb: matches!(info.port_type, SerialPortType::UsbPort(_)),
            path: info.port_name,
        }
    }
}

/// Enumerates ports through the operating system's serial port listing
#[derive(Debug, Clone, Default)]
pub struct SerialPortEnumerator {
    config: DiscoveryConfig,
}

impl SerialPortEnumerator {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DeviceEnumerator for SerialPortEnumerator {
    async fn list_devices(&self) -> ReplComResult<Vec<String>> {
        let ports = tokio::task::spawn_blocking(serialport::available_ports)
            .await
            .map_err(|e| ReplComError::Discovery(format!("Port enumeration task failed: {}", e)))??;

        let devices = filter_ports(ports.into_iter().map(DiscoveredPort::from), &self.config);
        debug!("Discovered {} serial devices", devices.len());
        Ok(devices)
    }
}

/// Apply the discovery filters, keeping a stable sorted order
pub fn filter_ports(
    ports: impl IntoIterator<Item = DiscoveredPort>,
    config: &DiscoveryConfig,
) -> Vec<String> {
    let mut devices: Vec<String> = ports
        .into_iter()
        .filter(|port| !config.usb_only || port.usb)
        .filter(|port| match &config.port_prefix {
            Some(prefix) => port.path.starts_with(prefix.as_str()),
            None => true,
        })
        .map(|port| port.path)
        .collect();
    devices.sort();
    devices.dedup();
    devices
}

/// Render a device list the way observers receive it: one path per line
pub fn format_device_list(devices: &[String]) -> String {
    devices.join("\n")
}
