use serde::{Deserialize, Serialize};
use std::time::Duration;

/// ReplCom configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplComConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Device discovery configuration
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Number of events buffered per observer before the oldest are dropped
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// Device discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Only report USB-attached ports
    #[serde(default = "default_usb_only")]
    pub usb_only: bool,
    /// Only report ports whose path starts with this prefix
    #[serde(default)]
    pub port_prefix: Option<String>,
}

/// Serial line settings used for every session.
///
/// The target firmware speaks 9600 8-N-1 without flow control, so these are
/// constants rather than configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSettings {
    pub baud_rate: u32,
    pub data_bits: serialport::DataBits,
    pub parity: serialport::Parity,
    pub stop_bits: serialport::StopBits,
    pub flow_control: serialport::FlowControl,
    /// Read timeout of the background reader; bounds how long close takes to be noticed
    pub read_timeout: Duration,
}

impl LinkSettings {
    pub const FIXED: LinkSettings = LinkSettings {
        baud_rate: 9600,
        data_bits: serialport::DataBits::Eight,
        parity: serialport::Parity::None,
        stop_bits: serialport::StopBits::One,
        flow_control: serialport::FlowControl::None,
        read_timeout: Duration::from_millis(100),
    };
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self::FIXED
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_capacity() -> usize {
    256
}

fn default_usb_only() -> bool {
    true
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            usb_only: default_usb_only(),
            port_prefix: None,
        }
    }
}
