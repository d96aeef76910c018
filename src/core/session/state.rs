use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// Connection state of the session manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionState {
    /// No session is open
    Disconnected,
    /// A session is open on `device_name` since `connected_at`
    Connected {
        device_name: String,
        connected_at: SystemTime,
    },
}

impl ConnectionState {
    /// Connected state for a device, stamped now
    pub fn connected(device_name: impl Into<String>) -> Self {
        ConnectionState::Connected {
            device_name: device_name.into(),
            connected_at: SystemTime::now(),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }

    pub fn device_name(&self) -> Option<&str> {
        match self {
            ConnectionState::Connected { device_name, .. } => Some(device_name),
            ConnectionState::Disconnected => None,
        }
    }

    /// Time since connect, zero when disconnected or when the clock went backwards
    pub fn uptime(&self) -> Duration {
        match self {
            ConnectionState::Connected { connected_at, .. } => {
                SystemTime::now().duration_since(*connected_at).unwrap_or_default()
            }
            ConnectionState::Disconnected => Duration::ZERO,
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Disconnected
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connected { device_name, .. } => {
                write!(f, "Connected to {}", device_name)
            }
        }
    }
}
