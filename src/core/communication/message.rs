use crate::core::session::state::ConnectionState;
use serde::{Deserialize, Serialize};

/// Inbound command, observer to session manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "payload", rename_all = "kebab-case")]
pub enum Command {
    /// Open a session on the given device path
    ConnectDevice(String),
    DisconnectDevice,
    /// Send one line of text to the device
    SendCommand(String),
    EnterRepl,
    ExitRepl,
    CheckConnected,
    GetUsbDevices,
}

/// Outbound event, session manager to observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum Event {
    /// One line received from the device
    TerminalData(String),
    /// Reply to `check-connected`
    CheckConnected(ConnectionState),
    /// Newline-separated device paths, reply to `get-usb-devices`
    SendUsbDevices(String),
}

impl Command {
    /// Wire name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Command::ConnectDevice(_) => "connect-device",
            Command::DisconnectDevice => "disconnect-device",
            Command::SendCommand(_) => "send-command",
            Command::EnterRepl => "enter-repl",
            Command::ExitRepl => "exit-repl",
            Command::CheckConnected => "check-connected",
            Command::GetUsbDevices => "get-usb-devices",
        }
    }
}

impl Event {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Event::TerminalData(_) => "terminal-data",
            Event::CheckConnected(_) => "check-connected",
            Event::SendUsbDevices(_) => "send-usb-devices",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
