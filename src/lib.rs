//! ReplCom Library
//!
//! Session manager for a single USB-attached serial device: connect,
//! exchange `\r\n`-delimited lines, and toggle the firmware REPL, with an
//! asynchronous command/event bridge for observers.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use crate::core::communication::{
    BridgeHandle, Command, Event, EventBridge, EventStream, LineSink, Transport, TransportEvent,
    TransportOpener,
};
pub use crate::core::session::{ConnectionState, SessionManager};
pub use crate::domain::config::{LinkSettings, ReplComConfig};
pub use crate::domain::error::{ReplComError, ReplComResult};
pub use crate::infrastructure::serial::{DeviceEnumerator, SerialPortEnumerator, SerialTransportOpener};
