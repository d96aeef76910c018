// Serial module - Serial port transport and device discovery
pub mod client;
pub mod discovery;
pub mod line_parser;

pub use client::{SerialTransport, SerialTransportOpener};
pub use discovery::{DeviceEnumerator, SerialPortEnumerator};
pub use line_parser::{LineParser, LINE_DELIMITER};
