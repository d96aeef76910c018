use crate::cli::args::OutputFormat;
use crate::core::communication::Event;
use crate::core::session::ConnectionState;
use crate::domain::config::ReplComConfig;
use std::io;
use tabled::{Table, Tabled};

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_event(&self, event: &Event) -> Result<(), OutputError>;
    fn write_status(&self, state: &ConnectionState) -> Result<(), OutputError>;
    fn write_devices(&self, devices: &[String]) -> Result<(), OutputError>;
    fn write_config(&self, config: &ReplComConfig) -> Result<(), OutputError>;
    fn write_message(&self, message: &str) -> Result<(), OutputError>;
    fn write_error(&self, error: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("TOML serialization error: {0}")]
    TomlError(#[from] toml::ser::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::ReplComError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Console output writer
pub struct ConsoleWriter {
    format: OutputFormat,
}

#[derive(Tabled)]
struct DeviceTableRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Device")]
    path: String,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Uptime (s)")]
    uptime_secs: u64,
}

impl From<&ConnectionState> for StatusTableRow {
    fn from(state: &ConnectionState) -> Self {
        Self {
            status: if state.is_connected() { "connected" } else { "disconnected" }.to_string(),
            device: state.device_name().unwrap_or("-").to_string(),
            uptime_secs: state.uptime().as_secs(),
        }
    }
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// Render an event as one line of text
pub fn render_event_text(event: &Event) -> String {
    match event {
        Event::TerminalData(line) => line.clone(),
        Event::CheckConnected(state) => format!("[status] {}", state),
        Event::SendUsbDevices(devices) if devices.is_empty() => {
            "[devices] none found".to_string()
        }
        Event::SendUsbDevices(devices) => format!("[devices]\n{}", devices),
    }
}

impl OutputWriter for ConsoleWriter {
    fn write_event(&self, event: &Event) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(event)?),
            OutputFormat::Text | OutputFormat::Table => println!("{}", render_event_text(event)),
        }
        Ok(())
    }

    fn write_status(&self, state: &ConnectionState) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => println!("{}", state),
            OutputFormat::Json => println!("{}", serde_json::to_string(state)?),
            OutputFormat::Table => println!("{}", Table::new(vec![StatusTableRow::from(state)])),
        }
        Ok(())
    }

    fn write_devices(&self, devices: &[String]) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                if devices.is_empty() {
                    println!("No USB serial devices found");
                }
                for device in devices {
                    println!("{}", device);
                }
            }
            OutputFormat::Json => println!("{}", serde_json::to_string(devices)?),
            OutputFormat::Table => {
                let rows: Vec<DeviceTableRow> = devices
                    .iter()
                    .enumerate()
                    .map(|(index, path)| DeviceTableRow {
                        index,
                        path: path.clone(),
                    })
                    .collect();
                println!("{}", Table::new(rows));
            }
        }
        Ok(())
    }

    fn write_config(&self, config: &ReplComConfig) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
            OutputFormat::Text | OutputFormat::Table => {
                print!("{}", toml::to_string_pretty(config)?);
            }
        }
        Ok(())
    }

    fn write_message(&self, message: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "message": message,
                    "level": "info"
                });
                println!("{}", serde_json::to_string(&output)?);
            }
            _ => {
                println!("{}", message);
            }
        }
        Ok(())
    }

    fn write_error(&self, error: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "error": error,
                    "level": "error"
                });
                eprintln!("{}", serde_json::to_string(&output)?);
            }
            _ => {
                eprintln!("Error: {}", error);
            }
        }
        Ok(())
    }
}
