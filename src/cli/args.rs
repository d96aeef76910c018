use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Command line arguments for ReplCom
#[derive(Parser, Debug)]
#[command(
    name = "replcom",
    version = env!("CARGO_PKG_VERSION"),
    about = "Serial session manager for USB-attached REPL devices",
    long_about = "Connects to a USB serial device at 9600 8-N-1, exchanges CRLF-terminated lines and switches the firmware between command mode and its REPL."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List connectable USB serial devices
    Devices,
    /// Open an interactive session with a device
    Connect(ConnectArgs),
    /// Configuration management commands
    Config(ConfigArgs),
    /// Display version information
    Version,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// One JSON document per line
    Json,
    /// Table output
    Table,
}

/// Interactive session arguments
#[derive(ClapArgs, Debug)]
pub struct ConnectArgs {
    /// Serial device path, e.g. /dev/tty.usbmodem1101
    pub device: String,

    /// Enter the REPL right after connecting
    #[arg(long)]
    pub repl: bool,
}

/// Configuration management arguments
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Create a default project configuration
    Init {
        /// Directory to create `.replcom/config.toml` in
        #[arg(short, long)]
        path: Option<String>,
    },
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}
