use thiserror::Error;

/// ReplCom unified error type
#[derive(Error, Debug)]
pub enum ReplComError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Device discovery error: {0}")]
    Discovery(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl ReplComError {
    /// Resource errors leave the manager disconnected; everything else is a diagnostic.
    pub fn is_resource_error(&self) -> bool {
        matches!(self, ReplComError::Serial(_) | ReplComError::Io(_))
    }
}

pub type ReplComResult<T> = Result<T, ReplComError>;
