use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatcastError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatcastError {
    /// Short error code string sent to clients in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ChatcastError::Config(_) => "CONFIG_ERROR",
            ChatcastError::InvalidAddress(_) => "INVALID_ADDRESS",
            ChatcastError::Serialization(_) => "SERIALIZATION_ERROR",
            ChatcastError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatcastError>;
