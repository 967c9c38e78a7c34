//! # Error Types
//!
//! Custom error types for the EnOcean bridge using `thiserror`.

use thiserror::Error;

/// Main error type for the EnOcean bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Serial port errors
    #[error("serial error: {0}")]
    Serial(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Collector delivery errors
    #[error("collector error: {0}")]
    Collector(#[from] reqwest::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the EnOcean bridge
pub type Result<T> = std::result::Result<T, BridgeError>;
