//! Error types for morsh.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MorshError {
    // Configuration errors
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // DSP errors
    #[error("FFT input length must be a power of two, got {len}")]
    FftLengthNotPowerOfTwo { len: usize },

    #[error("Invalid audio block: {message}")]
    InvalidBlock { message: String },

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio format mismatch: expected {expected}, got {actual}")]
    AudioFormatMismatch { expected: String, actual: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl MorshError {
    /// Shorthand for [`MorshError::ConfigInvalidValue`].
    pub fn invalid_value(key: &str, message: impl Into<String>) -> Self {
        MorshError::ConfigInvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, MorshError>;
