//! Error types for SpandaIO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// SpandaIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No supported motion device was detected at initialization
    #[error("no motion device detected")]
    NoDeviceDetected,

    /// Sensor handle does not map to any known channel
    #[error("invalid sensor handle: {0}")]
    InvalidHandle(i32),

    /// Invalid parameter
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration parse error
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration encode error
    #[error("config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
