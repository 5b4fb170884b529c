use thiserror::Error;

/// Error type for sensor lifecycle and subscription operations
#[derive(Debug, Error)]
pub enum SensorError {
    /// The platform exposes no device-orientation API
    #[error("device orientation is not supported on this platform")]
    Unsupported,

    /// The user declined the sensor permission prompt, or tracking was
    /// requested before permission resolved
    #[error("sensor permission denied")]
    PermissionDenied,

    /// The sensor manager was shut down; construct a new one to continue
    #[error("sensor manager has been shut down")]
    ShutDown,
}

/// Result type for sensor operations
pub type SensorResult<T> = Result<T, SensorError>;

/// Error type for scene-anchor sidecar loading
#[derive(Debug, Error)]
pub enum AnchorError {
    #[error("failed to read anchor sidecar: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse anchor sidecar: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("anchor rejected: {0}")]
    Invalid(String),
}

/// Error type for configuration persistence
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("configuration I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
