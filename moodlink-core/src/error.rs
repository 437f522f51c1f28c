//! Error types for the Moodlink core library.

use thiserror::Error;

/// Top-level error type for all sensing-side operations.
#[derive(Error, Debug)]
pub enum MoodError {
    /// No capture backend could open the configured device and deliver a frame.
    #[error("Camera {device_index} unavailable (tried backends: {})", attempted.join(", "))]
    DeviceUnavailable {
        /// The device index that was requested.
        device_index: u32,
        /// Names of the backends that were attempted, in order.
        attempted: Vec<String>,
    },

    /// Classifier or face-locator assets are missing or corrupt.
    #[error("Failed to load sensing resources: {0}")]
    ResourceLoad(String),

    /// A single frame read (or per-frame processing step) failed.
    #[error("Capture error: {0}")]
    Capture(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, MoodError>;
