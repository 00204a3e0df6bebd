//! Error types for the monitor workspace.

use thiserror::Error;

/// Monitor error type.
///
/// Everything except [`Error::Booking`] is a configuration-time failure:
/// it is raised before the first run starts and leaves no partial state.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Invalid or missing configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed histogram binning
    #[error("binning error: {0}")]
    Binning(String),

    /// Selection expression failed to compile
    #[error("expression error: {0}")]
    Expression(String),

    /// Histogram handle used against a registry that never booked it
    #[error("booking error: {0}")]
    Booking(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
