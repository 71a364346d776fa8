use std::io::Error as IoError;

use thiserror::Error;

/// Failure to turn a stored or transported record back into a `LogEntry`.
#[derive(Debug, Error)]
pub enum LogDecodeError {
    #[error("Invalid log record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by `LogRepository` implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0:#}")]
    Io(#[from] IoError),

    #[error("Failed to serialize log entry: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    Decode(#[from] LogDecodeError),

    #[error("Database query failed: {0}")]
    Database(#[from] libsql::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),
}

/// Errors raised by the HTTP checker.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Errors raised while delivering email.
///
/// The rendered text is what ends up in the error log entry: transport failures carry
/// the `Error: ` prefix, plain messages are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("Error: {0}")]
    Transport(String),

    #[error("{0}")]
    Message(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadFailed(#[source] IoError),

    #[error("Failed to write config: {0}")]
    WriteFailed(#[source] IoError),

    #[error("Failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),

    #[error("No config path available (set XDG_CONFIG_HOME or HOME)")]
    ConfigPathUnavailable,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
