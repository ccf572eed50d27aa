//! Error types for Docuchat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Docuchat operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, credential handling, attachment validation,
/// file uploads, and chat turns against the remote model.
#[derive(Error, Debug)]
pub enum DocuchatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No credential is available; the send was blocked before the network
    #[error("No API credential configured")]
    CredentialRequired,

    /// Authentication errors (e.g., 401 Unauthorized); invalidates the stored credential
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Client-side validation errors (disallowed file types, unknown prompt ids)
    #[error("Validation error: {0}")]
    Validation(String),

    /// File upload errors (initiation or transfer failure)
    #[error("Upload error: {0}")]
    Upload(String),

    /// Remote model gateway errors (non-success chat or count responses)
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Streaming response errors (malformed or interrupted stream)
    #[error("Stream error: {0}")]
    Stream(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for Docuchat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
