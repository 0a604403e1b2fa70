//! Error types for ExtHost
//!
//! This module defines all error types used throughout the extension host.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use thiserror::Error;

/// The primary error type for ExtHost operations.
#[derive(Error, Debug)]
pub enum ExtHostError {
    /// Configuration-related errors (invalid config, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Manifest errors (missing manifest resource, missing required keys,
    /// malformed key/value text, invalid field values)
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Instantiation errors (archive cannot be opened, entry point not
    /// found, constructor returned nothing)
    #[error("Instantiation error: {0}")]
    Instantiation(String),

    /// Extension contract violations (missing or mismatched ABI version)
    #[error("Extension contract violation: {0}")]
    Contract(String),

    /// A lifecycle hook raised an error
    #[error("Lifecycle hook failed: {0}")]
    Hook(String),

    /// Resource not found (extensions, archives, factories, etc.)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for ExtHost operations.
pub type Result<T> = std::result::Result<T, ExtHostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtHostError::Manifest("missing 'entry-point' key".to_string());
        assert_eq!(err.to_string(), "Manifest error: missing 'entry-point' key");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let host_err: ExtHostError = io_err.into();
        assert!(matches!(host_err, ExtHostError::Io(_)));
    }

    #[test]
    fn test_result_type() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }

    #[test]
    fn test_error_variants() {
        // Ensure all variants can be created
        let _ = ExtHostError::Config("test".into());
        let _ = ExtHostError::Manifest("test".into());
        let _ = ExtHostError::Instantiation("test".into());
        let _ = ExtHostError::Contract("test".into());
        let _ = ExtHostError::Hook("test".into());
        let _ = ExtHostError::NotFound("test".into());
    }

    #[test]
    fn test_contract_display() {
        let err = ExtHostError::Contract("ABI version 3 does not match host version 1".to_string());
        assert_eq!(
            err.to_string(),
            "Extension contract violation: ABI version 3 does not match host version 1"
        );
    }
}
