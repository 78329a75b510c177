//! Error types for message-bridge

use std::path::PathBuf;
use thiserror::Error;

/// Rejection kinds for HTTP Basic Authentication.
///
/// Every kind maps to a 401 at the boundary; the distinction exists for
/// diagnostics. The `Display` text is the exact body the boundary returns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header is missing")]
    MissingHeader,

    #[error("Invalid Authorization header")]
    MalformedHeader,

    #[error("Invalid username or password")]
    InvalidCredentials,
}

/// Request validation failures, mapped to 400 at the boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("not a number")]
    NonNumericRecipient,

    #[error("invalid request body: {0}")]
    MalformedRequestBody(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("required file missing: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("malformed file {}: {}", .path.display(), .reason)]
    MalformedFile { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            AuthError::MissingHeader.to_string(),
            "Authorization header is missing"
        );
        assert_eq!(
            AuthError::MalformedHeader.to_string(),
            "Invalid Authorization header"
        );
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid username or password"
        );
    }

    #[test]
    fn test_validation_error_display() {
        assert_eq!(
            ValidationError::NonNumericRecipient.to_string(),
            "not a number"
        );
    }

    #[test]
    fn test_missing_file_display() {
        let err = Error::MissingFile(PathBuf::from("/tmp/credentials.json"));
        assert!(err.to_string().contains("credentials.json"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_transport_error_is_bare_text() {
        // The 500 body carries the transport's own text, unprefixed
        let err = Error::Transport("connection reset".to_string());
        assert_eq!(err.to_string(), "connection reset");
    }
}
