//! HTTP Basic Authentication gate
//!
//! Checks the raw Authorization header against the credential pair loaded
//! at startup. Pure verdicts only; the HTTP boundary turns every rejection
//! into a 401.

use crate::error::AuthError;
use crate::store::Credentials;
use base64::{engine::general_purpose::STANDARD, Engine};

/// Gate holding the process credentials
#[derive(Debug)]
pub struct AuthGate {
    credentials: Credentials,
}

impl AuthGate {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Validate a raw Authorization header value.
    ///
    /// The "Basic " scheme prefix is stripped when present; a bare base64
    /// token still authenticates, which long-standing clients depend on.
    /// The decoded payload must be exactly one `username:password` pair,
    /// and the match is case-sensitive on both sides.
    pub fn authenticate(&self, header: Option<&str>) -> Result<(), AuthError> {
        let header = match header {
            Some(value) if !value.is_empty() => value,
            _ => return Err(AuthError::MissingHeader),
        };

        let token = header.strip_prefix("Basic ").unwrap_or(header);
        let decoded = STANDARD
            .decode(token)
            .map_err(|_| AuthError::MalformedHeader)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedHeader)?;

        let mut parts = decoded.split(':');
        let (username, password) = match (parts.next(), parts.next(), parts.next()) {
            (Some(username), Some(password), None) => (username, password),
            _ => return Err(AuthError::MalformedHeader),
        };

        if username != self.credentials.username || password != self.credentials.password {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(())
    }
}
