//! Demo server configuration module.
//!
//! This module loads the demo binary's configuration from environment
//! variables. The library itself reads no environment.
//!
//! # Environment Variables
//!
//! - `REQUEST_JWT_SECRET`: HS256 secret for the session instance (required)
//! - `REQUEST_JWT_ISSUER`: Issuer stamped on and required of session tokens (default: `request-jwt`)
//! - `REQUEST_JWT_LISTEN_PORT`: Port to listen on (default: `3000`)
//!
//! # Invariants
//!
//! - `secret` is never empty and never printed
//! - `listen_port` is always a valid port number

use thiserror::Error;

use crate::jwt::Secret;

const SECRET_VAR: &str = "REQUEST_JWT_SECRET";
const ISSUER_VAR: &str = "REQUEST_JWT_ISSUER";
const LISTEN_PORT_VAR: &str = "REQUEST_JWT_LISTEN_PORT";

/// Demo server configuration.
///
/// # Post-conditions
///
/// When constructed via `from_env()`:
/// - `secret` is non-empty
/// - `issuer` is non-empty
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Secret for the session instance.
    pub secret: Secret,
    /// Issuer for session tokens.
    pub issuer: String,
    /// Port to listen on.
    pub listen_port: u16,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerConfigError {
    /// An environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 3000;
    /// Default issuer.
    pub const DEFAULT_ISSUER: &'static str = "request-jwt";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `REQUEST_JWT_SECRET` is not set or is empty
    /// - `REQUEST_JWT_ISSUER` is set but empty
    /// - `REQUEST_JWT_LISTEN_PORT` is set but not a valid port number
    pub fn from_env() -> Result<Self, ServerConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ServerConfigError> {
        let secret = lookup(SECRET_VAR)
            .ok_or_else(|| ServerConfigError::MissingEnvVar(SECRET_VAR.to_string()))?;
        if secret.is_empty() {
            return Err(ServerConfigError::InvalidValue {
                name: SECRET_VAR.to_string(),
                message: "must not be empty".to_string(),
            });
        }

        let issuer = lookup(ISSUER_VAR).unwrap_or_else(|| Self::DEFAULT_ISSUER.to_string());
        if issuer.is_empty() {
            return Err(ServerConfigError::InvalidValue {
                name: ISSUER_VAR.to_string(),
                message: "must not be empty".to_string(),
            });
        }

        let listen_port = match lookup(LISTEN_PORT_VAR) {
            Some(value) => value
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or_else(|| ServerConfigError::InvalidValue {
                    name: LISTEN_PORT_VAR.to_string(),
                    message: format!("'{value}' is not a valid port number (must be 1-65535)"),
                })?,
            None => Self::DEFAULT_PORT,
        };

        Ok(Self {
            secret: Secret::from(secret),
            issuer,
            listen_port,
        })
    }
}
