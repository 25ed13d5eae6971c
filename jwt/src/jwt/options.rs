//! Instance configuration for JWT signing and verification.
//!
//! # Pre-conditions
//! - `name` must be a non-empty identifier.
//! - `secret` must be non-empty key material.
//! - Duration expressions given for `exp` and `nbf` must parse.
//!
//! # Post-conditions
//! - `JwtOptions` are consumed by `Jwt::new` and immutable afterwards.
//!
//! # Invariants
//! - The secret never appears in `Debug` output or error messages.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::claims::{Audience, Expiry};
use super::duration::DurationError;
use super::schema::PayloadSchema;
use super::time::{SystemTimeSource, TimeSource};

/// Expiration applied when an instance does not configure one.
pub const DEFAULT_EXPIRY: Expiry = Expiry::After(60 * 60);

/// Error returned when an instance configuration is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The context name is empty.
    #[error("instance name must not be empty")]
    EmptyName,
    /// The signing secret is empty.
    #[error("HS256 secret must not be empty")]
    EmptySecret,
    /// A default time claim is not a valid duration expression.
    #[error("invalid default '{claim}': {source}")]
    InvalidDuration {
        claim: &'static str,
        source: DurationError,
    },
}

/// Symmetric key material for HMAC-SHA256.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl From<&[u8]> for Secret {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl From<Vec<u8>> for Secret {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

/// A default time claim as given to the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TimeSetting {
    Expression(String),
    Fixed(Expiry),
}

impl TimeSetting {
    fn resolve(&self, claim: &'static str) -> Result<Expiry, ConfigError> {
        match self {
            Self::Expression(expression) => Expiry::parse(expression)
                .map_err(|source| ConfigError::InvalidDuration { claim, source }),
            Self::Fixed(expiry) => Ok(*expiry),
        }
    }
}

/// Builder for a `Jwt` instance.
///
/// ```
/// use request_jwt::jwt::{Jwt, JwtOptions};
///
/// let jwt = Jwt::new(
///     JwtOptions::new("jwt", "secret")
///         .sub("auth")
///         .iss("example.com")
///         .exp("7d"),
/// )
/// .expect("valid options");
/// assert_eq!(jwt.name(), "jwt");
/// ```
#[derive(Debug, Clone)]
pub struct JwtOptions {
    pub(crate) name: String,
    pub(crate) secret: Secret,
    pub(crate) sub: Option<String>,
    pub(crate) iss: Option<String>,
    pub(crate) aud: Option<Audience>,
    exp: Option<TimeSetting>,
    nbf: Option<TimeSetting>,
    pub(crate) iat: bool,
    pub(crate) schema: Option<Arc<dyn PayloadSchema>>,
    pub(crate) clock: Arc<dyn TimeSource>,
}

impl JwtOptions {
    /// Start a configuration with the required context name and secret.
    pub fn new(name: impl Into<String>, secret: impl Into<Secret>) -> Self {
        Self {
            name: name.into(),
            secret: secret.into(),
            sub: None,
            iss: None,
            aud: None,
            exp: None,
            nbf: None,
            iat: true,
            schema: None,
            clock: Arc::new(SystemTimeSource),
        }
    }

    /// Default `sub` claim.
    #[must_use]
    pub fn sub(mut self, subject: impl Into<String>) -> Self {
        self.sub = Some(subject.into());
        self
    }

    /// Default `iss` claim, also required of verified tokens.
    #[must_use]
    pub fn iss(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    /// Default `aud` claim, also required of verified tokens.
    #[must_use]
    pub fn aud(mut self, audience: impl Into<Audience>) -> Self {
        self.aud = Some(audience.into());
        self
    }

    /// Default expiration as a duration expression such as `"7d"`.
    ///
    /// The expression is checked by `Jwt::new`.
    #[must_use]
    pub fn exp(mut self, expression: impl Into<String>) -> Self {
        self.exp = Some(TimeSetting::Expression(expression.into()));
        self
    }

    /// Default expiration as a typed `Expiry`.
    #[must_use]
    pub fn expiry(mut self, expiry: Expiry) -> Self {
        self.exp = Some(TimeSetting::Fixed(expiry));
        self
    }

    /// Default not-before as a duration expression such as `"5m"`.
    #[must_use]
    pub fn nbf(mut self, expression: impl Into<String>) -> Self {
        self.nbf = Some(TimeSetting::Expression(expression.into()));
        self
    }

    /// Default not-before as a typed `Expiry`.
    #[must_use]
    pub fn not_before(mut self, not_before: Expiry) -> Self {
        self.nbf = Some(TimeSetting::Fixed(not_before));
        self
    }

    /// Whether `sign` stamps `iat`. Enabled by default.
    #[must_use]
    pub const fn iat(mut self, enabled: bool) -> Self {
        self.iat = enabled;
        self
    }

    /// Shape contract enforced on signed and verified payloads.
    #[must_use]
    pub fn schema(mut self, schema: impl PayloadSchema + 'static) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    /// Clock used for `iat`, relative expirations and temporal checks.
    #[must_use]
    pub fn clock(mut self, clock: impl TimeSource + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Check the required fields and resolve the default time claims.
    ///
    /// # Post-conditions
    /// - Returns the default `exp` (one hour unless configured) and `nbf`.
    pub(crate) fn validate(&self) -> Result<(Expiry, Option<Expiry>), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }

        let exp = self
            .exp
            .as_ref()
            .map(|setting| setting.resolve("exp"))
            .transpose()?
            .unwrap_or(DEFAULT_EXPIRY);
        let nbf = self
            .nbf
            .as_ref()
            .map(|setting| setting.resolve("nbf"))
            .transpose()?;

        Ok((exp, nbf))
    }
}
