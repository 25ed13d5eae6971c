//! Claim payloads and the precedence rules used to build them.
//!
//! A token payload is assembled from three layers, lowest precedence first:
//!
//! 1. instance defaults (`sub`, `iss`, `aud`, `exp`, `nbf`),
//! 2. the caller's payload,
//! 3. explicit per-call `ClaimOverrides`.
//!
//! `merge` folds the layers in order; a later layer replaces a claim set by an
//! earlier one. Time claims left as duration expressions by the payload layer
//! are then made absolute by `resolve_time_claim`.

use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

use super::duration::{self, DurationError};

/// A JWT claims set: claim name to JSON value.
pub type Claims = Map<String, Value>;

/// Registered claim names.
pub mod names {
    pub const SUBJECT: &str = "sub";
    pub const ISSUER: &str = "iss";
    pub const AUDIENCE: &str = "aud";
    pub const EXPIRES_AT: &str = "exp";
    pub const NOT_BEFORE: &str = "nbf";
    pub const ISSUED_AT: &str = "iat";
    pub const TOKEN_ID: &str = "jti";
}

/// The `aud` claim: a single recipient or a list of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    /// Every audience value, in order.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::One(value) => vec![value.as_str()],
            Self::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// Whether a token `aud` claim (a string or an array of strings) names at
    /// least one of these values.
    #[must_use]
    pub fn accepts(&self, claim: &Value) -> bool {
        let expected = self.values();
        match claim {
            Value::String(value) => expected.contains(&value.as_str()),
            Value::Array(values) => values
                .iter()
                .filter_map(Value::as_str)
                .any(|value| expected.contains(&value)),
            _ => false,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::One(value) => Value::from(value.as_str()),
            Self::Many(values) => Value::from(values.clone()),
        }
    }
}

impl From<&str> for Audience {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for Audience {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for Audience {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<&[&str]> for Audience {
    fn from(values: &[&str]) -> Self {
        Self::Many(values.iter().map(ToString::to_string).collect())
    }
}

/// When a time claim (`exp` or `nbf`) should fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Seconds relative to sign time. Negative values lie in the past.
    After(i64),
    /// An absolute NumericDate.
    At(i64),
    /// Leave the claim out of the token.
    Never,
}

impl Expiry {
    /// Parse a duration shorthand such as `"7d"` into a relative expiry.
    ///
    /// # Errors
    /// Returns a `DurationError` when the expression is malformed.
    pub fn parse(expression: &str) -> Result<Self, DurationError> {
        duration::parse(expression).map(Self::After)
    }

    /// The claim value this expiry takes for a token signed at `now`.
    #[must_use]
    pub const fn resolve(self, now: i64) -> Option<i64> {
        match self {
            Self::After(seconds) => Some(now.saturating_add(seconds)),
            Self::At(timestamp) => Some(timestamp),
            Self::Never => None,
        }
    }

    fn to_value(self, now: i64) -> Value {
        self.resolve(now).map_or(Value::Null, Value::from)
    }
}

impl FromStr for Expiry {
    type Err = DurationError;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        Self::parse(expression)
    }
}

/// Claims supplied alongside a payload that take precedence over it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimOverrides {
    pub sub: Option<String>,
    pub iss: Option<String>,
    pub aud: Option<Audience>,
    pub exp: Option<Expiry>,
    pub nbf: Option<Expiry>,
    pub jti: Option<String>,
}

impl ClaimOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sub(mut self, subject: impl Into<String>) -> Self {
        self.sub = Some(subject.into());
        self
    }

    #[must_use]
    pub fn iss(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    #[must_use]
    pub fn aud(mut self, audience: impl Into<Audience>) -> Self {
        self.aud = Some(audience.into());
        self
    }

    #[must_use]
    pub const fn exp(mut self, expiry: Expiry) -> Self {
        self.exp = Some(expiry);
        self
    }

    #[must_use]
    pub const fn nbf(mut self, not_before: Expiry) -> Self {
        self.nbf = Some(not_before);
        self
    }

    #[must_use]
    pub fn jti(mut self, token_id: impl Into<String>) -> Self {
        self.jti = Some(token_id.into());
        self
    }

    /// Render the overrides as a claims layer for a token signed at `now`.
    ///
    /// `Expiry::Never` becomes `null`, which removes the claim once resolved.
    #[must_use]
    pub fn to_claims(&self, now: i64) -> Claims {
        let mut claims = Claims::new();
        if let Some(sub) = &self.sub {
            claims.insert(names::SUBJECT.to_string(), Value::from(sub.as_str()));
        }
        if let Some(iss) = &self.iss {
            claims.insert(names::ISSUER.to_string(), Value::from(iss.as_str()));
        }
        if let Some(aud) = &self.aud {
            claims.insert(names::AUDIENCE.to_string(), aud.to_value());
        }
        if let Some(exp) = self.exp {
            claims.insert(names::EXPIRES_AT.to_string(), exp.to_value(now));
        }
        if let Some(nbf) = self.nbf {
            claims.insert(names::NOT_BEFORE.to_string(), nbf.to_value(now));
        }
        if let Some(jti) = &self.jti {
            claims.insert(names::TOKEN_ID.to_string(), Value::from(jti.as_str()));
        }
        claims
    }
}

/// Fold claim layers in order. Claims in later layers replace earlier ones.
#[must_use]
pub fn merge<'a, I>(layers: I) -> Claims
where
    I: IntoIterator<Item = &'a Claims>,
{
    let mut merged = Claims::new();
    for layer in layers {
        for (name, value) in layer {
            merged.insert(name.clone(), value.clone());
        }
    }
    merged
}

/// Error returned when a time claim cannot be turned into a NumericDate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeClaimError {
    #[error("claim '{claim}': {source}")]
    Duration {
        claim: &'static str,
        source: DurationError,
    },
    #[error("claim '{claim}' must be an integer timestamp or a duration expression")]
    WrongType { claim: &'static str },
}

/// Make a time claim absolute.
///
/// - a string is a duration expression relative to `now`,
/// - an integer is kept as an absolute timestamp,
/// - `null` removes the claim,
/// - anything else is rejected.
pub fn resolve_time_claim(
    claims: &mut Claims,
    claim: &'static str,
    now: i64,
) -> Result<(), TimeClaimError> {
    let resolved = match claims.get(claim) {
        None => return Ok(()),
        Some(Value::Null) => None,
        Some(Value::String(expression)) => {
            let seconds = duration::parse(expression)
                .map_err(|source| TimeClaimError::Duration { claim, source })?;
            Some(now.saturating_add(seconds))
        }
        Some(Value::Number(number)) => Some(
            number
                .as_i64()
                .ok_or(TimeClaimError::WrongType { claim })?,
        ),
        Some(_) => return Err(TimeClaimError::WrongType { claim }),
    };

    match resolved {
        Some(timestamp) => {
            claims.insert(claim.to_string(), Value::from(timestamp));
        }
        None => {
            claims.remove(claim);
        }
    }
    Ok(())
}

/// Read a NumericDate claim from a decoded token.
///
/// NumericDate may carry a fractional part, so the value is read as `f64`.
/// Returns `Ok(None)` when the claim is absent and `Err(())` when it is present
/// but not a number.
pub(crate) fn numeric_date(claims: &Claims, claim: &str) -> Result<Option<f64>, ()> {
    match claims.get(claim) {
        None => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or(()),
    }
}

/// `now` as a NumericDate, for comparison with `numeric_date` results.
#[allow(clippy::cast_precision_loss)]
pub(crate) const fn seconds(now: i64) -> f64 {
    now as f64
}
