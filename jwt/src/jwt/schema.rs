//! Payload shape contracts.
//!
//! A `PayloadSchema` is checked against the merged payload before a token is
//! signed, and against the decoded claims after a token is verified. Any
//! validator can sit behind the trait; `ObjectSchema` covers the common case of
//! "these claims must exist with these JSON types".

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use super::claims::Claims;

/// A shape contract for claims payloads.
pub trait PayloadSchema: fmt::Debug + Send + Sync {
    /// Check that `claims` conforms to this schema.
    ///
    /// # Errors
    /// Returns the first violation found.
    fn validate(&self, claims: &Claims) -> Result<(), SchemaViolation>;
}

/// Why a payload does not conform to a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("missing required claim '{0}'")]
    Missing(String),
    #[error("claim '{claim}' must be {expected}")]
    WrongType { claim: String, expected: ClaimType },
}

/// JSON type expected of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    /// Any JSON value, including `null`.
    Any,
}

impl ClaimType {
    /// Whether `value` has this type.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "a string",
            Self::Number => "a number",
            Self::Integer => "an integer",
            Self::Boolean => "a boolean",
            Self::Array => "an array",
            Self::Object => "an object",
            Self::Any => "any value",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    name: String,
    kind: ClaimType,
    required: bool,
}

/// Schema over the top-level claims of a payload.
///
/// Claims the schema does not mention are allowed.
///
/// ```
/// use request_jwt::jwt::{ClaimType, ObjectSchema};
///
/// let schema = ObjectSchema::new()
///     .required("name", ClaimType::String)
///     .optional("role", ClaimType::String);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectSchema {
    fields: Vec<Field>,
}

impl ObjectSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `name` to be present with type `kind`.
    #[must_use]
    pub fn required(self, name: impl Into<String>, kind: ClaimType) -> Self {
        self.field(name.into(), kind, true)
    }

    /// If `name` is present, it must have type `kind`.
    #[must_use]
    pub fn optional(self, name: impl Into<String>, kind: ClaimType) -> Self {
        self.field(name.into(), kind, false)
    }

    fn field(mut self, name: String, kind: ClaimType, required: bool) -> Self {
        self.fields.retain(|field| field.name != name);
        self.fields.push(Field {
            name,
            kind,
            required,
        });
        self
    }
}

impl PayloadSchema for ObjectSchema {
    fn validate(&self, claims: &Claims) -> Result<(), SchemaViolation> {
        for field in &self.fields {
            match claims.get(&field.name) {
                None if field.required => {
                    return Err(SchemaViolation::Missing(field.name.clone()));
                }
                None => {}
                Some(value) if !field.kind.matches(value) => {
                    return Err(SchemaViolation::WrongType {
                        claim: field.name.clone(),
                        expected: field.kind,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
