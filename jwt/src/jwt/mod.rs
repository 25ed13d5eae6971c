//! JWT signing and verification.
//!
//! This module provides named HS256 instances that sign claim payloads under a
//! default claim policy and verify presented tokens.
//!
//! # Pre-conditions
//! - Every instance is configured with a non-empty name and secret.
//!
//! # Post-conditions
//! - Instance configuration is immutable once built.
//!
//! # Invariants
//! - Verification never reports why a token was rejected.

pub mod claims;
pub mod duration;
pub mod instance;
pub mod options;
pub mod schema;
pub mod time;

pub use claims::{Audience, ClaimOverrides, Claims, Expiry};
pub use instance::{Jwt, SignError, Verification, VerifyError};
pub use options::{ConfigError, DEFAULT_EXPIRY, JwtOptions, Secret};
pub use schema::{ClaimType, ObjectSchema, PayloadSchema, SchemaViolation};
pub use time::{FixedTimeSource, SystemTimeSource, TimeSource};
