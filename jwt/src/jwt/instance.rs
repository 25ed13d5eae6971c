//! Named JWT instances.
//!
//! A `Jwt` is built once from `JwtOptions` and then signs and verifies HS256
//! tokens for the lifetime of the application.
//!
//! # Pre-conditions
//! - The options passed to `Jwt::new` carry a non-empty name and secret.
//!
//! # Post-conditions
//! - `sign` returns a compact `header.payload.signature` token.
//! - `verify` returns `Verification::Valid` with every decoded claim, or
//!   `Verification::Invalid` without saying which check failed.
//!
//! # Invariants
//! - Signing and verification never mutate the instance.
//! - Routine verification failures are never reported as `Err`.

use std::fmt;
use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::claims::{self, Audience, ClaimOverrides, Claims, Expiry, TimeClaimError, names};
use super::options::{ConfigError, JwtOptions};
use super::schema::{PayloadSchema, SchemaViolation};
use super::time::TimeSource;

/// Error returned when a token cannot be signed.
#[derive(Debug, Error)]
pub enum SignError {
    /// The merged payload does not conform to the configured schema.
    #[error("payload does not match schema: {0}")]
    Schema(#[from] SchemaViolation),
    /// An `exp`, `nbf` or `iat` claim has an unusable value.
    #[error("invalid time claim: {0}")]
    TimeClaim(#[from] TimeClaimError),
    /// The merged `iss` or `aud` differs from the one this instance
    /// requires, so the token would not verify here.
    #[error("claim '{claim}' conflicts with the configured value")]
    ClaimConflict { claim: &'static str },
    /// The JWS backend failed to produce a token.
    #[error("failed to encode token: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// Error returned when verification hits a fault unrelated to the token.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("internal verification fault: {0}")]
    Internal(String),
}

/// Outcome of verifying a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The token is authentic and current; carries every decoded claim.
    Valid(Claims),
    /// The token was rejected.
    Invalid,
}

impl Verification {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    #[must_use]
    pub const fn claims(&self) -> Option<&Claims> {
        match self {
            Self::Valid(claims) => Some(claims),
            Self::Invalid => None,
        }
    }

    #[must_use]
    pub fn into_claims(self) -> Option<Claims> {
        match self {
            Self::Valid(claims) => Some(claims),
            Self::Invalid => None,
        }
    }
}

struct Inner {
    name: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    defaults: DefaultClaims,
    iat: bool,
    schema: Option<Arc<dyn PayloadSchema>>,
    clock: Arc<dyn TimeSource>,
}

/// Instance defaults, the lowest-precedence claims layer.
struct DefaultClaims {
    sub: Option<String>,
    iss: Option<String>,
    aud: Option<Audience>,
    exp: Expiry,
    nbf: Option<Expiry>,
}

impl DefaultClaims {
    fn to_claims(&self, now: i64) -> Claims {
        ClaimOverrides {
            sub: self.sub.clone(),
            iss: self.iss.clone(),
            aud: self.aud.clone(),
            exp: Some(self.exp),
            nbf: self.nbf,
            jti: None,
        }
        .to_claims(now)
    }
}

/// A named, immutable JWT signer/verifier.
///
/// Cloning is cheap; clones share the same configuration.
#[derive(Clone)]
pub struct Jwt {
    inner: Arc<Inner>,
}

impl fmt::Debug for Jwt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jwt")
            .field("name", &self.inner.name)
            .field("iat", &self.inner.iat)
            .finish_non_exhaustive()
    }
}

impl Jwt {
    /// Build an instance from its options.
    ///
    /// # Errors
    /// Returns `ConfigError` when the name or secret is empty, or a default
    /// duration expression does not parse.
    pub fn new(options: JwtOptions) -> Result<Self, ConfigError> {
        let (exp, nbf) = options.validate()?;

        let mut validation = Validation::new(Algorithm::HS256);
        // exp and nbf are checked against our own clock after decoding.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();
        validation.leeway = 0;
        if let Some(iss) = &options.iss {
            validation.set_issuer(&[iss]);
            validation.required_spec_claims.insert(names::ISSUER.to_string());
        }
        match &options.aud {
            Some(aud) => {
                validation.set_audience(aud.values().as_slice());
                validation
                    .required_spec_claims
                    .insert(names::AUDIENCE.to_string());
            }
            None => validation.validate_aud = false,
        }

        let secret = options.secret.as_bytes();
        let inner = Inner {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            defaults: DefaultClaims {
                sub: options.sub,
                iss: options.iss,
                aud: options.aud,
                exp,
                nbf,
            },
            iat: options.iat,
            schema: options.schema,
            clock: options.clock,
            name: options.name,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// The context name this instance is attached under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Sign `payload` with the instance defaults.
    ///
    /// # Errors
    /// See `sign_with`.
    pub fn sign(&self, payload: &Claims) -> Result<String, SignError> {
        self.sign_with(payload, &ClaimOverrides::default())
    }

    /// Sign `payload` with the instance defaults and explicit overrides.
    ///
    /// Precedence, lowest first: defaults, `payload`, `overrides`.
    ///
    /// # Errors
    /// Returns `SignError::TimeClaim` when `exp`, `nbf` or `iat` has an
    /// unusable value, `SignError::ClaimConflict` when `iss` or `aud` is
    /// replaced by a value this instance would reject, `SignError::Schema`
    /// when the payload does not match the schema, and `SignError::Encode` if
    /// the backend fails.
    pub fn sign_with(
        &self,
        payload: &Claims,
        overrides: &ClaimOverrides,
    ) -> Result<String, SignError> {
        let now = self.inner.clock.now_secs();
        let claims = self.build_claims(payload, overrides, now)?;

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.inner.encoding_key,
        )?;
        debug!(instance = %self.inner.name, "signed token");
        Ok(token)
    }

    /// Assemble the final claims set for a token signed at `now`.
    fn build_claims(
        &self,
        payload: &Claims,
        overrides: &ClaimOverrides,
        now: i64,
    ) -> Result<Claims, SignError> {
        let defaults = self.inner.defaults.to_claims(now);
        let overrides = overrides.to_claims(now);
        let mut claims = claims::merge([&defaults, payload, &overrides]);
        self.check_expectations(&claims)?;

        claims::resolve_time_claim(&mut claims, names::EXPIRES_AT, now)?;
        claims::resolve_time_claim(&mut claims, names::NOT_BEFORE, now)?;

        if let Some(schema) = &self.inner.schema {
            schema.validate(&claims)?;
        }

        match claims::numeric_date(&claims, names::ISSUED_AT) {
            Ok(Some(iat)) if iat > claims::seconds(now) => {
                claims.insert(names::ISSUED_AT.to_string(), Value::from(now));
            }
            Ok(Some(_)) => {}
            Ok(None) if self.inner.iat => {
                claims.insert(names::ISSUED_AT.to_string(), Value::from(now));
            }
            Ok(None) => {}
            Err(()) => {
                return Err(TimeClaimError::WrongType {
                    claim: names::ISSUED_AT,
                }
                .into());
            }
        }

        Ok(claims)
    }

    /// Fail when the merged claims carry an `iss` or `aud` that `verify` on
    /// this instance would reject.
    fn check_expectations(&self, claims: &Claims) -> Result<(), SignError> {
        let defaults = &self.inner.defaults;
        if let Some(iss) = &defaults.iss {
            if claims.get(names::ISSUER).and_then(Value::as_str) != Some(iss.as_str()) {
                return Err(SignError::ClaimConflict {
                    claim: names::ISSUER,
                });
            }
        }
        if let Some(aud) = &defaults.aud {
            if !claims.get(names::AUDIENCE).is_some_and(|value| aud.accepts(value)) {
                return Err(SignError::ClaimConflict {
                    claim: names::AUDIENCE,
                });
            }
        }
        Ok(())
    }

    /// Verify `token`.
    ///
    /// # Errors
    /// Only for unexpected backend faults. Malformed, tampered, expired or
    /// otherwise unacceptable tokens yield `Ok(Verification::Invalid)`.
    pub fn verify(&self, token: &str) -> Result<Verification, VerifyError> {
        if !is_compact_jws(token) {
            return Ok(self.reject("malformed"));
        }

        let claims = match decode::<Claims>(token, &self.inner.decoding_key, &self.inner.validation)
        {
            Ok(data) => data.claims,
            Err(error) => return self.classify(&error),
        };

        let now = claims::seconds(self.inner.clock.now_secs());
        match claims::numeric_date(&claims, names::EXPIRES_AT) {
            Ok(Some(exp)) if exp <= now => return Ok(self.reject("expired")),
            Ok(_) => {}
            Err(()) => return Ok(self.reject("malformed exp")),
        }
        match claims::numeric_date(&claims, names::NOT_BEFORE) {
            Ok(Some(nbf)) if nbf > now => return Ok(self.reject("not yet valid")),
            Ok(_) => {}
            Err(()) => return Ok(self.reject("malformed nbf")),
        }

        if let Some(schema) = &self.inner.schema {
            if schema.validate(&claims).is_err() {
                return Ok(self.reject("schema mismatch"));
            }
        }

        debug!(instance = %self.inner.name, "verified token");
        Ok(Verification::Valid(claims))
    }

    /// Verify a token that may not have been presented at all.
    ///
    /// # Errors
    /// See `verify`.
    pub fn verify_opt(&self, token: Option<&str>) -> Result<Verification, VerifyError> {
        match token {
            Some(token) => self.verify(token),
            None => Ok(self.reject("missing")),
        }
    }

    fn classify(&self, error: &jsonwebtoken::errors::Error) -> Result<Verification, VerifyError> {
        match error.kind() {
            ErrorKind::InvalidKeyFormat | ErrorKind::InvalidEcdsaKey | ErrorKind::InvalidRsaKey(_) => {
                Err(VerifyError::Internal(error.to_string()))
            }
            ErrorKind::InvalidSignature => Ok(self.reject("bad signature")),
            ErrorKind::InvalidIssuer => Ok(self.reject("issuer mismatch")),
            ErrorKind::InvalidAudience => Ok(self.reject("audience mismatch")),
            ErrorKind::MissingRequiredClaim(_) => Ok(self.reject("missing claim")),
            ErrorKind::InvalidAlgorithm => Ok(self.reject("algorithm mismatch")),
            _ => Ok(self.reject("undecodable")),
        }
    }

    fn reject(&self, reason: &'static str) -> Verification {
        debug!(instance = %self.inner.name, reason, "rejected token");
        Verification::Invalid
    }
}

/// Three non-empty base64url segments separated by dots.
fn is_compact_jws(token: &str) -> bool {
    let is_base64url = |segment: &str| {
        !segment.is_empty()
            && segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    };
    let mut segments = token.split('.');
    let structured = (&mut segments).take(3).filter(|s| is_base64url(s)).count() == 3;
    structured && segments.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::schema::{ClaimType, ObjectSchema};
    use crate::jwt::time::FixedTimeSource;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;
    const TEST_SECRET: &str = "A";

    fn payload(value: Value) -> Claims {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn jwt_at(options: JwtOptions, now: i64) -> Jwt {
        Jwt::new(options.clock(FixedTimeSource(now))).expect("valid options")
    }

    fn valid_claims(verification: Verification) -> Claims {
        verification.into_claims().expect("token should verify")
    }

    /// Sign arbitrary claims with the jsonwebtoken encoder directly.
    fn hand_signed(claims: &Value, secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .expect("failed to create test token")
    }

    #[test]
    fn test_sign_produces_three_segments() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW);
        let token = jwt
            .sign(&payload(json!({"name": "Shirokami"})))
            .expect("sign");

        assert_eq!(token.matches('.').count(), 2);
        assert!(is_compact_jws(&token));
    }

    #[test]
    fn test_round_trip_adds_default_exp_and_iat() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW);
        let token = jwt
            .sign(&payload(json!({"name": "Shirokami"})))
            .expect("sign");

        let claims = valid_claims(jwt.verify(&token).expect("no fault"));

        assert_eq!(
            claims,
            payload(json!({"name": "Shirokami", "exp": NOW + 3_600, "iat": NOW}))
        );
    }

    #[test]
    fn test_defaults_and_custom_claims_survive_round_trip() {
        let jwt = jwt_at(
            JwtOptions::new("jwt", "test-secret")
                .sub("auth")
                .iss("test.com")
                .aud("test-audience")
                .exp("1h"),
            NOW,
        );
        let token = jwt
            .sign(&payload(json!({"role": "admin", "permissions": ["read", "write"]})))
            .expect("sign");

        let claims = valid_claims(jwt.verify(&token).expect("no fault"));

        assert_eq!(claims["role"], "admin");
        assert_eq!(claims["permissions"], json!(["read", "write"]));
        assert_eq!(claims["sub"], "auth");
        assert_eq!(claims["iss"], "test.com");
        assert_eq!(claims["aud"], "test-audience");
        assert_eq!(claims["exp"], NOW + 3_600);
    }

    #[test]
    fn test_payload_exp_expression_beats_default() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET).exp("7d"), NOW);
        let token = jwt
            .sign(&payload(json!({"name": "a", "exp": "30m"})))
            .expect("sign");

        let claims = valid_claims(jwt.verify(&token).expect("no fault"));
        assert_eq!(claims["exp"], NOW + 1_800);
    }

    #[test]
    fn test_overrides_beat_payload_and_defaults() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET).sub("auth"), NOW);
        let overrides = ClaimOverrides::new()
            .sub("user-42")
            .exp(Expiry::After(60))
            .jti("token-1");
        let token = jwt
            .sign_with(&payload(json!({"sub": "payload", "exp": "2h"})), &overrides)
            .expect("sign");

        let claims = valid_claims(jwt.verify(&token).expect("no fault"));
        assert_eq!(claims["sub"], "user-42");
        assert_eq!(claims["exp"], NOW + 60);
        assert_eq!(claims["jti"], "token-1");
    }

    #[test]
    fn test_exp_never_omits_claim() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET).expiry(Expiry::Never), NOW);
        let token = jwt.sign(&payload(json!({"name": "a"}))).expect("sign");

        let claims = valid_claims(jwt.verify(&token).expect("no fault"));
        assert!(!claims.contains_key("exp"));

        // Still valid far in the future.
        let later = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW + 10 * 365 * 86_400);
        assert!(later.verify(&token).expect("no fault").is_valid());
    }

    #[test]
    fn test_iat_disabled() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET).iat(false), NOW);
        let token = jwt.sign(&payload(json!({"name": "a"}))).expect("sign");

        let claims = valid_claims(jwt.verify(&token).expect("no fault"));
        assert!(!claims.contains_key("iat"));
    }

    #[test]
    fn test_future_iat_is_clamped_to_sign_time() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW);
        let token = jwt
            .sign(&payload(json!({"iat": NOW + 10_000})))
            .expect("sign");

        let claims = valid_claims(jwt.verify(&token).expect("no fault"));
        assert_eq!(claims["iat"], NOW);
    }

    #[test]
    fn test_past_iat_is_kept() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW);
        let token = jwt.sign(&payload(json!({"iat": NOW - 5}))).expect("sign");

        let claims = valid_claims(jwt.verify(&token).expect("no fault"));
        assert_eq!(claims["iat"], NOW - 5);
    }

    #[test]
    fn test_sign_rejects_bad_time_claims() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW);

        let result = jwt.sign(&payload(json!({"exp": "whenever"})));
        assert!(matches!(result, Err(SignError::TimeClaim(_))));

        let result = jwt.sign(&payload(json!({"exp": [1]})));
        assert!(matches!(result, Err(SignError::TimeClaim(_))));

        let result = jwt.sign(&payload(json!({"iat": "now"})));
        assert!(matches!(result, Err(SignError::TimeClaim(_))));
    }

    #[test]
    fn test_sign_enforces_schema() {
        let jwt = jwt_at(
            JwtOptions::new("jwt", TEST_SECRET).schema(ObjectSchema::new().required("name", ClaimType::String)),
            NOW,
        );

        assert!(jwt.sign(&payload(json!({"name": "a"}))).is_ok());

        let result = jwt.sign(&payload(json!({"name": 7})));
        assert!(matches!(result, Err(SignError::Schema(_))));

        let result = jwt.sign(&payload(json!({})));
        assert!(matches!(result, Err(SignError::Schema(_))));
    }

    #[test]
    fn test_verify_rejects_other_secret() {
        let signer = jwt_at(JwtOptions::new("jwt", "secret-one"), NOW);
        let verifier = jwt_at(JwtOptions::new("jwt", "secret-two"), NOW);
        let token = signer.sign(&payload(json!({"name": "a"}))).expect("sign");

        assert_eq!(verifier.verify(&token).expect("no fault"), Verification::Invalid);
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW);
        let token = jwt.sign(&payload(json!({"name": "a"}))).expect("sign");

        let at_expiry = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW + 3_600);
        assert!(!at_expiry.verify(&token).expect("no fault").is_valid());

        let just_before = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW + 3_599);
        assert!(just_before.verify(&token).expect("no fault").is_valid());
    }

    #[test]
    fn test_verify_rejects_hand_built_expired_token() {
        let jwt = Jwt::new(JwtOptions::new("jwt", TEST_SECRET)).expect("valid options");
        let now = jwt.inner.clock.now_secs();
        let token = hand_signed(
            &json!({"name": "Expired User", "exp": now - 3_600}),
            TEST_SECRET.as_bytes(),
        );

        assert_eq!(jwt.verify(&token).expect("no fault"), Verification::Invalid);
    }

    #[test]
    fn test_verify_accepts_foreign_token_without_exp() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW);
        let token = hand_signed(&json!({"name": "a"}), TEST_SECRET.as_bytes());

        let claims = valid_claims(jwt.verify(&token).expect("no fault"));
        assert_eq!(claims, payload(json!({"name": "a"})));
    }

    #[test]
    fn test_verify_rejects_not_yet_valid_token() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET).nbf("10m"), NOW);
        let token = jwt.sign(&payload(json!({}))).expect("sign");

        assert!(!jwt.verify(&token).expect("no fault").is_valid());

        let later = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW + 600);
        assert!(later.verify(&token).expect("no fault").is_valid());
    }

    #[test]
    fn test_verify_rejects_non_numeric_exp() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW);
        let token = hand_signed(&json!({"exp": "tomorrow"}), TEST_SECRET.as_bytes());

        assert_eq!(jwt.verify(&token).expect("no fault"), Verification::Invalid);
    }

    #[test]
    fn test_verify_rejects_wrong_issuer() {
        let signer = jwt_at(JwtOptions::new("jwt", TEST_SECRET).iss("a.com"), NOW);
        let verifier = jwt_at(JwtOptions::new("jwt", TEST_SECRET).iss("b.com"), NOW);
        let token = signer.sign(&payload(json!({}))).expect("sign");

        assert!(signer.verify(&token).expect("no fault").is_valid());
        assert!(!verifier.verify(&token).expect("no fault").is_valid());

        let unissued = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW)
            .sign(&payload(json!({})))
            .expect("sign");
        assert!(!verifier.verify(&unissued).expect("no fault").is_valid());
    }

    #[test]
    fn test_verify_checks_audience() {
        let signer = jwt_at(JwtOptions::new("jwt", TEST_SECRET).aud("api"), NOW);
        let verifier = jwt_at(
            JwtOptions::new("jwt", TEST_SECRET).aud(&["web", "api"][..]),
            NOW,
        );
        let stranger = jwt_at(JwtOptions::new("jwt", TEST_SECRET).aud("billing"), NOW);
        let token = signer.sign(&payload(json!({}))).expect("sign");

        assert!(verifier.verify(&token).expect("no fault").is_valid());
        assert!(!stranger.verify(&token).expect("no fault").is_valid());

        // No audience expectation: any audience is accepted.
        let open = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW);
        assert!(open.verify(&token).expect("no fault").is_valid());
    }

    #[test]
    fn test_verify_requires_configured_issuer_and_audience() {
        let verifier = jwt_at(JwtOptions::new("jwt", TEST_SECRET).iss("b.com").aud("api"), NOW);
        let secret = TEST_SECRET.as_bytes();

        let complete = hand_signed(&json!({"iss": "b.com", "aud": "api"}), secret);
        assert!(verifier.verify(&complete).expect("no fault").is_valid());

        let no_iss = hand_signed(&json!({"aud": "api"}), secret);
        assert_eq!(verifier.verify(&no_iss).expect("no fault"), Verification::Invalid);

        let no_aud = hand_signed(&json!({"iss": "b.com"}), secret);
        assert_eq!(verifier.verify(&no_aud).expect("no fault"), Verification::Invalid);
    }

    #[test]
    fn test_sign_rejects_conflicting_issuer_and_audience() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET).iss("test.com").aud("x"), NOW);

        let result = jwt.sign(&payload(json!({"iss": "other.com"})));
        assert!(matches!(result, Err(SignError::ClaimConflict { claim: "iss" })));

        let result = jwt.sign(&payload(json!({"aud": null})));
        assert!(matches!(result, Err(SignError::ClaimConflict { claim: "aud" })));

        let result = jwt.sign_with(&Claims::new(), &ClaimOverrides::new().aud("y"));
        assert!(matches!(result, Err(SignError::ClaimConflict { claim: "aud" })));

        // Restating the configured values is fine.
        let token = jwt
            .sign_with(
                &payload(json!({"iss": "test.com"})),
                &ClaimOverrides::new().aud(vec!["x".to_string(), "y".to_string()]),
            )
            .expect("sign");
        assert!(jwt.verify(&token).expect("no fault").is_valid());
    }

    #[test]
    fn test_verify_accepts_fractional_numeric_dates() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW);
        let secret = TEST_SECRET.as_bytes();

        let token = hand_signed(&json!({"name": "a", "exp": 1_800_000_000.5}), secret);
        let claims = valid_claims(jwt.verify(&token).expect("no fault"));
        assert_eq!(claims["exp"], json!(1_800_000_000.5));

        let expired = hand_signed(&json!({"exp": 1_699_999_999.5}), secret);
        assert_eq!(jwt.verify(&expired).expect("no fault"), Verification::Invalid);

        let not_yet = hand_signed(&json!({"nbf": 1_700_000_000.5}), secret);
        assert_eq!(jwt.verify(&not_yet).expect("no fault"), Verification::Invalid);
    }

    #[test]
    fn test_jwt_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Jwt>();
    }

    #[tokio::test]
    async fn test_concurrent_sign_and_verify_on_clones() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET).iss("test.com"), NOW);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let jwt = jwt.clone();
                tokio::spawn(async move {
                    let token = jwt.sign(&payload(json!({"n": i}))).expect("sign");
                    valid_claims(jwt.verify(&token).expect("no fault"))
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let claims = handle.await.expect("task");
            assert_eq!(claims["n"], json!(i));
            assert_eq!(claims["iss"], "test.com");
        }
    }

    #[test]
    fn test_verify_enforces_schema() {
        let jwt = jwt_at(
            JwtOptions::new("jwt", TEST_SECRET).schema(ObjectSchema::new().required("name", ClaimType::String)),
            NOW,
        );
        let token = hand_signed(&json!({"id": 1}), TEST_SECRET.as_bytes());

        assert_eq!(jwt.verify(&token).expect("no fault"), Verification::Invalid);
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW);
        let token = jwt.sign(&payload(json!({"role": "user"}))).expect("sign");
        let forged = hand_signed(&json!({"role": "admin"}), b"other");

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_payload = forged.split('.').nth(1).expect("payload segment");
        parts[1] = forged_payload;
        let tampered = parts.join(".");

        assert_eq!(jwt.verify(&tampered).expect("no fault"), Verification::Invalid);
    }

    #[test]
    fn test_verify_rejects_other_algorithms() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW);
        let token = encode(
            &Header::new(Algorithm::HS512),
            &json!({"name": "a"}),
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .expect("failed to create test token");

        assert_eq!(jwt.verify(&token).expect("no fault"), Verification::Invalid);
    }

    #[test]
    fn test_verify_malformed_inputs_never_fault() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW);
        for token in [
            "",
            "invalid",
            "invalid.token.here",
            "a.b",
            "a.b.c.d",
            "..",
            "a..c",
            "eyJhbGciOiJIUzI1NiJ9.e30.sig=",
            "eyJhbGciOiJIUzI1NiJ9.!!!.c2ln",
            "e30.e30.e30",
        ] {
            let result = jwt.verify(token);
            assert!(
                matches!(result, Ok(Verification::Invalid)),
                "expected '{token}' to be rejected"
            );
        }
    }

    #[test]
    fn test_verify_opt_missing_token() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW);
        assert!(matches!(jwt.verify_opt(None), Ok(Verification::Invalid)));
    }

    #[test]
    fn test_jwt_new_rejects_bad_options() {
        assert!(matches!(
            Jwt::new(JwtOptions::new("", TEST_SECRET)),
            Err(ConfigError::EmptyName)
        ));
        assert!(matches!(
            Jwt::new(JwtOptions::new("jwt", "")),
            Err(ConfigError::EmptySecret)
        ));
    }

    #[test]
    fn test_clones_share_configuration() {
        let jwt = jwt_at(JwtOptions::new("jwt", TEST_SECRET), NOW);
        let clone = jwt.clone();
        let token = jwt.sign(&payload(json!({"name": "a"}))).expect("sign");

        assert_eq!(clone.name(), "jwt");
        assert!(clone.verify(&token).expect("no fault").is_valid());
    }

    #[test]
    fn test_verification_accessors() {
        let valid = Verification::Valid(payload(json!({"name": "a"})));
        assert!(valid.is_valid());
        assert_eq!(valid.claims().map(|c| c["name"].clone()), Some(json!("a")));
        assert!(Verification::Invalid.claims().is_none());
        assert!(Verification::Invalid.into_claims().is_none());
    }
}
