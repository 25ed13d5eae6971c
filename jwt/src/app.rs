//! Demo application.
//!
//! A cookie-based session built on one named instance:
//!
//! - `GET /sign/{name}` issues a seven-day session cookie for `name`.
//! - `GET /profile` greets the holder of a valid session cookie, or answers
//!   `401 Unauthorized`.
//! - `POST /verify` checks a token given as `{"token": "..."}` and reports the
//!   outcome as JSON.
//!
//! Translating a rejected token into a status code happens here, in the
//! handlers; the injector only makes the instance available.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::config::ServerConfig;
use crate::context::RequestContext;
use crate::jwt::{ClaimType, Claims, Jwt, JwtOptions, ObjectSchema, Verification};
use crate::middleware::inject;

/// Context name of the session instance.
pub const SESSION: &str = "session";
/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "auth";
/// Session lifetime, as configured on the instance and on the cookie.
pub const SESSION_LIFETIME: &str = "7d";
const SESSION_MAX_AGE_SECS: u32 = 7 * 86_400;

const VERIFICATION_FAILED: &str = "Verification failed";

/// Options for the session instance: subject `auth`, the configured issuer,
/// a seven-day lifetime and a payload that must carry a string `name`.
#[must_use]
pub fn session_options(config: &ServerConfig) -> JwtOptions {
    JwtOptions::new(SESSION, config.secret.clone())
        .sub("auth")
        .iss(config.issuer.clone())
        .exp(SESSION_LIFETIME)
        .schema(ObjectSchema::new().required("name", ClaimType::String))
}

#[derive(Clone)]
struct AppState {
    /// Name the session instance is attached under.
    session: Arc<str>,
}

/// Build the demo router around `session`.
pub fn router(session: Jwt) -> Router {
    let state = AppState {
        session: Arc::from(session.name()),
    };

    Router::new()
        .route("/sign/{name}", get(sign_in))
        .route("/profile", get(profile))
        .route("/verify", post(verify))
        .layer(from_fn_with_state(session, inject))
        .with_state(state)
}

async fn sign_in(
    State(state): State<AppState>,
    context: RequestContext,
    Path(name): Path<String>,
) -> Response {
    let Some(jwt) = context.get(&state.session) else {
        return missing_instance(&state.session);
    };

    let mut claims = Claims::new();
    claims.insert("name".to_string(), Value::from(name.as_str()));

    match jwt.sign(&claims) {
        Ok(token) => {
            let cookie = format!(
                "{SESSION_COOKIE}={token}; HttpOnly; Max-Age={SESSION_MAX_AGE_SECS}; Path=/"
            );
            ([(SET_COOKIE, cookie)], format!("Sign in as {name}")).into_response()
        }
        Err(e) => {
            error!("failed to sign session token: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn profile(
    State(state): State<AppState>,
    context: RequestContext,
    headers: HeaderMap,
) -> Response {
    let Some(jwt) = context.get(&state.session) else {
        return missing_instance(&state.session);
    };

    match jwt.verify_opt(session_cookie(&headers)) {
        Ok(Verification::Valid(claims)) => {
            let name = claims.get("name").and_then(Value::as_str).unwrap_or_default();
            format!("Hello {name}").into_response()
        }
        Ok(Verification::Invalid) => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
        Err(e) => {
            error!("session verification fault: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Body of `POST /verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub token: Option<String>,
}

/// Answer of `POST /verify`.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct VerifyResponse {
    pub success: bool,
    pub data: Option<Claims>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

async fn verify(
    State(state): State<AppState>,
    context: RequestContext,
    Json(request): Json<VerifyRequest>,
) -> Response {
    let Some(jwt) = context.get(&state.session) else {
        return missing_instance(&state.session);
    };

    match jwt.verify_opt(request.token.as_deref()) {
        Ok(Verification::Valid(claims)) => Json(VerifyResponse {
            success: true,
            data: Some(claims),
            message: None,
        })
        .into_response(),
        Ok(Verification::Invalid) => Json(VerifyResponse {
            success: false,
            data: None,
            message: Some(VERIFICATION_FAILED.to_string()),
        })
        .into_response(),
        Err(e) => {
            error!("token verification fault: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn missing_instance(name: &str) -> Response {
    error!("no JWT instance attached under '{name}'");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

/// The session token from the `Cookie` header, if any.
fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
}
