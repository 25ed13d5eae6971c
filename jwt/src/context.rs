//! Per-request capability map.
//!
//! A `RequestContext` holds the `Jwt` instances attached to one request, keyed
//! by instance name. The injector middleware stores it in the request
//! extensions; handlers take it as an extractor and look instances up by name.
//!
//! # Invariants
//! - One entry per name; attaching the same name again replaces the entry.
//! - A context belongs to exactly one request and holds no claims or tokens.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::jwt::Jwt;

/// The JWT instances available to a request handler.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    instances: HashMap<String, Jwt>,
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `jwt` under its own name, replacing any previous binding.
    pub fn insert(&mut self, jwt: Jwt) {
        self.instances.insert(jwt.name().to_string(), jwt);
    }

    /// The instance attached under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Jwt> {
        self.instances.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Requests that never went through the injector see an empty context.
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_default())
    }
}
