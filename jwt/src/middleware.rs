//! Context injector for axum.
//!
//! ```ignore
//! let jwt = Jwt::new(JwtOptions::new("jwt", secret))?;
//! let app = Router::new()
//!     .route("/profile", get(profile))
//!     .layer(axum::middleware::from_fn_with_state(jwt, inject));
//! ```
//!
//! Handlers then extract `RequestContext` and call
//! `context.get("jwt")` to reach `sign` / `verify`.
//!
//! # Post-conditions
//! - The request's `RequestContext` holds the instance under its name.
//! - The response is whatever the rest of the stack produces; the injector
//!   never answers on its own.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::context::RequestContext;
use crate::jwt::Jwt;

impl Jwt {
    /// Bind this instance into `context` under its name.
    ///
    /// Attaching twice leaves a single binding.
    pub fn attach(&self, context: &mut RequestContext) {
        context.insert(self.clone());
    }
}

/// Middleware attaching `jwt` to the request's `RequestContext`.
///
/// Stack one layer per instance to expose several names on the same request.
pub async fn inject(State(jwt): State<Jwt>, mut request: Request, next: Next) -> Response {
    let mut context = request
        .extensions_mut()
        .remove::<RequestContext>()
        .unwrap_or_default();
    jwt.attach(&mut context);
    request.extensions_mut().insert(context);

    next.run(request).await
}
