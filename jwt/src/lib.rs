// Life of a request:
// 1. The router matches a route
// 2. The injector middleware attaches each named `Jwt` to the request's `RequestContext`
// 3. The handler extracts the context and signs and/or verifies tokens
// 4. The handler decides the response (e.g. 401 on a rejected token)
//
// Components:
//  - Named JWT instances: claim policy, signing, verification
//  - Request context + injector middleware
//  - Demo session app and its configuration

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod app;
pub mod config;
pub mod context;
pub mod jwt;
pub mod middleware;

pub use context::RequestContext;
pub use jwt::{ClaimOverrides, Claims, Expiry, Jwt, JwtOptions, Verification};
pub use middleware::inject;
