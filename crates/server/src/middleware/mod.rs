//! HTTP middleware stack for the catalog server.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing, span from [`request_span`])
//! 3. Request ID (add unique ID to each request)
//!
//! The upload body limit is applied by `routes::app`, and [`RequireUser`]
//! records the caller on the request span.

pub mod auth;
pub mod request_id;

pub use auth::RequireUser;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware, request_span};
