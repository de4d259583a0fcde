//! HTTP middleware stack for the site.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame and isolation policies)
//! 5. Age gate (page routes only)
//! 6. Rate limiting (form and submission POSTs only)

pub mod age_gate;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use age_gate::{AGE_GATE_PATH, age_gate_middleware};
pub use rate_limit::submission_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
