//! HTTP middleware.
//!
//! - `request_id` - `x-request-id` propagation into spans, Sentry and responses
//! - `rate_limit` - Per-IP rate limiting for `/api`

pub mod rate_limit;
pub mod request_id;

pub use rate_limit::{ClientIpKeyExtractor, RateLimiterLayer, api_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
