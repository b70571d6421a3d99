//! Cross-cutting HTTP layers: per-IP rate limiting, CORS, and security
//! headers.

pub mod rate_limit;
pub mod security;

pub use rate_limit::{ClientIp, RateLimiter, enforce_rate_limit};
pub use security::{cors_layer, security_headers};
