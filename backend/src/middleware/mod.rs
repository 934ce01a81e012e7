//! Request middleware.
//!
//! Purpose: Define middleware components for request lifecycle concerns such as
//! tracing and per-client quotas.

pub mod rate_limit;
pub mod trace;

pub use rate_limit::{RateLimit, RateLimitError};
pub use trace::Trace;
