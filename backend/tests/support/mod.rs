//! Shared helpers for storefront integration tests.
//!
//! Each file under `tests/` compiles as its own crate, so not every helper
//! is used everywhere.
#![expect(dead_code, reason = "each test crate uses a different subset of helpers")]

pub mod app;
