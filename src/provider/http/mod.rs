//! HTTP transport layer — `HttpTransport` with per-method retry policies.

pub mod client;
pub mod retry;

pub use client::HttpTransport;
pub use retry::{RetryConfig, RetryPolicy};
