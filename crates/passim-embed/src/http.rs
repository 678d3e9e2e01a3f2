//! Shared HTTP client construction for consistent timeout and TLS configuration.

use std::time::Duration;

/// Create a shared HTTP client with standard passim configuration.
///
/// Config: 10s connect timeout, 60s request timeout, rustls TLS,
/// `passim/{version}` user-agent. The request timeout bounds how long a hung
/// provider can stall an ingestion job.
#[must_use]
pub fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(60))
        .user_agent(concat!("passim/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("default HTTP client construction must not fail")
}
