// crates/allot-server/src/http.rs
// Shared HTTP client for LLM provider calls

use std::time::Duration;

/// Default request timeout, matching the allocation timeout default
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default connect timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Create the shared HTTP client with the default timeout.
pub fn create_shared_client() -> reqwest::Client {
    create_client_with_timeout(DEFAULT_TIMEOUT)
}

/// Create an HTTP client whose request timeout follows `allocation.timeout`.
///
/// Created once at startup and shared by every provider adapter.
pub fn create_client_with_timeout(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .pool_max_idle_per_host(4)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
