use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

/// Default bound on a single generation or download
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared HTTP client with connection pooling
pub static HTTP_CLIENT: Lazy<Client> =
    Lazy::new(|| build(DEFAULT_TIMEOUT).expect("Failed to create HTTP client"));

/// Build a pooled client bounded by `timeout`
pub fn build(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(5)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .user_agent(concat!("imagine-cli/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Client for `timeout`, reusing the shared one when the default applies
pub fn for_timeout(timeout: Duration) -> reqwest::Result<Client> {
    if timeout == DEFAULT_TIMEOUT {
        Ok(HTTP_CLIENT.clone())
    } else {
        build(timeout)
    }
}
