//! Client configuration. Every field has a default, so zero-argument
//! construction of a client is valid.

use crate::retry::RetryPolicy;

/// Agent sent when the caller does not set one. Set an agent unique to your
/// application instead, e.g. `BobSecurityScanner/v1`.
pub const DEFAULT_USER_AGENT: &str = "BasicUrlscan/v1";

/// Where urlscan.io lives. In theory this never changes; the field exists so
/// tests and the CLI `--api-url` flag can point the client elsewhere. The
/// endpoint paths underneath it are fixed.
pub const DEFAULT_ROOT_URL: &str = "https://urlscan.io";

/// Construction-time settings for [`Urlscan`](crate::client::Urlscan).
///
/// The client consumes the config; nothing about it can change afterwards.
/// Fill in what you need and take the rest from `Default`:
///
/// ```no_run
/// use basic_urlscan::config::ClientConfig;
///
/// let config = ClientConfig {
///     api_key: Some("my-key".to_string()),
///     ..ClientConfig::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// API key for authenticated access. Optional, but urlscan.io limits
    /// what anonymous callers can do.
    pub api_key: Option<String>,
    /// User-Agent header; [`DEFAULT_USER_AGENT`] when unset.
    pub user_agent: Option<String>,
    /// Total attempts per request before giving up.
    pub retries: u32,
    /// Backoff factor in seconds; the inter-attempt delay doubles from it.
    pub backoff: f64,
    /// Service root URL.
    pub root_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            api_key: None,
            user_agent: None,
            retries: policy.retries,
            backoff: policy.backoff,
            root_url: DEFAULT_ROOT_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            backoff: self.backoff,
        }
    }
}
