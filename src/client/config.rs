//! Client configuration options.

use std::time::Duration;

use url::Url;

/// Configuration for the dataset API client.
///
/// # Example
///
/// ```
/// use devapi_rs::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(60))
///     .with_user_agent("my-app/1.0");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL; `None` uses the protocol variant's default
    pub base_url: Option<Url>,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
    /// Retry configuration
    pub retry: RetryConfig,
    /// Skip TLS certificate verification
    pub danger_accept_invalid_certs: bool,
    /// Proxy URL applied to all requests
    pub proxy: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("devapi-rs/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryConfig::default(),
            danger_accept_invalid_certs: false,
            proxy: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the client at a different API root, e.g. a staging host.
    ///
    /// A trailing slash is added when missing so dataset names join as
    /// path segments.
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = Some(with_trailing_slash(url));
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn with_tls_verification(mut self, verify: bool) -> Self {
        self.danger_accept_invalid_certs = !verify;
        self
    }

    /// Route all requests through a proxy.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }
}

/// Make `url` end in `/` so relative joins append to its last segment.
pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Configuration for automatic retries.
///
/// Idempotent requests (GET, HEAD, and the token POST) are retried on
/// network failures and the configured server error statuses with
/// exponential backoff. Throttled token requests (403) are retried after
/// a fixed delay from their own budget.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Backoff factor in seconds; the n-th retry waits `factor * 2^(n-1)`
    pub backoff_factor: f64,
    /// Upper bound on a single backoff delay
    pub max_backoff: Duration,
    /// HTTP status codes to retry on
    pub retry_statuses: Vec<u16>,
    /// Delay before resending a throttled token request
    pub throttle_delay: Duration,
    /// Maximum number of throttled token request resends
    pub throttle_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: 1.0,
            max_backoff: Duration::from_secs(120),
            retry_statuses: vec![500, 502, 503, 504],
            throttle_delay: Duration::from_secs(60),
            throttle_retries: 5,
        }
    }
}

impl RetryConfig {
    /// Create a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            throttle_retries: 0,
            ..Default::default()
        }
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// Set the backoff factor (seconds).
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Set the maximum backoff duration.
    pub fn with_max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    /// Set the delay used for throttled token requests.
    pub fn with_throttle_delay(mut self, delay: Duration) -> Self {
        self.throttle_delay = delay;
        self
    }

    /// Set how many throttled token requests are resent before giving up.
    pub fn with_throttle_retries(mut self, retries: u32) -> Self {
        self.throttle_retries = retries;
        self
    }

    /// Calculate the backoff duration for a given retry attempt (1-based).
    ///
    /// Capped at `max_backoff`; a non-positive or NaN factor means no delay.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 || self.backoff_factor.is_nan() || self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 1).min(31) as i32;
        Duration::try_from_secs_f64(self.backoff_factor * 2f64.powi(exponent))
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }

    /// Check if a status code should be retried.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.base_url.is_none());
        assert!(!config.danger_accept_invalid_certs);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.throttle_delay, Duration::from_secs(60));
    }

    #[test]
    fn test_retry_backoff() {
        let config = RetryConfig::default();
        assert_eq!(config.backoff_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.backoff_for_attempt(2), Duration::from_secs(2));
        assert_eq!(config.backoff_for_attempt(3), Duration::from_secs(4));
    }

    #[test]
    fn test_retry_backoff_zero_factor() {
        let config = RetryConfig::default().with_backoff_factor(0.0);
        assert_eq!(config.backoff_for_attempt(4), Duration::ZERO);
    }

    #[test]
    fn test_retry_backoff_max() {
        let config = RetryConfig::default()
            .with_backoff_factor(10.0)
            .with_max_backoff(Duration::from_secs(30));

        // 10 * 2^2 = 40, but capped at 30
        assert_eq!(config.backoff_for_attempt(3), Duration::from_secs(30));
        assert_eq!(config.backoff_for_attempt(1), Duration::from_secs(10));
    }

    #[test]
    fn test_retry_backoff_out_of_range_factor() {
        let huge = RetryConfig::default().with_backoff_factor(1e300);
        assert_eq!(huge.backoff_for_attempt(3), huge.max_backoff);
        assert_eq!(huge.backoff_for_attempt(40), huge.max_backoff);

        let nan = RetryConfig::default().with_backoff_factor(f64::NAN);
        assert_eq!(nan.backoff_for_attempt(2), Duration::ZERO);
    }

    #[test]
    fn test_no_retry() {
        let config = RetryConfig::no_retry();
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.throttle_retries, 0);
        assert_eq!(config.retry_statuses, RetryConfig::default().retry_statuses);
    }

    #[test]
    fn test_should_retry_status() {
        let config = RetryConfig::default();
        assert!(config.should_retry_status(500));
        assert!(config.should_retry_status(503));
        assert!(!config.should_retry_status(404));
        assert!(!config.should_retry_status(401));
        assert!(!config.should_retry_status(429));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig::default()
            .with_base_url(Url::parse("http://localhost:8080/v3/direct-access").unwrap());
        assert_eq!(
            config.base_url.unwrap().as_str(),
            "http://localhost:8080/v3/direct-access/"
        );
        let already = Url::parse("http://localhost:8080/v3/").unwrap();
        assert_eq!(with_trailing_slash(already.clone()), already);
    }

    #[test]
    fn test_tls_toggle() {
        let config = ClientConfig::default().with_tls_verification(false);
        assert!(config.danger_accept_invalid_certs);
    }
}
