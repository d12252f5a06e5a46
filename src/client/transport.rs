//! HTTP transport with retry-on-5xx and exponential backoff.

use reqwest::{Method, Request, Response};
use tracing::debug;

use super::config::{ClientConfig, RetryConfig};
use crate::{Error, Result};

/// Owns the pooled `reqwest::Client` and the transient-failure retry policy.
///
/// Only idempotent methods (GET, HEAD and the token POST) are retried.
/// When retries run out the last response is handed back unchanged, and a
/// last network failure becomes a query error.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    http: reqwest::Client,
    retry: RetryConfig,
}

impl Transport {
    pub(crate) fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(config.danger_accept_invalid_certs);

        if let Some(ref proxy) = config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy {proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            http: builder.build()?,
            retry: config.retry.clone(),
        })
    }

    /// The underlying client, for building requests.
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Send `request`, retrying transient failures.
    pub(crate) async fn send(&self, request: &Request) -> Result<Response> {
        let retryable = is_idempotent(request.method());
        let mut attempt = 0;

        loop {
            let outgoing = request.try_clone().ok_or_else(|| {
                Error::InvalidInput("Request body cannot be replayed".to_string())
            })?;

            let can_retry = retryable && attempt < self.retry.max_retries;
            match self.http.execute(outgoing).await {
                Ok(response)
                    if can_retry && self.retry.should_retry_status(response.status().as_u16()) =>
                {
                    debug!(
                        "Server error {} from {}; retries remaining: {}",
                        response.status().as_u16(),
                        request.url(),
                        self.retry.max_retries - attempt
                    );
                }
                Ok(response) => return Ok(response),
                Err(e) if can_retry && is_transient(&e) => {
                    debug!(
                        "Request to {} failed: {}; retries remaining: {}",
                        request.url(),
                        e,
                        self.retry.max_retries - attempt
                    );
                }
                Err(e) if is_transient(&e) => return Err(Error::transport(e)),
                Err(e) => return Err(Error::Http(e)),
            }

            attempt += 1;
            let delay = self.retry.backoff_for_attempt(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

fn is_idempotent(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD || *method == Method::POST
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request()
}
