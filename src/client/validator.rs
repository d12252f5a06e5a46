//! Response validation and in-place recovery.
//!
//! Every response is classified against the endpoint it came from. A 401
//! on a data endpoint refreshes the token and resends the request once. A
//! 403 on the token endpoint waits and resends, spending the throttle budget.
//! The remaining statuses either pass through or become typed errors.
//!
//! Recovery is modelled as a small state machine ([`ExchangeState`]) driven
//! by [`run_exchange`], so the refresh guard and the throttle budget live in
//! one place ([`Exchange`]).

use std::future::Future;
use std::time::Duration;

use reqwest::{Request, Response, StatusCode};
use tracing::{debug, warn};

use super::config::RetryConfig;
use super::transport::Transport;
use crate::auth::Session;
use crate::models::DatasetName;
use crate::{Error, Result};

/// The kind of endpoint a request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Endpoint {
    /// The token endpoint (`<base>/tokens`)
    Token,
    /// A dataset endpoint (`<base>/<dataset>`)
    Dataset(DatasetName),
}

/// What the validator makes of a single status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Accept,
    RefreshToken,
    Throttle,
    Reject(Rejection),
    /// Non-success status left for the caller to surface
    PassThrough,
}

/// Terminal error kinds produced by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    Auth,
    Query,
    Dataset,
}

pub(crate) fn classify(status: StatusCode, endpoint: &Endpoint) -> Verdict {
    if status.is_success() {
        return Verdict::Accept;
    }
    match (status.as_u16(), endpoint) {
        (400, Endpoint::Token) => Verdict::Reject(Rejection::Auth),
        (400, Endpoint::Dataset(_)) => Verdict::Reject(Rejection::Query),
        // The token endpoint cannot be fixed by asking it for another token.
        (401, Endpoint::Token) => Verdict::Reject(Rejection::Auth),
        (401, Endpoint::Dataset(_)) => Verdict::RefreshToken,
        (403, Endpoint::Token) => Verdict::Throttle,
        (404, Endpoint::Dataset(_)) => Verdict::Reject(Rejection::Dataset),
        (_, Endpoint::Token) => Verdict::Reject(Rejection::Auth),
        _ => Verdict::PassThrough,
    }
}

/// States of a single request/response exchange.
#[derive(Debug)]
pub(crate) enum ExchangeState<R> {
    Send,
    AwaitResponse(R),
    Refresh,
    RetryDelay(Duration),
    Done(R),
    Failed(Rejection, R),
}

/// Bookkeeping for one logical request: whether the token was already
/// refreshed and how many throttled resends remain.
#[derive(Debug)]
pub(crate) struct Exchange {
    endpoint: Endpoint,
    refreshed: bool,
    throttle_left: u32,
    throttle_delay: Duration,
}

impl Exchange {
    pub(crate) fn new(endpoint: Endpoint, retry: &RetryConfig) -> Self {
        Self {
            endpoint,
            refreshed: false,
            throttle_left: retry.throttle_retries,
            throttle_delay: retry.throttle_delay,
        }
    }

    /// Transition out of `AwaitResponse` for a response with `status`.
    pub(crate) fn on_response<R>(&mut self, status: StatusCode, response: R) -> ExchangeState<R> {
        match classify(status, &self.endpoint) {
            Verdict::Accept | Verdict::PassThrough => ExchangeState::Done(response),
            Verdict::RefreshToken if !self.refreshed => {
                self.refreshed = true;
                ExchangeState::Refresh
            }
            // A fresh token did not help; the credentials themselves are bad.
            Verdict::RefreshToken => ExchangeState::Failed(Rejection::Auth, response),
            Verdict::Throttle if self.throttle_left > 0 => {
                self.throttle_left -= 1;
                debug!("Retries remaining: {}", self.throttle_left);
                ExchangeState::RetryDelay(self.throttle_delay)
            }
            Verdict::Throttle => ExchangeState::Failed(Rejection::Auth, response),
            Verdict::Reject(rejection) => ExchangeState::Failed(rejection, response),
        }
    }

    pub(crate) fn rejection_error(&self, rejection: Rejection, status: u16, body: String) -> Error {
        match (rejection, &self.endpoint) {
            (Rejection::Dataset, Endpoint::Dataset(dataset)) => Error::Dataset {
                dataset: dataset.to_string(),
                status,
                body,
            },
            (Rejection::Auth, Endpoint::Token) => Error::auth(
                Some(status),
                format!("Error getting token. Code: {status} Message: {body}"),
            ),
            (Rejection::Auth, Endpoint::Dataset(_)) => Error::auth(
                Some(status),
                format!("Request still unauthorized after token refresh: {body}"),
            ),
            _ => Error::query(status, body),
        }
    }
}

/// Drive one exchange to completion.
///
/// `session` (when given) stamps the current bearer token onto the request
/// before every send; `refresh` obtains a new token when the exchange asks
/// for one.
pub(crate) async fn run_exchange<F, Fut>(
    transport: &Transport,
    mut request: Request,
    mut exchange: Exchange,
    session: Option<&Session>,
    mut refresh: F,
) -> Result<Response>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut state = ExchangeState::Send;
    loop {
        state = match state {
            ExchangeState::Send => {
                if let Some(session) = session {
                    session.authorize(request.headers_mut()).await?;
                }
                ExchangeState::AwaitResponse(transport.send(&request).await?)
            }
            ExchangeState::AwaitResponse(response) => {
                let status = response.status();
                if !status.is_success() {
                    debug!("Response status code: {} ({})", status.as_u16(), response.url());
                }
                exchange.on_response(status, response)
            }
            ExchangeState::Refresh => {
                warn!("Access token expired. Acquiring a new one...");
                refresh().await?;
                ExchangeState::Send
            }
            ExchangeState::RetryDelay(delay) => {
                warn!("Throttled token request. Waiting {} seconds...", delay.as_secs_f64());
                tokio::time::sleep(delay).await;
                ExchangeState::Send
            }
            ExchangeState::Done(response) => return Ok(response),
            ExchangeState::Failed(rejection, response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                debug!("Response text: {}", body);
                return Err(exchange.rejection_error(rejection, status, body));
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Endpoint {
        Endpoint::Dataset(DatasetName::new("wells"))
    }

    fn status(code: u16) -> StatusCode {
        StatusCode::from_u16(code).unwrap()
    }

    #[test]
    fn test_classify_table() {
        assert_eq!(classify(status(200), &dataset()), Verdict::Accept);
        assert_eq!(classify(status(400), &Endpoint::Token), Verdict::Reject(Rejection::Auth));
        assert_eq!(classify(status(400), &dataset()), Verdict::Reject(Rejection::Query));
        assert_eq!(classify(status(401), &dataset()), Verdict::RefreshToken);
        assert_eq!(classify(status(403), &Endpoint::Token), Verdict::Throttle);
        assert_eq!(classify(status(404), &dataset()), Verdict::Reject(Rejection::Dataset));
        assert_eq!(classify(status(403), &dataset()), Verdict::PassThrough);
        assert_eq!(classify(status(501), &dataset()), Verdict::PassThrough);
        assert_eq!(classify(status(503), &Endpoint::Token), Verdict::Reject(Rejection::Auth));
    }

    #[test]
    fn test_refresh_only_once() {
        let mut exchange = Exchange::new(dataset(), &RetryConfig::default());
        assert!(matches!(
            exchange.on_response(status(401), ()),
            ExchangeState::Refresh
        ));
        assert!(matches!(
            exchange.on_response(status(401), ()),
            ExchangeState::Failed(Rejection::Auth, ())
        ));
    }

    #[test]
    fn test_throttle_budget_exhausts() {
        let retry = RetryConfig::default()
            .with_throttle_retries(2)
            .with_throttle_delay(Duration::from_millis(5));
        let mut exchange = Exchange::new(Endpoint::Token, &retry);

        for _ in 0..2 {
            match exchange.on_response(status(403), ()) {
                ExchangeState::RetryDelay(delay) => assert_eq!(delay, Duration::from_millis(5)),
                other => panic!("Expected RetryDelay, got {other:?}"),
            }
        }
        assert!(matches!(
            exchange.on_response(status(403), ()),
            ExchangeState::Failed(Rejection::Auth, ())
        ));
    }

    #[test]
    fn test_rejection_errors() {
        let exchange = Exchange::new(dataset(), &RetryConfig::default());
        let err = exchange.rejection_error(Rejection::Dataset, 404, "not found".into());
        assert!(err.is_dataset_error());
        assert_eq!(err.status(), Some(404));

        let err = exchange.rejection_error(Rejection::Query, 400, "bad field".into());
        assert!(err.is_query_error());
        assert!(err.to_string().contains("bad field"));

        let token = Exchange::new(Endpoint::Token, &RetryConfig::default());
        let err = token.rejection_error(Rejection::Auth, 400, "invalid_client".into());
        assert!(err.is_auth_error());
        assert!(err.to_string().contains("invalid_client"));
    }
}
