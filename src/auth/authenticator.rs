//! Token acquisition against the token endpoint.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use url::Url;

use super::Session;
use crate::client::config::RetryConfig;
use crate::client::transport::Transport;
use crate::client::validator::{run_exchange, Endpoint, Exchange};
use crate::client::Protocol;
use crate::{Error, Result};

/// Obtains bearer tokens for one client.
#[derive(Debug)]
pub(crate) struct Authenticator {
    protocol: Arc<dyn Protocol>,
    token_url: Url,
}

impl Authenticator {
    pub(crate) fn new(protocol: Arc<dyn Protocol>, base_url: &Url) -> Result<Self> {
        Ok(Self {
            protocol,
            token_url: base_url.join("tokens")?,
        })
    }

    pub(crate) fn protocol(&self) -> &dyn Protocol {
        self.protocol.as_ref()
    }

    /// Request a new token and store it in `session`.
    ///
    /// A throttled (403) token request is resent after the configured delay
    /// until the throttle budget runs out. Any other failure is an
    /// authentication error.
    pub(crate) async fn obtain(
        &self,
        transport: &Transport,
        session: &Session,
        retry: &RetryConfig,
    ) -> Result<()> {
        let request = self
            .protocol
            .token_request(transport.http(), self.token_url.clone())?;
        let exchange = Exchange::new(Endpoint::Token, retry);

        let response = run_exchange(transport, request, exchange, None, || async {
            Err::<(), _>(Error::auth(None, "Token endpoint asked for a token refresh"))
        })
        .await?;

        let status = response.status().as_u16();
        let body: Value = response.json().await?;
        debug!(
            "Token response ({}): fields {:?}",
            self.protocol.name(),
            body.as_object().map(|o| o.keys().collect::<Vec<_>>())
        );

        let token = self.protocol.token_from(&body).ok_or_else(|| {
            Error::auth(
                Some(status),
                format!(
                    "Token response is missing the `{}` field",
                    self.protocol.token_field()
                ),
            )
        })?;
        session.replace_token(token).await;
        Ok(())
    }
}
