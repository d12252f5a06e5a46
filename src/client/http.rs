//! HTTP client implementation for the dataset API.

use std::sync::Arc;

use reqwest::{Request, Response};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::api::DatasetService;
use crate::auth::authenticator::Authenticator;
use crate::auth::{Credentials, Session};
use crate::models::{Database, DatasetName};
use crate::query::{QueryOptions, RecordStream};
use crate::Result;

use super::config::{with_trailing_slash, ClientConfig};
use super::transport::Transport;
use super::validator::{run_exchange, Endpoint, Exchange};

/// The main client for interacting with the dataset API.
///
/// The client owns one connection pool and one token session. Cloning it is
/// cheap and shares both; the pool is released when the last clone (and
/// every stream created from it) is dropped.
///
/// # Example
///
/// ```no_run
/// use futures_util::TryStreamExt;
/// use devapi_rs::{DevApiClient, QueryOptions};
///
/// # async fn example() -> devapi_rs::Result<()> {
/// let client = DevApiClient::v3("your-secret-key").await?;
///
/// let wells: Vec<_> = client
///     .query("wells", QueryOptions::new().filter("deleteddate", "null").page_size(1000))?
///     .try_collect()
///     .await?;
/// println!("Fetched {} wells", wells.len());
/// # Ok(())
/// # }
/// ```
pub struct DevApiClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) transport: Transport,
    pub(crate) session: Session,
    pub(crate) authenticator: Authenticator,
    pub(crate) base_url: Url,
    pub(crate) config: ClientConfig,
}

impl DevApiClient {
    /// Connect to version 2 of the API with client credentials.
    pub async fn v2(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        Self::connect(
            Credentials::client_credentials(client_id, client_secret),
            ClientConfig::default(),
        )
        .await
    }

    /// Connect to version 3 of the API with a secret key.
    pub async fn v3(secret_key: impl Into<String>) -> Result<Self> {
        Self::connect(Credentials::secret_key(secret_key), ClientConfig::default()).await
    }

    /// Create a client and obtain its first access token.
    pub async fn connect(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        let client = Self::build(credentials, None, config)?;
        client.refresh_token().await?;
        Ok(client)
    }

    /// Create a client around an existing access token.
    ///
    /// No token request is made up front; the credentials are kept so the
    /// token can be refreshed when the server reports it expired.
    pub fn with_access_token(
        credentials: Credentials,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        Self::build(credentials, Some(access_token.into()), config)
    }

    fn build(
        credentials: Credentials,
        access_token: Option<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let protocol = credentials.into_protocol();
        let base_url = match config.base_url {
            Some(ref url) => with_trailing_slash(url.clone()),
            None => Url::parse(protocol.default_base_url())?,
        };
        let transport = Transport::new(&config)?;
        let authenticator = Authenticator::new(protocol, &base_url)?;
        debug!(
            "Created {} client for {}",
            authenticator.protocol().name(),
            base_url
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                transport,
                session: Session::new(access_token),
                authenticator,
                base_url,
                config,
            }),
        })
    }

    /// Get the service for one dataset.
    pub fn dataset(&self, name: impl Into<DatasetName>) -> DatasetService {
        DatasetService::new(self.inner.clone(), name.into())
    }

    /// Query a dataset. See [`DatasetService::query`].
    pub fn query(
        &self,
        dataset: impl Into<DatasetName>,
        options: QueryOptions,
    ) -> Result<RecordStream> {
        self.dataset(dataset).query(options)
    }

    /// Count matching records. See [`DatasetService::count`].
    pub async fn count(
        &self,
        dataset: impl Into<DatasetName>,
        options: QueryOptions,
    ) -> Result<u64> {
        self.dataset(dataset).count(options).await
    }

    /// Fetch the DDL of a dataset. See [`DatasetService::ddl`].
    pub async fn ddl(&self, dataset: impl Into<DatasetName>, database: Database) -> Result<String> {
        self.dataset(dataset).ddl(database).await
    }

    /// Fetch the documentation of a dataset. See [`DatasetService::docs`].
    pub async fn docs(&self, dataset: impl Into<DatasetName>) -> Result<Option<Value>> {
        self.dataset(dataset).docs().await
    }

    /// Obtain a new access token now.
    pub async fn refresh_token(&self) -> Result<()> {
        self.inner.refresh_token().await
    }

    /// The current access token, e.g. to share with another client.
    pub async fn access_token(&self) -> Option<String> {
        self.inner.session.access_token().await
    }

    /// Get a reference to the session.
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// API root this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Name of the protocol variant in use (`"v2"` or `"v3"`).
    pub fn protocol_name(&self) -> &'static str {
        self.inner.authenticator.protocol().name()
    }

    /// Release this handle. Connections close once no clone or stream
    /// still uses them.
    pub fn close(self) {
        debug!(
            "Closing client handle ({} other users of the connection pool)",
            Arc::strong_count(&self.inner) - 1
        );
    }
}

impl ClientInner {
    pub(crate) fn dataset_url(&self, dataset: &DatasetName) -> Result<Url> {
        Ok(self.base_url.join(dataset.as_str())?)
    }

    pub(crate) async fn refresh_token(&self) -> Result<()> {
        self.authenticator
            .obtain(&self.transport, &self.session, &self.config.retry)
            .await
    }

    /// Send a request to a data endpoint with token refresh on 401.
    ///
    /// Statuses the validator does not map to an error are returned as-is.
    pub(crate) async fn execute(&self, request: Request, endpoint: Endpoint) -> Result<Response> {
        let exchange = Exchange::new(endpoint, &self.config.retry);
        run_exchange(
            &self.transport,
            request,
            exchange,
            Some(&self.session),
            move || self.refresh_token(),
        )
        .await
    }
}

impl Clone for DevApiClient {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl std::fmt::Debug for DevApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevApiClient")
            .field("protocol", &self.protocol_name())
            .field("base_url", &self.inner.base_url.as_str())
            .field("config", &self.inner.config)
            .finish()
    }
}
