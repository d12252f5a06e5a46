//! Dataset service: query, count, DDL and documentation endpoints.

use std::sync::Arc;

use reqwest::{Method, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::validator::Endpoint;
use crate::client::ClientInner;
use crate::models::{Database, DatasetName};
use crate::query::{header_map, QueryOptions, RecordStream};
use crate::{Error, Result};

/// Response header carrying the number of records a query matches.
pub const RECORD_COUNT_HEADER: &str = "X-Query-Record-Count";

/// Service for one named dataset.
///
/// # Example
///
/// ```no_run
/// use futures_util::TryStreamExt;
/// use devapi_rs::{Database, QueryOptions};
///
/// # async fn example(client: devapi_rs::DevApiClient) -> devapi_rs::Result<()> {
/// let rigs = client.dataset("rigs");
///
/// let total = rigs.count(QueryOptions::new().filter("deleteddate", "null")).await?;
/// println!("{total} active rigs");
///
/// let ddl = rigs.ddl(Database::Pg).await?;
/// println!("{ddl}");
///
/// let first_page: Vec<_> = rigs
///     .query(QueryOptions::new().page_size(100).paging(false))?
///     .try_collect()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct DatasetService {
    inner: Arc<ClientInner>,
    dataset: DatasetName,
}

impl DatasetService {
    pub(crate) fn new(inner: Arc<ClientInner>, dataset: DatasetName) -> Self {
        Self { inner, dataset }
    }

    /// Name of the dataset.
    pub fn name(&self) -> &DatasetName {
        &self.dataset
    }

    /// Open a lazy record stream for this dataset.
    ///
    /// No request is sent until the stream is first polled.
    ///
    /// # Errors
    ///
    /// Fails up front on invalid headers or when more than one `in()`
    /// filter is too long to send in a single request.
    pub fn query(&self, options: QueryOptions) -> Result<RecordStream> {
        RecordStream::open(self.inner.clone(), self.dataset.clone(), options)
    }

    /// Number of records matching `options`, from a HEAD request.
    ///
    /// Paging options are ignored.
    pub async fn count(&self, options: QueryOptions) -> Result<u64> {
        let headers = header_map(options.headers())?;
        let request = self
            .inner
            .transport
            .http()
            .request(Method::HEAD, self.inner.dataset_url(&self.dataset)?)
            .query(options.params())
            .headers(headers)
            .build()?;

        debug!("Counting records in {}", self.dataset);
        let response = self.send(request).await?;
        let response = ensure_success(response).await?;

        let raw = response
            .headers()
            .get(RECORD_COUNT_HEADER)
            .ok_or_else(|| {
                Error::query(
                    response.status().as_u16(),
                    format!("Response has no {RECORD_COUNT_HEADER} header"),
                )
            })?
            .to_str()
            .unwrap_or_default();
        raw.trim().parse().map_err(|_| {
            Error::query(
                response.status().as_u16(),
                format!("Invalid {RECORD_COUNT_HEADER} header: {raw:?}"),
            )
        })
    }

    /// DDL statement for creating this dataset's table, as returned.
    pub async fn ddl(&self, database: Database) -> Result<String> {
        debug!("Retrieving DDL for dataset: {}", self.dataset);
        let response = self.get(&[("ddl", database.as_str())]).await?;
        ensure_success(response)
            .await?
            .text()
            .await
            .map_err(Error::transport)
    }

    /// Field documentation for this dataset.
    ///
    /// Returns `None` when the dataset does not support documentation
    /// requests.
    pub async fn docs(&self) -> Result<Option<Value>> {
        debug!("Retrieving docs for dataset: {}", self.dataset);
        let response = self.get(&[("docs", "true")]).await?;
        if response.status() == StatusCode::NOT_IMPLEMENTED {
            warn!(
                "docs and example params are not yet supported on dataset {}",
                self.dataset
            );
            return Ok(None);
        }
        let bytes = ensure_success(response)
            .await?
            .bytes()
            .await
            .map_err(Error::transport)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn get(&self, params: &[(&str, &str)]) -> Result<Response> {
        let request = self
            .inner
            .transport
            .http()
            .get(self.inner.dataset_url(&self.dataset)?)
            .query(params)
            .build()?;
        self.send(request).await
    }

    async fn send(&self, request: reqwest::Request) -> Result<Response> {
        self.inner
            .execute(request, Endpoint::Dataset(self.dataset.clone()))
            .await
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::query(
        status.as_u16(),
        format!("Non-200 response: {} {}", status.as_u16(), body),
    ))
}

impl std::fmt::Debug for DatasetService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetService")
            .field("dataset", &self.dataset)
            .finish()
    }
}
