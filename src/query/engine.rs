//! Paging engine: a lazy stream of records over a dataset endpoint.
//!
//! All continuation state of one query lives in a [`PagingState`] owned by
//! its [`RecordStream`]. The state moves into the in-flight page future and
//! comes back with the batch, so two queries on the same client never see
//! each other's links.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::chunk::{substitute, ChunkPlan};
use super::options::{header_map, QueryOptions};
use crate::client::validator::Endpoint;
use crate::client::ClientInner;
use crate::models::{ContinuationLink, DatasetName, Record};
use crate::{Error, Result};

/// Type alias for a boxed future used internally.
type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type BatchFuture = BoxFuture<'static, Result<(Vec<Record>, PagingState)>>;

/// Per-query paging state.
#[derive(Debug)]
pub(crate) struct PagingState {
    dataset: DatasetName,
    url: Url,
    params: Vec<(String, String)>,
    headers: HeaderMap,
    chunks: Option<ChunkPlan>,
    next: Option<ContinuationLink>,
    paging: bool,
    body_links: bool,
    issued: bool,
    finished: bool,
}

impl PagingState {
    pub(crate) fn new(inner: &ClientInner, dataset: DatasetName, options: QueryOptions) -> Result<Self> {
        let body_links = options.body_links();
        let parts = options.into_parts();
        let headers = header_map(&parts.headers)?;
        let resuming = parts.resume.is_some();
        // A resumed query continues inside whatever chunk it was on.
        let chunks = if resuming {
            None
        } else {
            ChunkPlan::detect(&parts.params)?
        };

        Ok(Self {
            url: inner.dataset_url(&dataset)?,
            dataset,
            params: parts.params,
            headers,
            chunks,
            next: parts.resume,
            paging: parts.paging,
            body_links,
            issued: resuming,
            finished: false,
        })
    }

    fn has_pending_chunks(&self) -> bool {
        self.chunks.as_ref().is_some_and(ChunkPlan::has_pending)
    }

    /// URL of the next request, or `None` once the result set is exhausted.
    fn next_request_url(&mut self, base: &Url) -> Result<Option<(Url, bool)>> {
        if let Some(link) = self.next.take() {
            return Ok(Some((link.resolve(base)?, false)));
        }
        if let Some(plan) = self.chunks.as_mut() {
            if let Some(filter) = plan.next_filter() {
                let field = plan.field().to_string();
                substitute(&mut self.params, &field, filter);
                return Ok(Some((self.url.clone(), true)));
            }
        }
        if !self.issued {
            return Ok(Some((self.url.clone(), true)));
        }
        Ok(None)
    }
}

/// Fetch the next non-empty batch (or learn that there is none).
async fn fetch_batch(
    inner: Arc<ClientInner>,
    mut state: PagingState,
) -> Result<(Vec<Record>, PagingState)> {
    loop {
        let Some((url, fresh)) = state.next_request_url(&inner.base_url)? else {
            state.finished = true;
            return Ok((Vec::new(), state));
        };
        state.issued = true;

        debug!("Requesting {} page: {}", state.dataset, url);
        let mut builder = inner
            .transport
            .http()
            .get(url)
            .headers(state.headers.clone());
        if fresh {
            builder = builder.query(&state.params);
        }

        let response = inner
            .execute(builder.build()?, Endpoint::Dataset(state.dataset.clone()))
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::query(
                status.as_u16(),
                format!("Non-200 response: {} {}", status.as_u16(), body),
            ));
        }

        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(Error::transport)?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        let page = inner
            .authenticator
            .protocol()
            .split_page(&headers, body, state.body_links)?;

        if page.records.is_empty() {
            state.next = None;
            if state.has_pending_chunks() {
                continue;
            }
            state.finished = true;
            return Ok((Vec::new(), state));
        }

        state.next = if state.paging { page.next } else { None };
        if !state.paging || (state.next.is_none() && !state.has_pending_chunks()) {
            state.finished = true;
        }
        return Ok((page.records, state));
    }
}

/// A stream that lazily pages through a dataset query.
///
/// Records are yielded in server order. The next page is requested only
/// after every record of the current page has been consumed. The first
/// error ends the stream.
///
/// # Example
///
/// ```no_run
/// use futures_util::StreamExt;
/// use devapi_rs::QueryOptions;
///
/// # async fn example(client: devapi_rs::DevApiClient) -> devapi_rs::Result<()> {
/// let mut stream = client.query("rigs", QueryOptions::new().page_size(1000))?;
///
/// while let Some(result) = stream.next().await {
///     let record = result?;
///     println!("{:?}", record.get("RigName"));
/// }
/// # Ok(())
/// # }
/// ```
pub struct RecordStream {
    inner: Arc<ClientInner>,
    /// Paging state while no fetch is in flight; `None` once finished.
    state: Option<PagingState>,
    /// Current page of records being yielded.
    current_items: VecDeque<Record>,
    /// Current in-flight fetch future.
    pending_fetch: Option<BatchFuture>,
}

impl RecordStream {
    pub(crate) fn open(
        inner: Arc<ClientInner>,
        dataset: DatasetName,
        options: QueryOptions,
    ) -> Result<Self> {
        let state = PagingState::new(&inner, dataset, options)?;
        Ok(Self {
            inner,
            state: Some(state),
            current_items: VecDeque::new(),
            pending_fetch: None,
        })
    }

    /// Link to the page after the one currently buffered, if any.
    ///
    /// Pass it to [`QueryOptions::resume_from`] to continue the result set
    /// in a new stream.
    pub fn continuation(&self) -> Option<&ContinuationLink> {
        self.state.as_ref().and_then(|state| state.next.as_ref())
    }

    /// Whether an oversized `in()` filter is being split across requests.
    pub fn is_chunked(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.chunks.is_some())
    }
}

impl Stream for RecordStream {
    type Item = Result<Record>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if let Some(record) = this.current_items.pop_front() {
                return Poll::Ready(Some(Ok(record)));
            }

            if let Some(ref mut fut) = this.pending_fetch {
                match fut.as_mut().poll(cx) {
                    Poll::Ready(Ok((records, state))) => {
                        this.pending_fetch = None;
                        this.current_items = records.into();
                        this.state = Some(state);
                        continue;
                    }
                    Poll::Ready(Err(e)) => {
                        this.pending_fetch = None;
                        this.state = None;
                        return Poll::Ready(Some(Err(e)));
                    }
                    Poll::Pending => return Poll::Pending,
                }
            }

            match this.state.take() {
                Some(state) if !state.finished => {
                    this.pending_fetch = Some(Box::pin(fetch_batch(this.inner.clone(), state)));
                }
                _ => return Poll::Ready(None),
            }
        }
    }
}

impl std::fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStream")
            .field("state", &self.state)
            .field("buffered", &self.current_items.len())
            .field("fetching", &self.pending_fetch.is_some())
            .finish()
    }
}
