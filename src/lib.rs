//! # devapi-rs
//!
//! An async Rust client for a paginated, rate-limited dataset API.
//!
//! The client authenticates with either of the two supported credential
//! shapes, queries named datasets and pages through result sets lazily. It
//! recovers from transient failures and token expiry on its own.
//!
//! ## Features
//!
//! - **Authentication**: client credentials (v2) or a secret key (v3), with
//!   transparent token refresh on expiry and throttled token requests
//! - **Lazy paging**: records arrive as a [`futures_util::Stream`]; the next
//!   page is fetched only when the current one is used up
//! - **Filter chunking**: `in()` filters too long for one URL are split
//!   across requests automatically
//! - **Retries**: 5xx responses and connection failures are retried with
//!   exponential backoff
//! - **Export**: stream records straight into a CSV file
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures_util::StreamExt;
//! use devapi_rs::{in_, DevApiClient, QueryOptions};
//!
//! #[tokio::main]
//! async fn main() -> devapi_rs::Result<()> {
//!     let client = DevApiClient::v3("your-secret-key").await?;
//!
//!     let options = QueryOptions::new()
//!         .filter("uidparent", in_(["0000000001", "0000000002"]))
//!         .page_size(1000);
//!     let mut wells = client.query("well-origins", options)?;
//!
//!     while let Some(record) = wells.next().await {
//!         let record = record?;
//!         println!("{:?}", record.get("UID"));
//!     }
//!
//!     println!("{} active rigs", client.count("rigs", Default::default()).await?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod export;
pub mod models;
pub mod query;

// Re-export primary types at crate root for convenience
pub use api::DatasetService;
pub use auth::{Credentials, Session};
pub use client::{ClientConfig, DevApiClient, RetryConfig};
pub use error::{Error, Result};
pub use models::{ContinuationLink, Database, DatasetName, Record};
pub use query::{in_, in_list, QueryOptions, RecordStream};

/// Prelude module for convenient imports.
///
/// ```rust
/// use devapi_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api::DatasetService;
    pub use crate::auth::{Credentials, Session};
    pub use crate::client::{ClientConfig, DevApiClient, RetryConfig};
    pub use crate::error::{Error, Result};
    pub use crate::export::{to_csv, CsvOptions};
    pub use crate::models::{ContinuationLink, Database, DatasetName, Record};
    pub use crate::query::{in_, in_list, QueryOptions, RecordStream};
}
