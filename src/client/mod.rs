//! HTTP client, transport, response validation and protocol variants.
//!
//! This module provides the main entry point [`DevApiClient`].
//!
//! # Example
//!
//! ```no_run
//! use devapi_rs::{ClientConfig, Credentials, DevApiClient, RetryConfig};
//!
//! # async fn example() -> devapi_rs::Result<()> {
//! let config = ClientConfig::default()
//!     .with_retry(RetryConfig::default().with_max_retries(3));
//!
//! let client = DevApiClient::connect(
//!     Credentials::client_credentials("client-id", "client-secret"),
//!     config,
//! ).await?;
//!
//! let count = client.count("rigs", Default::default()).await?;
//! # Ok(())
//! # }
//! ```

pub(crate) mod config;
mod http;
pub mod protocol;
pub(crate) mod transport;
pub(crate) mod validator;

pub use config::{ClientConfig, RetryConfig};
pub use http::DevApiClient;
pub(crate) use http::ClientInner;
pub use protocol::{Page, Protocol, V2Protocol, V3Protocol};
