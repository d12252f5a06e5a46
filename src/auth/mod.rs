//! Authentication for the dataset API.
//!
//! Two credential shapes are supported:
//!
//! 1. **Client credentials** (version 2) - client id + secret sent as HTTP
//!    Basic credentials; the token comes back as `access_token`.
//! 2. **Secret key** (version 3) - a single key posted as JSON; the token
//!    comes back as `token`.
//!
//! ```no_run
//! use devapi_rs::{ClientConfig, Credentials, DevApiClient};
//!
//! # async fn example() -> devapi_rs::Result<()> {
//! let client = DevApiClient::connect(
//!     Credentials::secret_key("your-secret-key"),
//!     ClientConfig::default(),
//! ).await?;
//! # Ok(())
//! # }
//! ```

pub(crate) mod authenticator;
mod credentials;
mod session;

pub use credentials::{Credentials, CLIENT_ID_VAR, CLIENT_SECRET_VAR, SECRET_KEY_VAR};
pub use session::Session;
