//! Error types for the dataset API client.
//!
//! Three error kinds are terminal outcomes of talking to the API:
//! [`Error::Authentication`], [`Error::Query`] and [`Error::Dataset`].
//! The remaining variants wrap lower level failures (transport, JSON, I/O).

use thiserror::Error;

/// A specialized `Result` type for dataset API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for all dataset API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request could not be built or its body could not be read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Credentials are missing or the token endpoint rejected them
    #[error("Authentication failed: {message}")]
    Authentication {
        /// HTTP status returned by the token endpoint, if any
        status: Option<u16>,
        /// Human-readable message, including the response body
        message: String,
    },

    /// The data endpoint rejected the query or answered with a non-success status
    #[error("Query failed: status={status:?}, body={body}")]
    Query {
        /// HTTP status code, absent when the transport gave up before a response
        status: Option<u16>,
        /// Raw response body (or transport failure description)
        body: String,
        /// Underlying transport error after retries were exhausted
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The dataset name is unknown to the API (404)
    #[error("Invalid dataset name provided: {dataset}")]
    Dataset {
        /// Dataset that was requested
        dataset: String,
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Invalid input provided to a function
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// File system error while exporting records
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns `true` if this error is potentially transient and the
    /// operation could be retried by the caller.
    ///
    /// # Example
    ///
    /// ```
    /// use devapi_rs::Error;
    ///
    /// fn handle_error(err: Error) {
    ///     if err.is_retryable() {
    ///         println!("Retrying operation...");
    ///     }
    /// }
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::Query { status, source, .. } => {
                source.is_some() || status.is_some_and(|s| s >= 500)
            }
            _ => false,
        }
    }

    /// Returns `true` if this is an authentication-related error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    /// Returns `true` if the query parameters or the data endpoint response were rejected.
    pub fn is_query_error(&self) -> bool {
        matches!(self, Error::Query { .. })
    }

    /// Returns `true` if the requested dataset does not exist.
    pub fn is_dataset_error(&self) -> bool {
        matches!(self, Error::Dataset { .. })
    }

    /// HTTP status code that caused this error, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Authentication { status, .. } | Error::Query { status, .. } => *status,
            Error::Dataset { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn auth(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Authentication {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn query(status: u16, body: impl Into<String>) -> Self {
        Error::Query {
            status: Some(status),
            body: body.into(),
            source: None,
        }
    }

    pub(crate) fn transport(source: reqwest::Error) -> Self {
        Error::Query {
            status: None,
            body: source.to_string(),
            source: Some(source),
        }
    }
}
