//! Protocol variants of the dataset API.
//!
//! Both API generations share the query and paging algorithm. They differ
//! in how a token is requested, which response field carries it, and where
//! the next-page link lives. [`Protocol`] captures exactly those differences.

use std::fmt;

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Request;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use url::Url;

use crate::models::{ContinuationLink, Record};
use crate::{Error, Result};

/// One page of a result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Records in server order
    pub records: Vec<Record>,
    /// Link to the following page, if the server advertised one
    pub next: Option<ContinuationLink>,
}

/// Capabilities that distinguish one API generation from another.
pub trait Protocol: Send + Sync + fmt::Debug {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Base URL used when the configuration does not override it.
    fn default_base_url(&self) -> &'static str;

    /// Build the credential-specific token request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] when the credentials are missing.
    fn token_request(&self, http: &reqwest::Client, token_url: Url) -> Result<Request>;

    /// JSON field of the token response that carries the access token.
    fn token_field(&self) -> &'static str;

    /// Extract the access token from a token response body.
    fn token_from(&self, body: &Value) -> Option<String> {
        body.get(self.token_field())
            .and_then(Value::as_str)
            .map(String::from)
    }

    /// Split a data response into records and the next-page link.
    ///
    /// `body_links` is set when the caller asked the server to move links
    /// from the `Link` header into the body.
    fn split_page(&self, headers: &HeaderMap, body: Value, _body_links: bool) -> Result<Page> {
        Ok(Page {
            records: records_from(body)?,
            next: ContinuationLink::from_headers(headers),
        })
    }
}

/// Turn a response body into a batch. A lone object is a one-record batch.
pub(crate) fn records_from(body: Value) -> Result<Vec<Record>> {
    match body {
        Value::Null => Ok(Vec::new()),
        Value::Object(record) => Ok(vec![record]),
        other => Ok(serde_json::from_value(other)?),
    }
}

/// Version 2: client id + secret sent as HTTP Basic credentials.
#[derive(Debug)]
pub struct V2Protocol {
    client_id: String,
    client_secret: SecretString,
}

impl V2Protocol {
    /// Default API root for version 2.
    pub const BASE_URL: &'static str = "https://di-api.drillinginfo.com/v2/direct-access/";

    /// Create the variant from its credentials.
    pub fn new(client_id: impl Into<String>, client_secret: SecretString) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
        }
    }
}

impl Protocol for V2Protocol {
    fn name(&self) -> &'static str {
        "v2"
    }

    fn default_base_url(&self) -> &'static str {
        Self::BASE_URL
    }

    fn token_request(&self, http: &reqwest::Client, token_url: Url) -> Result<Request> {
        if self.client_id.is_empty() || self.client_secret.expose_secret().is_empty() {
            return Err(Error::auth(
                None,
                "CLIENT_ID and CLIENT_SECRET are required to generate an access token",
            ));
        }

        Ok(http
            .post(token_url)
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .query(&[("grant_type", "client_credentials")])
            .build()?)
    }

    fn token_field(&self) -> &'static str {
        "access_token"
    }
}

/// Version 3: a single secret key exchanged for a token via a JSON body.
#[derive(Debug)]
pub struct V3Protocol {
    secret_key: SecretString,
}

impl V3Protocol {
    /// Default API root for version 3.
    pub const BASE_URL: &'static str = "https://api.enverus.com/v3/direct-access/";

    /// Create the variant from its secret key.
    pub fn new(secret_key: SecretString) -> Self {
        Self { secret_key }
    }
}

impl Protocol for V3Protocol {
    fn name(&self) -> &'static str {
        "v3"
    }

    fn default_base_url(&self) -> &'static str {
        Self::BASE_URL
    }

    fn token_request(&self, http: &reqwest::Client, token_url: Url) -> Result<Request> {
        if self.secret_key.expose_secret().is_empty() {
            return Err(Error::auth(
                None,
                "SECRET_KEY is required to generate an access token",
            ));
        }

        Ok(http
            .post(token_url)
            .json(&serde_json::json!({ "secretKey": self.secret_key.expose_secret() }))
            .build()?)
    }

    fn token_field(&self) -> &'static str {
        "token"
    }

    fn split_page(&self, headers: &HeaderMap, body: Value, body_links: bool) -> Result<Page> {
        match body {
            Value::Object(mut envelope) if body_links && envelope.contains_key("data") => {
                let next = envelope
                    .get("links")
                    .and_then(|links| links.get("next"))
                    .and_then(Value::as_str)
                    .and_then(ContinuationLink::from_body_value);
                let data = envelope.remove("data").unwrap_or(Value::Null);
                Ok(Page {
                    records: records_from(data)?,
                    next,
                })
            }
            body => Ok(Page {
                records: records_from(body)?,
                next: ContinuationLink::from_headers(headers),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, AUTHORIZATION, LINK};
    use serde_json::json;

    fn token_url() -> Url {
        Url::parse("https://api.example.com/v2/direct-access/tokens").unwrap()
    }

    #[test]
    fn test_records_from_shapes() {
        assert_eq!(records_from(json!([{"id": 1}, {"id": 2}])).unwrap().len(), 2);
        assert_eq!(records_from(json!({"id": 1})).unwrap().len(), 1);
        assert!(records_from(json!([])).unwrap().is_empty());
        assert!(records_from(json!([1, 2])).is_err());
    }

    #[test]
    fn test_v2_token_request() {
        let protocol = V2Protocol::new("id", SecretString::from("secret".to_string()));
        let request = protocol
            .token_request(&reqwest::Client::new(), token_url())
            .unwrap();

        assert_eq!(*request.method(), reqwest::Method::POST);
        assert_eq!(request.url().query(), Some("grant_type=client_credentials"));
        let auth = request.headers().get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert!(auth.starts_with("Basic "));
    }

    #[test]
    fn test_missing_credentials() {
        let v2 = V2Protocol::new("", SecretString::from("secret".to_string()));
        let err = v2.token_request(&reqwest::Client::new(), token_url()).unwrap_err();
        assert!(err.is_auth_error());

        let v3 = V3Protocol::new(SecretString::from(String::new()));
        let err = v3.token_request(&reqwest::Client::new(), token_url()).unwrap_err();
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_token_fields() {
        let v2 = V2Protocol::new("id", SecretString::from("s".to_string()));
        let v3 = V3Protocol::new(SecretString::from("k".to_string()));
        assert_eq!(v2.token_from(&json!({"access_token": "abc"})), Some("abc".into()));
        assert_eq!(v3.token_from(&json!({"token": "xyz"})), Some("xyz".into()));
        assert_eq!(v3.token_from(&json!({"access_token": "abc"})), None);
    }

    #[test]
    fn test_header_links() {
        let v2 = V2Protocol::new("id", SecretString::from("s".to_string()));
        let mut headers = HeaderMap::new();
        headers.insert(LINK, HeaderValue::from_static(r#"</wells?page=2>; rel="next""#));

        let page = v2.split_page(&headers, json!([{"id": 1}]), false).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.next.unwrap().url(), "/wells?page=2");
    }

    #[test]
    fn test_v3_body_links() {
        let v3 = V3Protocol::new(SecretString::from("k".to_string()));
        let body = json!({
            "data": [{"id": 1}, {"id": 2}],
            "links": {"next": "</wells?next_page=abc>; rel=\"next\""}
        });

        let page = v3.split_page(&HeaderMap::new(), body, true).unwrap();
        assert_eq!(page.records.len(), 2);
        assert!(matches!(page.next, Some(ContinuationLink::Descriptor(_))));

        let last = json!({"data": [{"id": 3}], "links": {"next": null}});
        let page = v3.split_page(&HeaderMap::new(), last, true).unwrap();
        assert_eq!(page.records.len(), 1);
        assert!(page.next.is_none());
    }
}
