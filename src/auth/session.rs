//! Token state held for the lifetime of a client.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;

use crate::{Error, Result};

/// Bearer token state of a client.
///
/// The token's expiry is enforced by the server and not tracked locally;
/// a 401 from a data endpoint triggers a refresh, which replaces the token
/// wholesale.
pub struct Session {
    inner: RwLock<SessionInner>,
}

struct SessionInner {
    access_token: Option<SecretString>,
    tokens_obtained: u32,
}

impl Session {
    pub(crate) fn new(access_token: Option<String>) -> Self {
        Self {
            inner: RwLock::new(SessionInner {
                access_token: access_token.map(SecretString::from),
                tokens_obtained: 0,
            }),
        }
    }

    /// Whether a bearer token is currently held.
    pub async fn has_token(&self) -> bool {
        self.inner.read().await.access_token.is_some()
    }

    /// The current access token.
    ///
    /// Hand this to another client (`DevApiClient::with_access_token`) to
    /// skip its initial token request.
    pub async fn access_token(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .access_token
            .as_ref()
            .map(|t| t.expose_secret().to_string())
    }

    /// Number of tokens fetched from the token endpoint by this session.
    pub async fn tokens_obtained(&self) -> u32 {
        self.inner.read().await.tokens_obtained
    }

    pub(crate) async fn replace_token(&self, token: String) {
        let mut inner = self.inner.write().await;
        inner.access_token = Some(SecretString::from(token));
        inner.tokens_obtained += 1;
    }

    /// Stamp the current bearer token onto outgoing request headers.
    pub(crate) async fn authorize(&self, headers: &mut HeaderMap) -> Result<()> {
        let inner = self.inner.read().await;
        if let Some(ref token) = inner.access_token {
            let mut value = HeaderValue::from_str(&format!("bearer {}", token.expose_secret()))
                .map_err(|_| Error::InvalidInput("Invalid token format".to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session::new(Some("super-secret-token".to_string()));
        let debug_str = format!("{:?}", session);

        assert!(!debug_str.contains("super-secret-token"));
        assert!(debug_str.contains("REDACTED"));
    }

    #[tokio::test]
    async fn test_replace_token_updates_authorization() {
        let session = Session::new(Some("old".to_string()));
        let mut headers = HeaderMap::new();
        session.authorize(&mut headers).await.unwrap();
        assert_eq!(headers[AUTHORIZATION], "bearer old");

        session.replace_token("new".to_string()).await;
        session.authorize(&mut headers).await.unwrap();
        assert_eq!(headers[AUTHORIZATION], "bearer new");
        assert_eq!(session.tokens_obtained().await, 1);
        assert_eq!(session.access_token().await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_no_token_leaves_headers_alone() {
        let session = Session::new(None);
        let mut headers = HeaderMap::new();
        session.authorize(&mut headers).await.unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
        assert!(!session.has_token().await);
    }
}
