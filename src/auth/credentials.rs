//! Credential shapes accepted by the two API generations.

use std::sync::Arc;

use secrecy::SecretString;

use crate::client::{Protocol, V2Protocol, V3Protocol};
use crate::{Error, Result};

/// Environment variable holding a version 3 secret key.
pub const SECRET_KEY_VAR: &str = "DEVAPI_SECRET_KEY";
/// Environment variable holding a version 2 client id.
pub const CLIENT_ID_VAR: &str = "DEVAPI_CLIENT_ID";
/// Environment variable holding a version 2 client secret.
pub const CLIENT_SECRET_VAR: &str = "DEVAPI_CLIENT_SECRET";

/// Credentials used to obtain access tokens.
///
/// The variant also selects the API generation: client credentials talk to
/// version 2, a secret key talks to version 3.
#[derive(Debug)]
pub enum Credentials {
    /// Client id + client secret (version 2)
    ClientCredentials {
        /// Client id
        client_id: String,
        /// Client secret
        client_secret: SecretString,
    },
    /// Single secret key (version 3)
    SecretKey(SecretString),
}

impl Credentials {
    /// Version 2 client credentials.
    pub fn client_credentials(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Credentials::ClientCredentials {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
        }
    }

    /// Version 3 secret key.
    pub fn secret_key(secret_key: impl Into<String>) -> Self {
        Credentials::SecretKey(SecretString::from(secret_key.into()))
    }

    /// Read credentials from the environment.
    ///
    /// `DEVAPI_SECRET_KEY` wins over `DEVAPI_CLIENT_ID` + `DEVAPI_CLIENT_SECRET`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(key) = lookup(SECRET_KEY_VAR) {
            return Ok(Self::secret_key(key));
        }
        match (lookup(CLIENT_ID_VAR), lookup(CLIENT_SECRET_VAR)) {
            (Some(id), Some(secret)) => Ok(Self::client_credentials(id, secret)),
            _ => Err(Error::Config(format!(
                "Set {SECRET_KEY_VAR}, or both {CLIENT_ID_VAR} and {CLIENT_SECRET_VAR}"
            ))),
        }
    }

    pub(crate) fn into_protocol(self) -> Arc<dyn Protocol> {
        match self {
            Credentials::ClientCredentials {
                client_id,
                client_secret,
            } => Arc::new(V2Protocol::new(client_id, client_secret)),
            Credentials::SecretKey(key) => Arc::new(V3Protocol::new(key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_secret_key_wins() {
        let creds = Credentials::from_lookup(lookup(&[
            (SECRET_KEY_VAR, "key"),
            (CLIENT_ID_VAR, "id"),
            (CLIENT_SECRET_VAR, "secret"),
        ]))
        .unwrap();
        assert_eq!(creds.into_protocol().name(), "v3");
    }

    #[test]
    fn test_client_credentials_from_env() {
        let creds = Credentials::from_lookup(lookup(&[
            (CLIENT_ID_VAR, "id"),
            (CLIENT_SECRET_VAR, "secret"),
        ]))
        .unwrap();
        assert_eq!(creds.into_protocol().name(), "v2");
    }

    #[test]
    fn test_missing_env_is_config_error() {
        let err = Credentials::from_lookup(lookup(&[(CLIENT_ID_VAR, "id")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::client_credentials("id", "top-secret");
        assert!(!format!("{creds:?}").contains("top-secret"));
    }
}
