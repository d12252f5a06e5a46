//! Primitive types and newtypes for type-safe API interactions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single data row returned by a dataset endpoint.
///
/// Records are opaque: a mapping of field name to JSON value. Fields are
/// kept sorted by name, not in the order the server sent them.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A strongly-typed dataset name (e.g. `"wells"`, `"rigs"`).
///
/// # Example
///
/// ```
/// use devapi_rs::DatasetName;
///
/// let dataset = DatasetName::new("well-origins");
/// assert_eq!(dataset.as_str(), "well-origins");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetName(String);

impl DatasetName {
    /// Create a new dataset name from a string.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the dataset name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for DatasetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for DatasetName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DatasetName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Database dialect for DDL requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    /// Microsoft SQL Server
    Mssql,
    /// PostgreSQL
    Pg,
}

impl Database {
    /// Query parameter value understood by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Database::Mssql => "mssql",
            Database::Pg => "pg",
        }
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
