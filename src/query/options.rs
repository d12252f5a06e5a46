//! Query options and the `in()` filter helper.

use std::fmt::Display;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::models::ContinuationLink;
use crate::{Error, Result};

/// Reserved option controlling whether further pages are followed.
pub const PAGING_OPTION: &str = "paging";
/// Reserved option setting the number of records per page.
pub const PAGE_SIZE_OPTION: &str = "pagesize";
/// Request header that moves next-page links from the `Link` header into the body.
pub const OMIT_HEADER_NEXT_LINKS: &str = "X-Omit-Header-Next-Links";

/// Filters and control options for a single query.
///
/// Filters become query parameters in insertion order; setting a field
/// twice replaces the earlier value. The `paging` option is consumed by the
/// client and never sent.
///
/// # Example
///
/// ```
/// use devapi_rs::{in_, QueryOptions};
///
/// let options = QueryOptions::new()
///     .filter("deleteddate", "null")
///     .filter("uidparent", in_(&[1001, 1002, 1003]))
///     .page_size(1000);
/// assert_eq!(options.get("uidparent"), Some("in(1001,1002,1003)"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    params: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    paging: bool,
    resume: Option<ContinuationLink>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            params: Vec::new(),
            headers: Vec::new(),
            paging: true,
            resume: None,
        }
    }
}

impl QueryOptions {
    /// Create empty options (paging enabled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter or request parameter.
    ///
    /// The string-typed `paging` option is recognised here: any value other
    /// than `"false"` (case-insensitive) keeps paging enabled.
    pub fn filter(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        let field = field.into();
        let value = value.to_string();
        if field == PAGING_OPTION {
            self.paging = !value.eq_ignore_ascii_case("false");
            return self;
        }
        match self.params.iter_mut().find(|(name, _)| *name == field) {
            Some(existing) => existing.1 = value,
            None => self.params.push((field, value)),
        }
        self
    }

    /// Set the number of records per page.
    pub fn page_size(self, size: u32) -> Self {
        self.filter(PAGE_SIZE_OPTION, size)
    }

    /// Follow (`true`, the default) or ignore further pages.
    pub fn paging(mut self, enabled: bool) -> Self {
        self.paging = enabled;
        self
    }

    /// Send an extra header with every request of this query.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(existing) => existing.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Ask the server to put next-page links in the response body instead of
    /// the `Link` header.
    pub fn omit_header_next_links(self) -> Self {
        self.header(OMIT_HEADER_NEXT_LINKS, "true")
    }

    /// Start from a continuation link captured from an earlier stream.
    pub fn resume_from(mut self, link: ContinuationLink) -> Self {
        self.resume = Some(link);
        self
    }

    /// Value of a filter, if set.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Query parameters in insertion order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Extra request headers.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Whether further pages are followed.
    pub fn is_paging(&self) -> bool {
        self.paging
    }

    /// Whether next-page links are expected in the response body.
    pub fn body_links(&self) -> bool {
        self.headers.iter().any(|(name, value)| {
            name.eq_ignore_ascii_case(OMIT_HEADER_NEXT_LINKS) && value.eq_ignore_ascii_case("true")
        })
    }

    pub(crate) fn into_parts(self) -> QueryParts {
        QueryParts {
            params: self.params,
            headers: self.headers,
            paging: self.paging,
            resume: self.resume,
        }
    }
}

pub(crate) struct QueryParts {
    pub(crate) params: Vec<(String, String)>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) paging: bool,
    pub(crate) resume: Option<ContinuationLink>,
}

/// Convert header pairs into a `HeaderMap`.
pub(crate) fn header_map(pairs: &[(String, String)]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("Invalid header name: {name}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidInput(format!("Invalid value for header {name}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Build the literal `in(v1,v2,...)` filter expression.
///
/// Only ordered sequences are accepted; a bare string is rejected at
/// compile time:
///
/// ```compile_fail
/// let _ = devapi_rs::in_("42");
/// ```
///
/// ```
/// assert_eq!(devapi_rs::in_(["A", "B"]), "in(A,B)");
/// ```
pub fn in_<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    let values: Vec<String> = items.into_iter().map(|item| item.to_string()).collect();
    format!("in({})", values.join(","))
}

/// Build an `in()` expression from dynamically typed JSON input.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] unless `items` is a JSON array.
pub fn in_list(items: &Value) -> Result<String> {
    let Value::Array(values) = items else {
        return Err(Error::InvalidInput(format!(
            "Argument provided was not a list. Type provided: {}",
            json_type(items)
        )));
    };
    Ok(in_(values.iter().map(|value| match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_in_helper() {
        assert_eq!(in_(vec![1, 2, 3]), "in(1,2,3)");
        assert_eq!(in_(Vec::<String>::new()), "in()");
    }

    #[test]
    fn test_in_list_rejects_non_sequences() {
        let err = in_list(&json!("42")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m.contains("string")));
        assert!(in_list(&json!({"a": 1})).is_err());
        assert_eq!(in_list(&json!(["a", 2])).unwrap(), "in(a,2)");
    }

    #[test]
    fn test_paging_option_is_string_typed() {
        assert!(!QueryOptions::new().filter("paging", "FALSE").is_paging());
        assert!(QueryOptions::new().filter("paging", "true").is_paging());
        assert!(QueryOptions::new().filter("paging", "false").params().is_empty());
    }

    #[test]
    fn test_filter_replaces_existing() {
        let options = QueryOptions::new()
            .filter("county", "A")
            .page_size(10)
            .filter("county", "B");
        assert_eq!(
            options.params(),
            &[
                ("county".to_string(), "B".to_string()),
                ("pagesize".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_header_map() {
        let headers = header_map(&[("X-Custom".to_string(), "1".to_string())]).unwrap();
        assert_eq!(headers["x-custom"], "1");
        assert!(header_map(&[("bad header".to_string(), "1".to_string())]).is_err());
    }

    #[test]
    fn test_body_links_flag() {
        assert!(!QueryOptions::new().body_links());
        assert!(QueryOptions::new().omit_header_next_links().body_links());
        assert!(QueryOptions::new()
            .header("x-omit-header-next-links", "TRUE")
            .body_links());
        assert!(!QueryOptions::new()
            .header("X-Omit-Header-Next-Links", "false")
            .body_links());
    }
}
