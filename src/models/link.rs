//! Continuation links used to walk result sets page by page.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, LINK};
use url::Url;

use crate::Result;

const STRIP_CHARS: &[char] = &[' ', '\'', '"'];

/// One entry of an RFC 8288 `Link` value, e.g. `</wells?next_page=abc>; rel="next"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDescriptor {
    /// Target of the link, usually relative to the API base path
    pub url: String,
    /// Link parameters (`rel`, `title`, ...)
    pub params: BTreeMap<String, String>,
}

impl LinkDescriptor {
    /// The `rel` parameter, if present.
    pub fn rel(&self) -> Option<&str> {
        self.params.get("rel").map(String::as_str)
    }
}

/// Pointer to the next page of a result set.
///
/// Header-style links carry a bare URL taken from the response `Link`
/// header. Body-style links carry the descriptor parsed from a `links`
/// field in the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationLink {
    /// Next page URL taken from the `Link` response header
    Relative(String),
    /// Next page descriptor taken from the response body
    Descriptor(LinkDescriptor),
}

impl ContinuationLink {
    /// URL of the next page, as sent by the server.
    pub fn url(&self) -> &str {
        match self {
            ContinuationLink::Relative(url) => url,
            ContinuationLink::Descriptor(link) => &link.url,
        }
    }

    /// Find the `rel="next"` entry among the response `Link` headers.
    pub(crate) fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get_all(LINK)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(parse_link_header)
            .find(|link| link.rel() == Some("next"))
            .map(|link| ContinuationLink::Relative(link.url))
    }

    /// Parse a body-provided link value. An entry without `rel` is keyed by
    /// its URL, so a lone unlabelled link still counts as the next page.
    pub(crate) fn from_body_value(value: &str) -> Option<Self> {
        let links = parse_link_header(value);
        let next = links
            .iter()
            .position(|link| link.rel() == Some("next"))
            .or_else(|| links.iter().position(|link| link.rel().is_none()))?;
        links
            .into_iter()
            .nth(next)
            .map(ContinuationLink::Descriptor)
    }

    /// Resolve the link against the API base URL.
    ///
    /// Absolute links are used as-is. Relative links are rooted at the base
    /// path, so `/wells?page=2` under `https://host/v3/direct-access/`
    /// becomes `https://host/v3/direct-access/wells?page=2`.
    pub(crate) fn resolve(&self, base: &Url) -> Result<Url> {
        let raw = self.url();
        if let Ok(absolute) = Url::parse(raw) {
            return Ok(absolute);
        }
        let root = base.as_str().trim_end_matches('/');
        let joined = if raw.starts_with('/') {
            format!("{root}{raw}")
        } else {
            format!("{root}/{raw}")
        };
        Ok(Url::parse(&joined)?)
    }
}

/// Parse a `Link` header value into its entries.
///
/// # Example
///
/// ```
/// use devapi_rs::models::parse_link_header;
///
/// let links = parse_link_header(r#"</rigs?page=2>; rel="next", </rigs?page=1>; rel="prev""#);
/// assert_eq!(links.len(), 2);
/// assert_eq!(links[0].url, "/rigs?page=2");
/// assert_eq!(links[0].rel(), Some("next"));
/// ```
pub fn parse_link_header(value: &str) -> Vec<LinkDescriptor> {
    let value = value.trim_matches(STRIP_CHARS);
    if value.is_empty() {
        return Vec::new();
    }

    split_entries(value)
        .into_iter()
        .map(|entry| {
            let (url, params) = entry.split_once(';').unwrap_or((entry, ""));
            let mut link = LinkDescriptor {
                url: url
                    .trim()
                    .trim_matches(|c: char| c == '<' || c == '>' || STRIP_CHARS.contains(&c))
                    .to_string(),
                params: BTreeMap::new(),
            };
            for param in params.split(';') {
                let Some((key, value)) = param.split_once('=') else {
                    break;
                };
                link.params.insert(
                    key.trim_matches(STRIP_CHARS).to_string(),
                    value.trim_matches(STRIP_CHARS).to_string(),
                );
            }
            link
        })
        .collect()
}

// Entries are separated by a comma followed by `<`; commas inside URLs stay put.
fn split_entries(value: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut start = 0;
    for (i, c) in value.char_indices() {
        if c == ',' && value[i + 1..].trim_start_matches(' ').starts_with('<') {
            entries.push(&value[start..i]);
            start = i + 1;
        }
    }
    entries.push(&value[start..]);
    entries
}
