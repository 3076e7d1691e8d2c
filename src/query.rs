use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Query-string parameters. Keys iterate in ascending order.
pub type Query = BTreeMap<String, String>;

/// Parses `?a=1&b=2` (the leading `?` is optional). Later duplicates win and
/// empty keys are dropped.
pub fn parse_query(search: &str) -> Query {
    let search = search.strip_prefix('?').unwrap_or(search);
    form_urlencoded::parse(search.as_bytes())
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Serializes without the leading `?`; keys are sorted and empty keys,
/// which [`parse_query`] would drop, are skipped.
pub fn stringify_query(query: &Query) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (k, v) in query.iter().filter(|(k, _)| !k.is_empty()) {
        serializer.append_pair(k, v);
    }
    serializer.finish()
}

/// Client-side view of the address bar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub pathname: String,
    pub query: Query,
}

impl Location {
    pub fn new(pathname: impl Into<String>, query: Query) -> Self {
        Self {
            pathname: pathname.into(),
            query,
        }
    }

    /// Splits `"/zika/?c=region"` into its path and query.
    pub fn from_url(url: &str) -> Self {
        let (pathname, search) = split_url(url);
        Self::new(pathname, parse_query(search))
    }

    pub fn href(&self) -> String {
        compose_url(&self.pathname, &stringify_query(&self.query))
    }
}

/// Splits a relative URL into pathname and search (with its `?`).
pub fn split_url(url: &str) -> (&str, &str) {
    match url.find('?') {
        Some(at) => (&url[..at], &url[at..]),
        None => (url, ""),
    }
}

/// Joins a pathname and a serialized query, omitting an empty query.
pub fn compose_url(pathname: &str, search: &str) -> String {
    let search = search.strip_prefix('?').unwrap_or(search);
    if search.is_empty() {
        pathname.to_string()
    } else {
        format!("{pathname}?{search}")
    }
}
