//! Gateway path building.
//!
//! Symbols, modes and record ids end up inside request paths, so every
//! parameter is percent-encoded before it is placed: a `/` in a symbol stays
//! inside its segment and a `&` in a mode stays inside its query value.

use std::fmt::Display;

use url::form_urlencoded;

/// A path under the gateway base URL, built one encoded piece at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApiPath {
    path: String,
    query: Vec<(&'static str, String)>,
}

impl ApiPath {
    /// Start from a fixed prefix such as `/api/symbols`.
    pub(crate) fn new(prefix: &str) -> Self {
        Self {
            path: prefix.to_string(),
            query: Vec::new(),
        }
    }

    /// Append one encoded path segment.
    #[must_use]
    pub(crate) fn segment(mut self, value: impl Display) -> Self {
        self.path.push('/');
        self.path.push_str(&encode_segment(&value.to_string()));
        self
    }

    /// Append a literal path segment.
    #[must_use]
    pub(crate) fn literal(mut self, segment: &str) -> Self {
        self.path.push('/');
        self.path.push_str(segment);
        self
    }

    /// Append one encoded query pair.
    #[must_use]
    pub(crate) fn query(mut self, name: &'static str, value: impl Display) -> Self {
        self.query.push((name, value.to_string()));
        self
    }

    pub(crate) fn build(self) -> String {
        if self.query.is_empty() {
            return self.path;
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish();
        format!("{}?{}", self.path, query)
    }
}

/// Percent-encode one path segment.
///
/// Form encoding writes a space as `+`, which a path would read as a literal
/// plus. Any `+` it emits stands for a space, since a real `+` comes out as
/// `%2B`.
fn encode_segment(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
