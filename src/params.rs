//! Request parameters, including file uploads.
//!
//! A parameter value is either text or a reference to a local file. Any file
//! reference turns a body-bearing request into `multipart/form-data`.
//!
//! For compatibility with callers that mark uploads by prefixing both the key
//! and the value with `@`, [`Params::normalize_uploads`] converts the first
//! such pair into a [`ParamValue::File`].

use std::path::{Path, PathBuf};

/// Marker that flags a parameter as a file upload in the `@` convention
pub const UPLOAD_MARKER: char = '@';

/// Value of a single request parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Plain text
    Text(String),
    /// Local file whose contents are streamed as a multipart part
    File(PathBuf),
}

impl ParamValue {
    /// Text content, if this is a text value
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::File(_) => None,
        }
    }

    /// Whether this value references a file
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<PathBuf> for ParamValue {
    fn from(value: PathBuf) -> Self {
        Self::File(value)
    }
}

impl From<&Path> for ParamValue {
    fn from(value: &Path) -> Self {
        Self::File(value.to_path_buf())
    }
}

/// Insertion-ordered request parameters.
///
/// Inserting an existing key replaces its value in place, so a key appears at
/// most once.
///
/// ```
/// use oauth_flow::Params;
///
/// let mut params = Params::new();
/// params.insert("q", "rust");
/// params.insert("page", "2");
/// params.insert("q", "oauth");
/// assert_eq!(params.len(), 2);
/// assert_eq!(params.get_text("q"), Some("oauth"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    /// Create an empty parameter list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Insert or replace a file upload parameter
    pub fn insert_file(&mut self, key: impl Into<String>, path: impl Into<PathBuf>) {
        self.insert(key, ParamValue::File(path.into()));
    }

    /// Builder-style [`Params::insert`]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a parameter
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a text parameter
    #[must_use]
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_text)
    }

    /// Remove a parameter, returning its value
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no parameters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any parameter references a file
    #[must_use]
    pub fn has_files(&self) -> bool {
        self.entries.iter().any(|(_, v)| v.is_file())
    }

    /// Iterate over all parameters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over text parameters only
    pub fn text_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_text().map(|t| (k.as_str(), t)))
    }

    /// Apply the `@` upload convention.
    ///
    /// Scans in insertion order for the first text parameter whose key and
    /// value both start with `@`. That parameter is rewritten to a file upload
    /// under the key without its `@`, reading from the path after the value's
    /// `@`. Scanning stops at the first match; later `@` pairs stay text.
    ///
    /// Returns `true` when a parameter was converted.
    pub fn normalize_uploads(&mut self) -> bool {
        let found = self.entries.iter().position(|(k, v)| {
            k.starts_with(UPLOAD_MARKER)
                && v.as_text().is_some_and(|t| t.starts_with(UPLOAD_MARKER))
        });
        let Some(pos) = found else {
            return false;
        };

        let (key, value) = self.entries.remove(pos);
        let path = match value {
            ParamValue::Text(t) => PathBuf::from(&t[UPLOAD_MARKER.len_utf8()..]),
            ParamValue::File(p) => p,
        };
        self.insert_file(&key[UPLOAD_MARKER.len_utf8()..], path);
        true
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}
