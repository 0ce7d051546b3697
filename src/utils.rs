//! Encoding helpers shared by the transport and the flows

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;

/// Percent-encode a string per RFC 3986.
///
/// Only unreserved characters are kept; everything else, including space,
/// becomes `%XX`. This is the encoding OAuth 1.0a signatures require.
///
/// # Example
/// ```
/// use oauth_flow::utils::percent_encode;
///
/// assert_eq!(percent_encode("a b+c"), "a%20b%2Bc");
/// ```
#[must_use]
pub fn percent_encode(s: &str) -> String {
    use std::fmt::Write;
    let mut result = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                // Writing to a String cannot fail
                let _ = write!(result, "%{byte:02X}");
            }
        }
    }
    result
}

/// Encode pairs as `application/x-www-form-urlencoded` (spaces become `+`).
#[must_use]
pub fn form_encode<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Append an encoded query to a URL, joining with `&` when the URL already
/// carries a query string and `?` otherwise. An empty query leaves the URL as is.
///
/// # Example
/// ```
/// use oauth_flow::utils::append_query;
///
/// assert_eq!(append_query("https://a/b", "x=1"), "https://a/b?x=1");
/// assert_eq!(append_query("https://a/b?y=2", "x=1"), "https://a/b?y=2&x=1");
/// ```
#[must_use]
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{query}")
}

/// Seconds since the Unix epoch
#[must_use]
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// Generate a single-use nonce (base64url, 32 chars) from 24 bytes of the
/// thread-local CSPRNG.
#[must_use]
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; 24];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
