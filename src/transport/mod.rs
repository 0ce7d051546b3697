//! HTTP transport for OAuth requests
//!
//! A request goes through two steps:
//!
//! 1. [`prepare`] turns a URL, parameters, method and headers into a
//!    [`PreparedRequest`]. This is pure: it decides where parameters go (query
//!    string or body) and how the body is encoded (url-encoded or multipart).
//! 2. A [`Transport`] executes the prepared request and returns the
//!    [`RawResponse`]. [`HttpTransport`] is the reqwest-backed implementation.
//!
//! [`classify`] then decides whether the response is a success or an error.

pub mod classify;
pub mod http;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{EXPECT, HeaderMap, HeaderName, HeaderValue};

use crate::error::{OAuthError, Result};
use crate::params::Params;
use crate::utils::{append_query, form_encode};

pub use classify::classify;
pub use http::{HttpTransport, TransportConfig};

/// Encoded request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// No body (GET)
    Empty,
    /// `application/x-www-form-urlencoded` body, already encoded
    Form(String),
    /// `multipart/form-data` body; file parameters are read when sent
    Multipart(Params),
}

/// A request ready to be executed
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// HTTP method
    pub method: Method,
    /// Final URL, including any query string
    pub url: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: RequestBody,
}

impl PreparedRequest {
    /// Decoded pairs of a url-encoded body; empty for other bodies
    #[must_use]
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        match &self.body {
            RequestBody::Form(encoded) => url::form_urlencoded::parse(encoded.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Parse a method name case-insensitively
///
/// # Errors
///
/// Returns [`OAuthError::InvalidMethod`] if the name is not a valid HTTP token.
pub fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| OAuthError::InvalidMethod(method.to_string()))
}

/// Build a [`PreparedRequest`].
///
/// - `GET` (any case) appends the text parameters to the URL's query string,
///   joined with `&` if the URL already has one and `?` otherwise.
/// - Any other method is sent as `POST` with the parameters in the body. The
///   `@` upload convention is applied first (see [`Params::normalize_uploads`]);
///   the body is multipart when a file parameter is present and url-encoded
///   otherwise.
/// - A caller-supplied `Expect` header is dropped, so `100-continue` is never sent.
///
/// # Errors
///
/// Returns [`OAuthError::InvalidMethod`] for an invalid method name.
pub fn prepare(
    url: &str,
    mut params: Params,
    method: &str,
    mut headers: HeaderMap,
) -> Result<PreparedRequest> {
    let method = parse_method(method)?;
    headers.remove(EXPECT);

    if method == Method::GET {
        if params.has_files() {
            tracing::warn!(url, "File parameters cannot be sent with GET; dropping them");
        }
        let query = form_encode(params.text_pairs());
        return Ok(PreparedRequest {
            method,
            url: append_query(url, &query),
            headers,
            body: RequestBody::Empty,
        });
    }

    if method != Method::POST {
        tracing::debug!(url, %method, "Sending non-GET request as POST");
    }

    params.normalize_uploads();
    let body = if params.has_files() {
        RequestBody::Multipart(params)
    } else {
        RequestBody::Form(form_encode(params.text_pairs()))
    };

    Ok(PreparedRequest {
        method: Method::POST,
        url: url.to_string(),
        headers,
        body,
    })
}

/// Metadata about the last exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseInfo {
    /// Final HTTP status code
    pub http_code: u16,
    /// URL the response came from, after redirects
    pub effective_url: String,
    /// Method that was sent
    pub method: String,
    /// `Content-Type` of the response, if any
    pub content_type: Option<String>,
    /// Time from sending the request to receiving the full body
    pub total_time: Duration,
    /// Request line and headers as sent
    pub request_header: String,
}

/// A received HTTP response, before classification
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed response headers
    pub headers: HeaderMap,
    /// Status line and headers as text, CRLF-separated
    pub header_block: String,
    /// Response body
    pub body: String,
    /// Exchange metadata
    pub info: ResponseInfo,
}

impl RawResponse {
    /// Build a response from a captured HTTP message (head, blank line, body).
    ///
    /// A helper for custom [`Transport`] implementations that receive the
    /// message as one block, such as recorded fixtures or a raw socket.
    /// [`HttpTransport`] gets head and body separately and does not use it.
    ///
    /// Header lines that do not parse are skipped. The status code comes from
    /// the status line, falling back to `info.http_code`.
    #[must_use]
    pub fn from_wire(raw: &str, mut info: ResponseInfo) -> Self {
        let (head, body) = split_raw_response(raw);
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|code| code.parse::<u16>().ok())
            .unwrap_or(info.http_code);

        let mut headers = HeaderMap::new();
        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.trim().as_bytes()),
                HeaderValue::from_str(value.trim()),
            ) {
                headers.append(name, value);
            }
        }

        if info.content_type.is_none() {
            info.content_type = headers
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);
        }
        info.http_code = status;

        Self {
            status,
            headers,
            header_block: head.trim_end().to_string(),
            body: body.to_string(),
            info,
        }
    }
}

/// Split a raw HTTP message into its header block and body at the first
/// blank line (`\r\n\r\n`, or `\n\n` for LF-only captures). A message without
/// a blank line is all headers. Used by [`RawResponse::from_wire`] for custom
/// [`Transport`] implementations.
///
/// ```
/// use oauth_flow::transport::split_raw_response;
///
/// let (head, body) = split_raw_response("HTTP/1.1 200 OK\r\nA: b\r\n\r\nx=1\r\n\r\ny");
/// assert_eq!(head, "HTTP/1.1 200 OK\r\nA: b");
/// assert_eq!(body, "x=1\r\n\r\ny");
/// ```
#[must_use]
pub fn split_raw_response(raw: &str) -> (&str, &str) {
    if let Some((head, body)) = raw.split_once("\r\n\r\n") {
        (head, body)
    } else if let Some((head, body)) = raw.split_once("\n\n") {
        (head, body)
    } else {
        (raw, "")
    }
}

/// Executes prepared requests.
///
/// Implementations perform exactly one attempt per call. A connection-level
/// failure is an [`OAuthError::Transport`]; any HTTP response, whatever its
/// status, is a successful [`RawResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a prepared request
    ///
    /// # Errors
    /// Returns error if no response could be received
    async fn execute(&self, request: PreparedRequest) -> Result<RawResponse>;

    /// Prepare and execute a request in one step
    ///
    /// # Errors
    /// Returns error if the method is invalid or no response could be received
    async fn send(
        &self,
        url: &str,
        params: Params,
        method: &str,
        headers: HeaderMap,
    ) -> Result<RawResponse> {
        let request = prepare(url, params, method, headers)?;
        self.execute(request).await
    }
}
