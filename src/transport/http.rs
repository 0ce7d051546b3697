//! reqwest-backed transport

use std::fmt::Write as _;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use typed_builder::TypedBuilder;

use super::{PreparedRequest, RawResponse, RequestBody, ResponseInfo, Transport};
use crate::error::{OAuthError, Result};
use crate::params::{ParamValue, Params};

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default total request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default `User-Agent` header
pub const DEFAULT_USER_AGENT: &str = "OAuthClient";

/// HTTP client settings
#[derive(Debug, Clone, TypedBuilder)]
#[builder(
    builder_method(doc = "Create a new builder for TransportConfig"),
    builder_type(doc = "Builder for TransportConfig", vis = "pub"),
    build_method(doc = "Build the TransportConfig")
)]
pub struct TransportConfig {
    /// Maximum time to establish a connection
    #[builder(default = DEFAULT_CONNECT_TIMEOUT)]
    pub connect_timeout: Duration,

    /// Maximum time for the whole exchange
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,

    /// `User-Agent` sent with every request
    #[builder(default = DEFAULT_USER_AGENT.to_string(), setter(into))]
    pub user_agent: String,

    /// Skip TLS certificate verification. Only for test providers.
    #[builder(default)]
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Transport over a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl HttpTransport {
    /// Create a transport with the given settings.
    ///
    /// Redirects are never followed: a `3xx` answer is returned as the
    /// response of the request that produced it.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized (e.g. no TLS backend).
    pub fn new(config: TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self { client, config })
    }

    /// Get the transport settings
    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: PreparedRequest) -> Result<RawResponse> {
        let PreparedRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method.clone(), &url).headers(headers);
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Form(encoded) => builder
                .header(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                )
                .body(encoded),
            RequestBody::Multipart(params) => builder.multipart(multipart_form(&url, params).await?),
        };

        let request = builder
            .build()
            .map_err(|e| OAuthError::transport(e.to_string(), &url))?;
        let request_header = render_request_head(&request);

        tracing::debug!(%method, url = %url, "Sending request");
        let started = Instant::now();
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| OAuthError::transport(e.to_string(), &url))?;

        let status = response.status();
        let response_headers = response.headers().clone();
        let effective_url = response.url().to_string();
        let header_block = render_response_head(response.version(), status, &response_headers);
        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::transport(e.to_string(), &url))?;
        let total_time = started.elapsed();

        tracing::debug!(
            status = status.as_u16(),
            elapsed_ms = total_time.as_millis() as u64,
            "Received response"
        );

        let content_type = response_headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        Ok(RawResponse {
            status: status.as_u16(),
            headers: response_headers,
            header_block,
            body,
            info: ResponseInfo {
                http_code: status.as_u16(),
                effective_url,
                method: method.to_string(),
                content_type,
                total_time,
                request_header,
            },
        })
    }
}

async fn multipart_form(url: &str, params: Params) -> Result<Form> {
    let mut form = Form::new();
    for (key, value) in params.iter() {
        form = match value {
            ParamValue::Text(text) => form.text(key.to_string(), text.clone()),
            ParamValue::File(path) => {
                let contents = tokio::fs::read(path)
                    .await
                    .map_err(|source| OAuthError::Upload {
                        url: url.to_string(),
                        path: path.clone(),
                        source,
                    })?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| key.to_string());
                form.part(key.to_string(), Part::bytes(contents).file_name(file_name))
            }
        };
    }
    Ok(form)
}

fn render_request_head(request: &reqwest::Request) -> String {
    let url = request.url();
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut head = format!("{} {target} HTTP/1.1\r\n", request.method());
    if let Some(host) = url.host_str() {
        match url.port() {
            Some(port) => {
                let _ = write!(head, "Host: {host}:{port}\r\n");
            }
            None => {
                let _ = write!(head, "Host: {host}\r\n");
            }
        }
    }
    write_headers(&mut head, request.headers());
    head
}

fn render_response_head(
    version: reqwest::Version,
    status: reqwest::StatusCode,
    headers: &HeaderMap,
) -> String {
    let mut head = format!(
        "{version:?} {} {}\r\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    );
    write_headers(&mut head, headers);
    head.trim_end().to_string()
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let _ = write!(out, "{name}: {}\r\n", String::from_utf8_lossy(value.as_bytes()));
    }
}
