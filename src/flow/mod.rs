//! The client interface shared by OAuth 1.0a and OAuth 2.0
//!
//! [`OAuthFlow`] is the capability set every protocol implements:
//!
//! 1. Build the authorization URL the user is redirected to
//! 2. Exchange what the provider sends back for an access token
//! 3. Call protected resources with the held token
//! 4. Inspect the last raw response
//!
//! A flow instance runs one request at a time. Each request replaces the
//! last-response state, so share a flow between tasks only behind a lock, or
//! give each task its own flow.

pub mod oauth1;
pub mod oauth2;
pub mod signature;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use typed_builder::TypedBuilder;

use crate::config::OAuthVersion;
use crate::decode::Decoded;
use crate::error::Result;
use crate::logger::{LogLevel, SharedLogger};
use crate::params::Params;
use crate::transport::{PreparedRequest, RawResponse, ResponseInfo, Transport, classify};

pub use oauth1::OAuth1Client;
pub use oauth2::OAuth2Client;

/// Optional parameters for building an authorization URL
///
/// OAuth 2.0 uses `redirect`, `scope` and `state`; OAuth 1.0a uses `callback`.
#[derive(Debug, Clone, Default, PartialEq, Eq, TypedBuilder)]
#[builder(
    builder_method(doc = "Create a new builder for AuthorizationRequest"),
    builder_type(doc = "Builder for AuthorizationRequest", vis = "pub"),
    build_method(doc = "Build the AuthorizationRequest")
)]
pub struct AuthorizationRequest {
    /// Overrides the configured redirect URL (OAuth 2.0)
    #[builder(default, setter(strip_option, into))]
    pub redirect: Option<String>,

    /// Requested scope (OAuth 2.0)
    #[builder(default, setter(strip_option, into))]
    pub scope: Option<String>,

    /// Opaque state echoed back by the provider (OAuth 2.0)
    #[builder(default, setter(strip_option, into))]
    pub state: Option<String>,

    /// Overrides the configured callback URL (OAuth 1.0a)
    #[builder(default, setter(strip_option, into))]
    pub callback: Option<String>,
}

/// Where to send the user, and what to keep until they come back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationUrl {
    /// OAuth 2.0: just the URL
    Redirect(String),
    /// OAuth 1.0a: the request token secret (keep it, typically in the
    /// session) and the URL
    WithSecret {
        /// Request token secret, needed for the exchange
        secret: String,
        /// URL to redirect the user to
        url: String,
    },
}

impl AuthorizationUrl {
    /// The URL to redirect the user to
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Redirect(url) | Self::WithSecret { url, .. } => url,
        }
    }

    /// The request token secret, for OAuth 1.0a
    #[must_use]
    pub fn secret(&self) -> Option<&str> {
        match self {
            Self::Redirect(_) => None,
            Self::WithSecret { secret, .. } => Some(secret),
        }
    }
}

/// What the provider sent back, to be exchanged for an access token
///
/// - OAuth 2.0: `token` is the authorization code and `secret_or_redirect` the
///   redirect URL used for authorization (defaults to the configured one).
/// - OAuth 1.0a: `token` is the request token, `secret_or_redirect` the request
///   token secret from [`AuthorizationUrl::WithSecret`] and `verifier` the
///   `oauth_verifier` from the callback.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
#[builder(
    builder_method(doc = "Create a new builder for TokenGrant"),
    builder_type(doc = "Builder for TokenGrant", vis = "pub"),
    build_method(doc = "Build the TokenGrant")
)]
pub struct TokenGrant {
    /// Authorization code (2.0) or request token (1.0a)
    #[builder(setter(into))]
    pub token: String,

    /// Redirect URL (2.0) or request token secret (1.0a)
    #[builder(default, setter(strip_option, into))]
    pub secret_or_redirect: Option<String>,

    /// `oauth_verifier` (1.0a)
    #[builder(default, setter(strip_option, into))]
    pub verifier: Option<String>,
}

impl TokenGrant {
    /// Grant for an OAuth 2.0 authorization code with the configured redirect
    pub fn code(code: impl Into<String>) -> Self {
        Self::builder().token(code).build()
    }
}

/// Result of a successful token exchange
#[derive(Debug, Clone, PartialEq)]
pub enum TokenResult {
    /// OAuth 2.0 bearer token
    Bearer {
        /// The access token
        access_token: String,
        /// Full decoded response (expiry, refresh token, scope, ...)
        payload: Decoded,
    },
    /// OAuth 1.0a token pair
    Signed {
        /// The access token
        token: String,
        /// The access token secret
        secret: String,
        /// Full decoded response
        payload: Decoded,
    },
}

impl TokenResult {
    /// The access token
    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::Bearer { access_token, .. } => access_token,
            Self::Signed { token, .. } => token,
        }
    }

    /// The token secret, for OAuth 1.0a
    #[must_use]
    pub fn secret(&self) -> Option<&str> {
        match self {
            Self::Bearer { .. } => None,
            Self::Signed { secret, .. } => Some(secret),
        }
    }

    /// Full decoded token response
    #[must_use]
    pub fn payload(&self) -> &Decoded {
        match self {
            Self::Bearer { payload, .. } | Self::Signed { payload, .. } => payload,
        }
    }
}

/// The credential a flow currently holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCredential {
    /// Access token
    pub token: String,
    /// Token secret (OAuth 1.0a only)
    pub secret: Option<String>,
}

/// Decoded body of a request together with the response it came from
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Decoded body, structured or plain text
    pub value: Decoded,
    /// The raw response
    pub response: RawResponse,
}

/// The capability set of an OAuth client
#[async_trait]
pub trait OAuthFlow: Send {
    /// Protocol version this flow speaks
    fn version(&self) -> OAuthVersion;

    /// Build the URL the user must be redirected to.
    ///
    /// OAuth 1.0a first obtains a request token from the provider and
    /// returns its secret together with the URL.
    ///
    /// # Errors
    /// Returns error if the request token call fails (OAuth 1.0a)
    async fn authorization_url(
        &mut self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationUrl>;

    /// Exchange an authorization code or request token for an access token.
    ///
    /// On success the token is also held by the flow for later [`fetch`](Self::fetch) calls.
    ///
    /// # Errors
    /// Returns error carrying the token endpoint URL, the raw body and the
    /// status code (0 if no response was received)
    async fn exchange_access_token(&mut self, grant: &TokenGrant) -> Result<TokenResult>;

    /// Replace the held credential. No validation is performed.
    fn set_token(&mut self, token: &str, secret: Option<&str>);

    /// The held credential, if any
    fn token(&self) -> Option<&AccessCredential>;

    /// Call a protected resource and return its body with the raw response.
    ///
    /// `resource` is prefixed with the configured API URL unless it already
    /// starts with `http` (any case).
    ///
    /// # Errors
    /// Returns error if the request fails or the response is classified as an error
    async fn fetch_response(
        &mut self,
        resource: &str,
        params: Params,
        method: &str,
        headers: HeaderMap,
    ) -> Result<Fetched>;

    /// Call a protected resource and return its decoded body.
    ///
    /// # Errors
    /// Returns error if the request fails or the response is classified as an error
    async fn fetch(
        &mut self,
        resource: &str,
        params: Params,
        method: &str,
        headers: HeaderMap,
    ) -> Result<Decoded> {
        self.fetch_response(resource, params, method, headers)
            .await
            .map(|fetched| fetched.value)
    }

    /// Body of the last response
    fn last_response(&self) -> Option<&str>;

    /// Status line and headers of the last response
    fn last_response_headers(&self) -> Option<&str>;

    /// Metadata of the last exchange
    fn last_response_info(&self) -> Option<&ResponseInfo>;
}

/// Resolve an API resource against the base URL.
///
/// Resources starting with `http` (case-insensitive) are used as is; anything
/// else is appended to `base` verbatim, without normalizing slashes.
///
/// ```
/// use oauth_flow::flow::resolve_resource_url;
///
/// assert_eq!(
///     resolve_resource_url("https://api.example.com/", "/path"),
///     "https://api.example.com//path"
/// );
/// assert_eq!(
///     resolve_resource_url("https://api.example.com/", "HTTPS://other.example/x"),
///     "HTTPS://other.example/x"
/// );
/// ```
#[must_use]
pub fn resolve_resource_url(base: &str, resource: &str) -> String {
    let is_absolute = resource
        .get(..4)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("http"));
    if is_absolute {
        resource.to_string()
    } else {
        format!("{base}{resource}")
    }
}

/// Sends requests for a flow and remembers the last response
pub(crate) struct Requester {
    transport: Arc<dyn Transport>,
    logger: SharedLogger,
    last: Option<RawResponse>,
}

impl Requester {
    pub(crate) fn new(transport: Arc<dyn Transport>, logger: SharedLogger) -> Self {
        Self {
            transport,
            logger,
            last: None,
        }
    }

    pub(crate) fn set_logger(&mut self, logger: SharedLogger) {
        self.logger = logger;
    }

    /// Execute, record and classify one request
    pub(crate) async fn dispatch(&mut self, request: PreparedRequest) -> Result<Fetched> {
        let url = request.url.clone();
        self.last = None;

        let response = self.transport.execute(request).await?;
        let classified = classify(&url, &response);
        self.last = Some(response.clone());

        classified.map(|value| Fetched { value, response })
    }

    pub(crate) fn log(&self, level: LogLevel, message: &str) {
        self.logger.log(level, message);
    }

    pub(crate) fn last(&self) -> Option<&RawResponse> {
        self.last.as_ref()
    }

    pub(crate) fn last_body(&self) -> Option<&str> {
        self.last.as_ref().map(|r| r.body.as_str())
    }

    pub(crate) fn last_headers(&self) -> Option<&str> {
        self.last.as_ref().map(|r| r.header_block.as_str())
    }

    pub(crate) fn last_info(&self) -> Option<&ResponseInfo> {
        self.last.as_ref().map(|r| &r.info)
    }
}

impl std::fmt::Debug for Requester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Requester")
            .field("last_status", &self.last.as_ref().map(|r| r.status))
            .finish_non_exhaustive()
    }
}
