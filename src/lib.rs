//! # OAuth client flows for Rust
//!
//! One interface over the OAuth 1.0a and OAuth 2.0 authorization-code flows:
//! build the authorization URL, exchange what the provider sends back for an
//! access token, then call protected resources with it.
//! Async/await, strong typing, tokio and reqwest based.
//!
//! ## Quick Start
//!
//! ```no_run
//! use oauth_flow::{AuthorizationRequest, OAuth2Config, OAuthClient, OAuthFlow, Params, TokenGrant};
//! use reqwest::header::HeaderMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OAuth2Config {
//!         client_id: "my-app".into(),
//!         client_secret: "s3cret".into(),
//!         redirect_url: "https://my-app.example/callback".into(),
//!         authorization_url: "https://provider.example/oauth/authorize".into(),
//!         access_token_url: "https://provider.example/oauth/token".into(),
//!         api_url: "https://api.provider.example/v1/".into(),
//!     };
//!     let mut client = OAuthClient::builder(config.into()).build()?;
//!
//!     let request = AuthorizationRequest::builder().scope("profile").state("xyz").build();
//!     let auth = client.authorization_url(&request).await?;
//!     println!("Redirect the user to {}", auth.url());
//!
//!     // ...the provider redirects back with ?code=...
//!     client.exchange_access_token(&TokenGrant::code("the-code")).await?;
//!
//!     let me = client.fetch("me", Params::new(), "GET", HeaderMap::new()).await?;
//!     println!("{:?}", me.get_str("name"));
//!     Ok(())
//! }
//! ```
//!
//! ## Core Features
//!
//! ### 1. Configuration
//!
//! [`ClientConfig`] selects the protocol. Build it from typed structs, from a
//! settings map with [`ClientConfig::from_map`], or deserialize it with serde
//! (the `oauth_version` field names the protocol). Every required key must be
//! present and non-empty, otherwise construction fails naming the key.
//!
//! ### 2. Flows
//!
//! [`OAuthFlow`] is implemented by [`OAuth2Client`] (bearer tokens),
//! [`OAuth1Client`] (HMAC-SHA1 or PLAINTEXT signed requests) and the
//! dispatching [`OAuthClient`].
//!
//! ### 3. Parameters and uploads
//!
//! [`Params`] keeps insertion order. File parameters ([`ParamValue::File`])
//! switch the body to multipart:
//!
//! ```no_run
//! # use oauth_flow::{OAuthClient, OAuthFlow, Params};
//! # use reqwest::header::HeaderMap;
//! # async fn example(client: &mut OAuthClient) -> oauth_flow::Result<()> {
//! let mut params = Params::new();
//! params.insert("caption", "holiday");
//! params.insert_file("photo", "/tmp/beach.jpg");
//! client.fetch("photos", params, "POST", HeaderMap::new()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! The legacy convention of an `@`-prefixed key with an `@`-prefixed path is
//! still understood (see [`Params::normalize_uploads`]).
//!
//! ## Architecture
//!
//! - [`config`]: Provider configuration and validation
//! - [`flow`]: The [`OAuthFlow`] interface and the OAuth 1.0a / 2.0 implementations
//! - [`client`]: Version-dispatching client and its builder
//! - [`transport`]: Request preparation, the HTTP transport and response classification
//! - [`decode`]: JSON / form / text body decoding
//! - [`params`]: Request parameters and file uploads
//! - [`logger`]: Logging port for flow failures
//! - [`error`]: Error types and handling
//!
//! ## Logging
//!
//! This crate uses [`tracing`](https://crates.io/crates/tracing) for structured logging.
//! Tracing events are always emitted but are zero-cost when no subscriber is attached.
//! To see logs, attach a tracing subscriber in your application:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt::init();
//! ```
//!
//! Failures of the token calls are also reported through the optional
//! [`Logger`] given to the client builder.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, OAuthError>`](Result):
//!
//! ```no_run
//! # use oauth_flow::{OAuthClient, OAuthError, OAuthFlow, TokenGrant};
//! # async fn example(client: &mut OAuthClient) {
//! match client.exchange_access_token(&TokenGrant::code("abc")).await {
//!     Ok(tokens) => println!("token: {}", tokens.token()),
//!     Err(e @ OAuthError::Transport { .. }) => {
//!         eprintln!("Provider unreachable: {e}");
//!     }
//!     Err(e) => {
//!         eprintln!("{} (HTTP {}): {}", e.message(), e.status_code(), e.body());
//!     }
//! }
//! # }
//! ```
//!
//! ## Concurrency
//!
//! A flow runs one request at a time and keeps the last response for
//! inspection. Give each task its own client, or share one behind a lock.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod flow;
pub mod logger;
pub mod params;
pub mod transport;
pub mod utils;

// Re-export commonly used types
pub use client::{OAuthClient, OAuthClientBuilder};
pub use config::{ClientConfig, OAuth1Config, OAuth2Config, OAuthVersion, SignatureMethod};
pub use decode::{Decoded, decode};
pub use error::{OAuthError, Result};
pub use flow::{
    AccessCredential, AuthorizationRequest, AuthorizationUrl, Fetched, OAuth1Client, OAuth2Client,
    OAuthFlow, TokenGrant, TokenResult, resolve_resource_url,
};
pub use logger::{LogLevel, Logger, NoopLogger, SharedLogger, TracingLogger};
pub use params::{ParamValue, Params};
pub use transport::{
    HttpTransport, PreparedRequest, RawResponse, RequestBody, ResponseInfo, Transport,
    TransportConfig, classify, prepare,
};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
