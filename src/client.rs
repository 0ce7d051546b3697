//! Version-dispatching OAuth client
//!
//! [`OAuthClient`] picks the protocol from a [`ClientConfig`] and forwards
//! every [`OAuthFlow`] call to the matching implementation, so callers can
//! stay generic over the provider's OAuth version:
//!
//! ```no_run
//! use std::collections::HashMap;
//! use oauth_flow::{AuthorizationRequest, ClientConfig, OAuthClient, OAuthFlow};
//!
//! # async fn example(settings: HashMap<String, String>) -> oauth_flow::Result<()> {
//! let config = ClientConfig::from_map(&settings)?;
//! let mut client = OAuthClient::builder(config).build()?;
//!
//! let auth = client.authorization_url(&AuthorizationRequest::default()).await?;
//! println!("{} client, redirect to {}", client.version(), auth.url());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::config::{ClientConfig, OAuthVersion};
use crate::error::Result;
use crate::flow::{
    AccessCredential, AuthorizationRequest, AuthorizationUrl, Fetched, OAuth1Client,
    OAuth2Client, OAuthFlow, TokenGrant, TokenResult,
};
use crate::logger::SharedLogger;
use crate::params::Params;
use crate::transport::{HttpTransport, ResponseInfo, Transport, TransportConfig};

/// An OAuth client of either protocol version
#[derive(Debug)]
pub enum OAuthClient {
    /// OAuth 1.0a
    OAuth1(OAuth1Client),
    /// OAuth 2.0
    OAuth2(OAuth2Client),
}

impl OAuthClient {
    /// Create a builder for `config`
    #[must_use]
    pub fn builder(config: ClientConfig) -> OAuthClientBuilder {
        OAuthClientBuilder::new(config)
    }

    /// Create a client with the default transport and no logger
    ///
    /// # Errors
    ///
    /// Returns error if a required configuration key is missing or the HTTP
    /// client cannot be initialized.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// The OAuth 1.0a client, if this is one
    #[must_use]
    pub fn as_oauth1(&self) -> Option<&OAuth1Client> {
        match self {
            Self::OAuth1(client) => Some(client),
            Self::OAuth2(_) => None,
        }
    }

    /// The OAuth 2.0 client, if this is one
    #[must_use]
    pub fn as_oauth2(&self) -> Option<&OAuth2Client> {
        match self {
            Self::OAuth2(client) => Some(client),
            Self::OAuth1(_) => None,
        }
    }

    fn flow(&self) -> &dyn OAuthFlow {
        match self {
            Self::OAuth1(client) => client,
            Self::OAuth2(client) => client,
        }
    }

    fn flow_mut(&mut self) -> &mut dyn OAuthFlow {
        match self {
            Self::OAuth1(client) => client,
            Self::OAuth2(client) => client,
        }
    }
}

impl From<OAuth1Client> for OAuthClient {
    fn from(client: OAuth1Client) -> Self {
        Self::OAuth1(client)
    }
}

impl From<OAuth2Client> for OAuthClient {
    fn from(client: OAuth2Client) -> Self {
        Self::OAuth2(client)
    }
}

#[async_trait]
impl OAuthFlow for OAuthClient {
    fn version(&self) -> OAuthVersion {
        self.flow().version()
    }

    async fn authorization_url(
        &mut self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationUrl> {
        self.flow_mut().authorization_url(request).await
    }

    async fn exchange_access_token(&mut self, grant: &TokenGrant) -> Result<TokenResult> {
        self.flow_mut().exchange_access_token(grant).await
    }

    fn set_token(&mut self, token: &str, secret: Option<&str>) {
        self.flow_mut().set_token(token, secret);
    }

    fn token(&self) -> Option<&AccessCredential> {
        self.flow().token()
    }

    async fn fetch_response(
        &mut self,
        resource: &str,
        params: Params,
        method: &str,
        headers: HeaderMap,
    ) -> Result<Fetched> {
        self.flow_mut()
            .fetch_response(resource, params, method, headers)
            .await
    }

    fn last_response(&self) -> Option<&str> {
        self.flow().last_response()
    }

    fn last_response_headers(&self) -> Option<&str> {
        self.flow().last_response_headers()
    }

    fn last_response_info(&self) -> Option<&ResponseInfo> {
        self.flow().last_response_info()
    }
}

/// Builder for [`OAuthClient`]
///
/// A custom [`Transport`] takes precedence over [`transport_config`](Self::transport_config).
pub struct OAuthClientBuilder {
    config: ClientConfig,
    transport_config: TransportConfig,
    transport: Option<Arc<dyn Transport>>,
    logger: Option<SharedLogger>,
}

impl OAuthClientBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport_config: TransportConfig::default(),
            transport: None,
            logger: None,
        }
    }

    /// Timeouts, user agent and TLS settings for the default transport
    #[must_use]
    pub fn transport_config(mut self, config: TransportConfig) -> Self {
        self.transport_config = config;
        self
    }

    /// Send requests through a custom transport
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Report failures to `logger`
    #[must_use]
    pub fn logger(mut self, logger: SharedLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Validate the configuration and build the client
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingConfig`](crate::OAuthError::MissingConfig)
    /// naming the first missing key, or an error if the HTTP client cannot be
    /// initialized.
    pub fn build(self) -> Result<OAuthClient> {
        self.config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.transport_config)?),
        };

        let client = match self.config {
            ClientConfig::OAuth1(config) => {
                let mut client = OAuth1Client::with_transport(config, transport)?;
                if let Some(logger) = self.logger {
                    client = client.with_logger(logger);
                }
                OAuthClient::OAuth1(client)
            }
            ClientConfig::OAuth2(config) => {
                let mut client = OAuth2Client::with_transport(config, transport)?;
                if let Some(logger) = self.logger {
                    client = client.with_logger(logger);
                }
                OAuthClient::OAuth2(client)
            }
        };

        tracing::debug!(version = %client.version(), "Created OAuth client");
        Ok(client)
    }
}

impl std::fmt::Debug for OAuthClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClientBuilder")
            .field("version", &self.config.version())
            .field("transport_config", &self.transport_config)
            .field("custom_transport", &self.transport.is_some())
            .field("logger", &self.logger.is_some())
            .finish()
    }
}
