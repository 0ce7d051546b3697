//! OAuth 2.0 authorization-code flow with bearer tokens

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use super::{
    AccessCredential, AuthorizationRequest, AuthorizationUrl, Fetched, OAuthFlow, Requester,
    TokenGrant, TokenResult, resolve_resource_url,
};
use crate::config::{OAuth2Config, OAuthVersion};
use crate::error::{OAuthError, Result};
use crate::logger::{LogLevel, NoopLogger, SharedLogger};
use crate::params::Params;
use crate::transport::{
    HttpTransport, RawResponse, ResponseInfo, Transport, TransportConfig, prepare,
};
use crate::utils::{append_query, form_encode};

/// OAuth 2.0 client
///
/// ```no_run
/// use oauth_flow::{AuthorizationRequest, OAuth2Client, OAuth2Config, OAuthFlow, Params, TokenGrant};
/// use reqwest::header::HeaderMap;
///
/// # async fn example(config: OAuth2Config) -> oauth_flow::Result<()> {
/// let mut client = OAuth2Client::new(config)?;
///
/// let request = AuthorizationRequest::builder().scope("profile").state("abc").build();
/// let url = client.authorization_url(&request).await?;
/// println!("Send the user to {}", url.url());
///
/// // ...the provider redirects back with ?code=...
/// client.exchange_access_token(&TokenGrant::code("the-code")).await?;
/// let me = client.fetch("me", Params::new(), "GET", HeaderMap::new()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OAuth2Client {
    config: OAuth2Config,
    requester: Requester,
    credential: Option<AccessCredential>,
}

impl OAuth2Client {
    /// Create a client with the default HTTP transport
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingConfig`] if a required key is missing, or an
    /// error if the HTTP client cannot be initialized.
    pub fn new(config: OAuth2Config) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(TransportConfig::default())?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client on a custom transport
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingConfig`] if a required key is missing.
    pub fn with_transport(config: OAuth2Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            requester: Requester::new(transport, Arc::new(NoopLogger)),
            credential: None,
        })
    }

    /// Report failures to `logger` before returning them
    #[must_use]
    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.requester.set_logger(logger);
        self
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }

    /// The last raw response, if the last request received one
    #[must_use]
    pub fn last_raw_response(&self) -> Option<&RawResponse> {
        self.requester.last()
    }

    /// Build the authorization URL without any I/O.
    ///
    /// The query carries `client_id`, `response_type=code` and `redirect_uri`
    /// (the request's redirect or the configured one), then `state` and
    /// `scope` when given.
    #[must_use]
    pub fn build_authorization_url(&self, request: &AuthorizationRequest) -> String {
        let redirect = request
            .redirect
            .as_deref()
            .unwrap_or(&self.config.redirect_url);

        let mut query = vec![
            ("client_id", self.config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", redirect),
        ];
        if let Some(state) = &request.state {
            query.push(("state", state));
        }
        if let Some(scope) = &request.scope {
            query.push(("scope", scope));
        }

        append_query(&self.config.authorization_url, &form_encode(query))
    }
}

#[async_trait]
impl OAuthFlow for OAuth2Client {
    fn version(&self) -> OAuthVersion {
        OAuthVersion::V2
    }

    async fn authorization_url(
        &mut self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationUrl> {
        Ok(AuthorizationUrl::Redirect(
            self.build_authorization_url(request),
        ))
    }

    async fn exchange_access_token(&mut self, grant: &TokenGrant) -> Result<TokenResult> {
        let redirect = grant
            .secret_or_redirect
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(&self.config.redirect_url);

        let params = Params::from([
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", redirect),
            ("grant_type", "authorization_code"),
            ("code", grant.token.as_str()),
        ]);

        let url = self.config.access_token_url.clone();
        let request = prepare(&url, params, "POST", HeaderMap::new())?;

        let fetched = match self.requester.dispatch(request).await {
            Ok(fetched) => fetched,
            Err(err) => {
                self.requester.log(
                    LogLevel::Error,
                    &format!(
                        "Failed to get access token from {url}. Error: {}",
                        err.message()
                    ),
                );
                return Err(err);
            }
        };

        let Some(access_token) = fetched.value.get_str("access_token") else {
            let message = "access_token missing from token response";
            self.requester.log(
                LogLevel::Error,
                &format!("Failed to get access token from {url}. Error: {message}"),
            );
            return Err(OAuthError::protocol(
                message,
                url,
                fetched.response.body,
                fetched.response.status,
            ));
        };

        tracing::debug!("Exchanged authorization code for access token");
        self.set_token(&access_token, None);

        Ok(TokenResult::Bearer {
            access_token,
            payload: fetched.value,
        })
    }

    fn set_token(&mut self, token: &str, _secret: Option<&str>) {
        self.credential = Some(AccessCredential {
            token: token.to_string(),
            secret: None,
        });
    }

    fn token(&self) -> Option<&AccessCredential> {
        self.credential.as_ref()
    }

    async fn fetch_response(
        &mut self,
        resource: &str,
        mut params: Params,
        method: &str,
        headers: HeaderMap,
    ) -> Result<Fetched> {
        let url = resolve_resource_url(&self.config.api_url, resource);

        params.insert("client_id", self.config.client_id.as_str());
        match &self.credential {
            Some(credential) => params.insert("access_token", credential.token.as_str()),
            None => tracing::debug!(url = %url, "No access token held; sending request without one"),
        }

        let request = prepare(&url, params, method, headers)?;
        self.requester.dispatch(request).await
    }

    fn last_response(&self) -> Option<&str> {
        self.requester.last_body()
    }

    fn last_response_headers(&self) -> Option<&str> {
        self.requester.last_headers()
    }

    fn last_response_info(&self) -> Option<&ResponseInfo> {
        self.requester.last_info()
    }
}
