//! OAuth 1.0a three-legged flow with signed requests

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use super::signature::{Signer, SigningParams};
use super::{
    AccessCredential, AuthorizationRequest, AuthorizationUrl, Fetched, OAuthFlow, Requester,
    TokenGrant, TokenResult, resolve_resource_url,
};
use crate::config::{OAuth1Config, OAuthVersion};
use crate::error::{OAuthError, Result};
use crate::logger::{LogLevel, NoopLogger, SharedLogger};
use crate::params::Params;
use crate::transport::{
    HttpTransport, PreparedRequest, RawResponse, ResponseInfo, Transport, TransportConfig, prepare,
};
use crate::utils::{append_query, form_encode};

/// Callback sent when none is configured (out-of-band, the user copies a PIN)
pub const OUT_OF_BAND_CALLBACK: &str = "oob";

/// OAuth 1.0a client
///
/// ```no_run
/// use oauth_flow::{AuthorizationRequest, OAuth1Client, OAuth1Config, OAuthFlow, TokenGrant};
///
/// # async fn example(config: OAuth1Config) -> oauth_flow::Result<()> {
/// let mut client = OAuth1Client::new(config)?;
///
/// let auth = client.authorization_url(&AuthorizationRequest::default()).await?;
/// let secret = auth.secret().unwrap_or_default().to_string();
/// println!("Send the user to {}", auth.url());
///
/// // ...the provider calls back with oauth_token and oauth_verifier
/// let grant = TokenGrant::builder()
///     .token("request-token")
///     .secret_or_redirect(secret)
///     .verifier("verifier")
///     .build();
/// let tokens = client.exchange_access_token(&grant).await?;
/// println!("token={} secret={:?}", tokens.token(), tokens.secret());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OAuth1Client {
    config: OAuth1Config,
    requester: Requester,
    credential: Option<AccessCredential>,
}

impl OAuth1Client {
    /// Create a client with the default HTTP transport
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingConfig`] if a required key is missing, or an
    /// error if the HTTP client cannot be initialized.
    pub fn new(config: OAuth1Config) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(TransportConfig::default())?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client on a custom transport
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingConfig`] if a required key is missing.
    pub fn with_transport(config: OAuth1Config, transport: Arc<dyn Transport>) -> Result<Self> {
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
    pub fn config(&self) -> &OAuth1Config {
        &self.config
    }

    /// The last raw response, if the last request received one
    #[must_use]
    pub fn last_raw_response(&self) -> Option<&RawResponse> {
        self.requester.last()
    }

    fn signer(&self) -> Signer<'_> {
        Signer::new(
            &self.config.consumer_key,
            &self.config.consumer_secret,
            self.config.signature_method,
        )
    }

    /// Sign and send a token endpoint request, expecting a token pair back
    async fn token_request(
        &mut self,
        url: &str,
        mut request: PreparedRequest,
        signing: SigningParams<'_>,
        what: &str,
    ) -> Result<(String, String, Fetched)> {
        self.signer().sign(&mut request, signing)?;

        let fetched = match self.requester.dispatch(request).await {
            Ok(fetched) => fetched,
            Err(err) => {
                self.requester.log(
                    LogLevel::Error,
                    &format!("Failed to get {what} from {url}. Error: {}", err.message()),
                );
                return Err(err);
            }
        };

        let token = fetched.value.get_str("oauth_token");
        let secret = fetched.value.get_str("oauth_token_secret");
        match (token, secret) {
            (Some(token), Some(secret)) => Ok((token, secret, fetched)),
            _ => {
                let message = format!("oauth_token or oauth_token_secret missing from {what} response");
                self.requester.log(
                    LogLevel::Error,
                    &format!("Failed to get {what} from {url}. Error: {message}"),
                );
                Err(OAuthError::protocol(
                    message,
                    url,
                    fetched.response.body,
                    fetched.response.status,
                ))
            }
        }
    }
}

#[async_trait]
impl OAuthFlow for OAuth1Client {
    fn version(&self) -> OAuthVersion {
        OAuthVersion::V1
    }

    async fn authorization_url(
        &mut self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationUrl> {
        let callback = request
            .callback
            .clone()
            .or_else(|| self.config.callback_url.clone())
            .unwrap_or_else(|| OUT_OF_BAND_CALLBACK.to_string());

        let url = self.config.request_token_url.clone();
        let prepared = prepare(&url, Params::new(), "POST", HeaderMap::new())?;
        let signing = SigningParams {
            extra: vec![("oauth_callback", callback)],
            ..SigningParams::default()
        };

        let (token, secret, _) = self
            .token_request(&url, prepared, signing, "request token")
            .await?;

        let query = form_encode([("oauth_token", token.as_str())]);
        let redirect = append_query(&self.config.authorization_url, &query);
        tracing::debug!("Obtained request token");

        Ok(AuthorizationUrl::WithSecret {
            secret,
            url: redirect,
        })
    }

    async fn exchange_access_token(&mut self, grant: &TokenGrant) -> Result<TokenResult> {
        let url = self.config.access_token_url.clone();
        let prepared = prepare(&url, Params::new(), "POST", HeaderMap::new())?;

        let mut extra = Vec::new();
        if let Some(verifier) = grant.verifier.as_ref().filter(|v| !v.is_empty()) {
            extra.push(("oauth_verifier", verifier.clone()));
        }
        let signing = SigningParams {
            token: Some(&grant.token),
            token_secret: grant.secret_or_redirect.as_deref(),
            extra,
            ..SigningParams::default()
        };

        let (token, secret, fetched) = self
            .token_request(&url, prepared, signing, "access token")
            .await?;

        tracing::debug!("Exchanged request token for access token");
        self.set_token(&token, Some(&secret));

        Ok(TokenResult::Signed {
            token,
            secret,
            payload: fetched.value,
        })
    }

    fn set_token(&mut self, token: &str, secret: Option<&str>) {
        self.credential = Some(AccessCredential {
            token: token.to_string(),
            secret: secret.map(ToString::to_string),
        });
    }

    fn token(&self) -> Option<&AccessCredential> {
        self.credential.as_ref()
    }

    async fn fetch_response(
        &mut self,
        resource: &str,
        params: Params,
        method: &str,
        headers: HeaderMap,
    ) -> Result<Fetched> {
        let url = resolve_resource_url(&self.config.api_url, resource);
        let mut request = prepare(&url, params, method, headers)?;

        let signing = SigningParams {
            token: self.credential.as_ref().map(|c| c.token.as_str()),
            token_secret: self.credential.as_ref().and_then(|c| c.secret.as_deref()),
            ..SigningParams::default()
        };
        self.signer().sign(&mut request, signing)?;

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
