//! Provider configuration for OAuth 1.0a and OAuth 2.0 flows
//!
//! Configurations are plain data and can be deserialized from JSON. They are
//! validated when a flow is constructed: every key the protocol needs must be
//! present and non-empty.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{OAuthError, Result};

/// Which protocol a configuration (and the flow built from it) speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OAuthVersion {
    /// OAuth 1.0a, signed requests
    #[serde(rename = "1.0")]
    V1,
    /// OAuth 2.0, bearer tokens
    #[serde(rename = "2.0")]
    V2,
}

impl std::fmt::Display for OAuthVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1 => write!(f, "1.0"),
            Self::V2 => write!(f, "2.0"),
        }
    }
}

/// Signature method for OAuth 1.0a requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureMethod {
    /// HMAC-SHA1 over the signature base string
    #[default]
    #[serde(rename = "HMAC-SHA1")]
    HmacSha1,
    /// The signing key itself; only safe over TLS
    #[serde(rename = "PLAINTEXT")]
    Plaintext,
}

impl SignatureMethod {
    /// Value of the `oauth_signature_method` parameter
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HmacSha1 => "HMAC-SHA1",
            Self::Plaintext => "PLAINTEXT",
        }
    }
}

/// OAuth 2.0 configuration
///
/// ```
/// use oauth_flow::OAuth2Config;
///
/// let config = OAuth2Config {
///     client_id: "id".into(),
///     client_secret: "secret".into(),
///     redirect_url: "https://app.example/callback".into(),
///     authorization_url: "https://provider.example/authorize".into(),
///     access_token_url: "https://provider.example/token".into(),
///     api_url: "https://api.provider.example/".into(),
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Config {
    /// OAuth client ID
    #[serde(default)]
    pub client_id: String,
    /// OAuth client secret
    #[serde(default)]
    pub client_secret: String,
    /// Where the provider redirects back after authorization
    #[serde(default)]
    pub redirect_url: String,
    /// Authorization endpoint the user is sent to
    #[serde(default)]
    pub authorization_url: String,
    /// Token endpoint for exchanging the authorization code
    #[serde(default)]
    pub access_token_url: String,
    /// Base URL prefixed to relative API resources
    #[serde(default)]
    pub api_url: String,
}

impl OAuth2Config {
    /// Keys an OAuth 2.0 configuration must carry, in validation order
    pub const REQUIRED_KEYS: [&'static str; 6] = [
        "client_id",
        "client_secret",
        "redirect_url",
        "authorization_url",
        "access_token_url",
        "api_url",
    ];

    /// Build from a key/value map, validating required keys
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingConfig`] naming the first missing or empty key.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        let config = Self {
            client_id: lookup(map, "client_id"),
            client_secret: lookup(map, "client_secret"),
            redirect_url: lookup(map, "redirect_url"),
            authorization_url: lookup(map, "authorization_url"),
            access_token_url: lookup(map, "access_token_url"),
            api_url: lookup(map, "api_url"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every required key is present and non-empty
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingConfig`] naming the first missing or empty key.
    pub fn validate(&self) -> Result<()> {
        let values = [
            &self.client_id,
            &self.client_secret,
            &self.redirect_url,
            &self.authorization_url,
            &self.access_token_url,
            &self.api_url,
        ];
        require_all(&Self::REQUIRED_KEYS, &values)
    }
}

/// OAuth 1.0a configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth1Config {
    /// Consumer key issued by the provider
    #[serde(default)]
    pub consumer_key: String,
    /// Consumer secret issued by the provider
    #[serde(default)]
    pub consumer_secret: String,
    /// Endpoint issuing temporary request tokens
    #[serde(default)]
    pub request_token_url: String,
    /// Endpoint the user is sent to for authorization
    #[serde(default)]
    pub authorization_url: String,
    /// Endpoint exchanging an authorized request token for an access token
    #[serde(default)]
    pub access_token_url: String,
    /// Base URL prefixed to relative API resources
    #[serde(default)]
    pub api_url: String,
    /// Default callback; `oob` is sent when neither this nor a per-request callback is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    /// How requests are signed
    #[serde(default)]
    pub signature_method: SignatureMethod,
}

impl OAuth1Config {
    /// Keys an OAuth 1.0a configuration must carry, in validation order
    pub const REQUIRED_KEYS: [&'static str; 6] = [
        "consumer_key",
        "consumer_secret",
        "request_token_url",
        "authorization_url",
        "access_token_url",
        "api_url",
    ];

    /// Build from a key/value map, validating required keys
    ///
    /// `callback_url` is optional; `signature_method` accepts `HMAC-SHA1`
    /// (default) or `PLAINTEXT`, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingConfig`] naming the first missing or empty key.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        let signature_method = match map.get("signature_method") {
            Some(m) if m.eq_ignore_ascii_case("PLAINTEXT") => SignatureMethod::Plaintext,
            _ => SignatureMethod::HmacSha1,
        };
        let config = Self {
            consumer_key: lookup(map, "consumer_key"),
            consumer_secret: lookup(map, "consumer_secret"),
            request_token_url: lookup(map, "request_token_url"),
            authorization_url: lookup(map, "authorization_url"),
            access_token_url: lookup(map, "access_token_url"),
            api_url: lookup(map, "api_url"),
            callback_url: map.get("callback_url").filter(|v| !v.is_empty()).cloned(),
            signature_method,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every required key is present and non-empty
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingConfig`] naming the first missing or empty key.
    pub fn validate(&self) -> Result<()> {
        let values = [
            &self.consumer_key,
            &self.consumer_secret,
            &self.request_token_url,
            &self.authorization_url,
            &self.access_token_url,
            &self.api_url,
        ];
        require_all(&Self::REQUIRED_KEYS, &values)
    }
}

/// Configuration for either protocol; the variant decides which flow is built
///
/// In serialized form the protocol is named by an `oauth_version` field
/// (`"1.0"` or `"2.0"`) next to the provider keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "oauth_version")]
pub enum ClientConfig {
    /// OAuth 1.0a
    #[serde(rename = "1.0")]
    OAuth1(OAuth1Config),
    /// OAuth 2.0
    #[serde(rename = "2.0")]
    OAuth2(OAuth2Config),
}

impl ClientConfig {
    /// Select the protocol by the shape of the map and validate it.
    ///
    /// A map carrying `consumer_key` is OAuth 1.0a; anything else is OAuth 2.0.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingConfig`] naming the first missing or empty key.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        if map.contains_key("consumer_key") {
            Ok(Self::OAuth1(OAuth1Config::from_map(map)?))
        } else {
            Ok(Self::OAuth2(OAuth2Config::from_map(map)?))
        }
    }

    /// Protocol version of this configuration
    #[must_use]
    pub fn version(&self) -> OAuthVersion {
        match self {
            Self::OAuth1(_) => OAuthVersion::V1,
            Self::OAuth2(_) => OAuthVersion::V2,
        }
    }

    /// Validate the inner configuration
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingConfig`] naming the first missing or empty key.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::OAuth1(c) => c.validate(),
            Self::OAuth2(c) => c.validate(),
        }
    }
}

impl From<OAuth1Config> for ClientConfig {
    fn from(config: OAuth1Config) -> Self {
        Self::OAuth1(config)
    }
}

impl From<OAuth2Config> for ClientConfig {
    fn from(config: OAuth2Config) -> Self {
        Self::OAuth2(config)
    }
}

fn lookup(map: &HashMap<String, String>, key: &str) -> String {
    map.get(key).cloned().unwrap_or_default()
}

fn require_all(keys: &[&'static str], values: &[&String]) -> Result<()> {
    for (key, value) in keys.iter().copied().zip(values) {
        if value.is_empty() {
            return Err(OAuthError::missing_config(key));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oauth2_map() -> HashMap<String, String> {
        [
            ("client_id", "id"),
            ("client_secret", "secret"),
            ("redirect_url", "https://app.example/cb"),
            ("authorization_url", "https://provider.example/authorize"),
            ("access_token_url", "https://provider.example/token"),
            ("api_url", "https://api.example.com/"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn oauth1_map() -> HashMap<String, String> {
        [
            ("consumer_key", "ck"),
            ("consumer_secret", "cs"),
            ("request_token_url", "https://provider.example/request_token"),
            ("authorization_url", "https://provider.example/authorize"),
            ("access_token_url", "https://provider.example/access_token"),
            ("api_url", "https://api.example.com/"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_every_missing_oauth2_key_is_named() {
        for key in OAuth2Config::REQUIRED_KEYS {
            let mut map = oauth2_map();
            map.remove(key);
            let err = OAuth2Config::from_map(&map).unwrap_err();
            assert!(matches!(err, OAuthError::MissingConfig { key: k } if k == key));
            assert_eq!(err.to_string(), format!("{key} is required."));
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        for key in OAuth1Config::REQUIRED_KEYS {
            let mut map = oauth1_map();
            map.insert(key.to_string(), String::new());
            let err = OAuth1Config::from_map(&map).unwrap_err();
            assert!(matches!(err, OAuthError::MissingConfig { key: k } if k == key));
        }
    }

    #[test]
    fn test_variant_selected_by_shape() {
        let v2 = ClientConfig::from_map(&oauth2_map()).unwrap();
        assert_eq!(v2.version(), OAuthVersion::V2);

        let v1 = ClientConfig::from_map(&oauth1_map()).unwrap();
        assert_eq!(v1.version(), OAuthVersion::V1);
    }

    #[test]
    fn test_oauth1_optional_keys() {
        let mut map = oauth1_map();
        map.insert("callback_url".into(), "https://app.example/cb".into());
        map.insert("signature_method".into(), "plaintext".into());
        let config = OAuth1Config::from_map(&map).unwrap();
        assert_eq!(config.callback_url.as_deref(), Some("https://app.example/cb"));
        assert_eq!(config.signature_method, SignatureMethod::Plaintext);
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = serde_json::json!({
            "client_id": "id",
            "client_secret": "secret",
            "redirect_url": "https://app.example/cb",
            "authorization_url": "https://provider.example/authorize",
            "access_token_url": "https://provider.example/token",
            "api_url": "https://api.example.com/"
        });
        let config: OAuth2Config = serde_json::from_value(json).unwrap();
        assert!(config.validate().is_ok());

        let partial: OAuth2Config =
            serde_json::from_value(serde_json::json!({ "client_id": "id" })).unwrap();
        let err = partial.validate().unwrap_err();
        assert_eq!(err.to_string(), "client_secret is required.");
    }

    #[test]
    fn test_client_config_tagged_by_version() {
        let json = serde_json::json!({
            "oauth_version": "1.0",
            "consumer_key": "ck",
            "consumer_secret": "cs",
            "request_token_url": "https://provider.example/request_token",
            "authorization_url": "https://provider.example/authorize",
            "access_token_url": "https://provider.example/access_token",
            "api_url": "https://api.example.com/"
        });
        let config: ClientConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.version(), OAuthVersion::V1);
        assert!(config.validate().is_ok());
    }
}
