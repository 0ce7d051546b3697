//! OAuth 1.0a request signing (RFC 5849)

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use sha1::Sha1;

use crate::config::SignatureMethod;
use crate::error::{OAuthError, Result};
use crate::transport::PreparedRequest;
use crate::utils::{generate_nonce, percent_encode, unix_timestamp};

/// Consumer credentials plus the signature method
#[derive(Debug, Clone)]
pub struct Signer<'a> {
    consumer_key: &'a str,
    consumer_secret: &'a str,
    method: SignatureMethod,
}

/// Per-request signing input
#[derive(Debug, Clone, Default)]
pub struct SigningParams<'a> {
    /// Request or access token, if one is held
    pub token: Option<&'a str>,
    /// Secret belonging to `token`
    pub token_secret: Option<&'a str>,
    /// Extra protocol parameters, e.g. `oauth_callback` or `oauth_verifier`
    pub extra: Vec<(&'static str, String)>,
    /// Fixed nonce; generated when `None`
    pub nonce: Option<String>,
    /// Fixed timestamp; the current time when `None`
    pub timestamp: Option<u64>,
}

impl<'a> Signer<'a> {
    /// Create a signer
    #[must_use]
    pub fn new(consumer_key: &'a str, consumer_secret: &'a str, method: SignatureMethod) -> Self {
        Self {
            consumer_key,
            consumer_secret,
            method,
        }
    }

    /// Sign `request` and set its `Authorization: OAuth ...` header.
    ///
    /// The signature covers the query parameters of the request URL and, for
    /// url-encoded bodies, the body parameters. Multipart bodies are not
    /// covered.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or the header cannot be built.
    pub fn sign(&self, request: &mut PreparedRequest, params: SigningParams<'_>) -> Result<()> {
        let mut oauth = vec![
            ("oauth_consumer_key", self.consumer_key.to_string()),
            (
                "oauth_nonce",
                params.nonce.clone().unwrap_or_else(generate_nonce),
            ),
            ("oauth_signature_method", self.method.as_str().to_string()),
            (
                "oauth_timestamp",
                params.timestamp.unwrap_or_else(unix_timestamp).to_string(),
            ),
        ];
        if let Some(token) = params.token {
            oauth.push(("oauth_token", token.to_string()));
        }
        oauth.push(("oauth_version", "1.0".to_string()));
        oauth.extend(params.extra.iter().cloned());

        let signature = match self.method {
            SignatureMethod::HmacSha1 => {
                let mut all: Vec<(String, String)> = oauth
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), v.clone()))
                    .collect();
                all.extend(request.form_pairs());
                let base = signature_base_string(&request.method, &request.url, &all)?;
                hmac_sha1(&self.signing_key(params.token_secret), &base)?
            }
            SignatureMethod::Plaintext => self.signing_key(params.token_secret),
        };
        oauth.push(("oauth_signature", signature));

        let header = authorization_header(&oauth);
        let value = HeaderValue::from_str(&header)
            .map_err(|e| OAuthError::signature(format!("invalid Authorization header: {e}")))?;
        request.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    /// `consumer_secret&token_secret`, each percent-encoded
    #[must_use]
    pub fn signing_key(&self, token_secret: Option<&str>) -> String {
        format!(
            "{}&{}",
            percent_encode(self.consumer_secret),
            percent_encode(token_secret.unwrap_or_default())
        )
    }
}

/// Build the signature base string: `METHOD&base_url&normalized_params`.
///
/// `params` are the protocol and body parameters; the query parameters of
/// `url` are added here. The base URL drops the query and fragment and keeps
/// the port only when it is not the scheme default.
///
/// # Errors
///
/// Returns [`OAuthError::InvalidUrl`] if `url` does not parse.
pub fn signature_base_string(
    method: &Method,
    url: &str,
    params: &[(String, String)],
) -> Result<String> {
    let parsed = url::Url::parse(url).map_err(|e| OAuthError::invalid_url(url, e.to_string()))?;

    let mut base_url = format!(
        "{}://{}",
        parsed.scheme(),
        parsed.host_str().unwrap_or_default()
    );
    if let Some(port) = parsed.port() {
        base_url.push_str(&format!(":{port}"));
    }
    base_url.push_str(parsed.path());

    let mut encoded: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (percent_encode(&k), percent_encode(&v)))
        .chain(
            params
                .iter()
                .map(|(k, v)| (percent_encode(k), percent_encode(v))),
        )
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "{}&{}&{}",
        method.as_str().to_ascii_uppercase(),
        percent_encode(&base_url),
        percent_encode(&normalized)
    ))
}

fn hmac_sha1(key: &str, text: &str) -> Result<String> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|e| OAuthError::signature(e.to_string()))?;
    mac.update(text.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn authorization_header(oauth: &[(&str, String)]) -> String {
    let fields = oauth
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {fields}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Params;
    use crate::transport::prepare;
    use reqwest::header::HeaderMap;

    // Worked example from Twitter's "Creating a signature" guide
    const CONSUMER_KEY: &str = "xvz1evFS4wEEPTGEFPHBog";
    const CONSUMER_SECRET: &str = "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw";
    const TOKEN: &str = "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb";
    const TOKEN_SECRET: &str = "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE";
    const NONCE: &str = "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg";
    const TIMESTAMP: u64 = 1_318_622_958;

    fn status_update() -> PreparedRequest {
        prepare(
            "https://api.twitter.com/1.1/statuses/update.json?include_entities=true",
            Params::from([("status", "Hello Ladies + Gentlemen, a signed OAuth request!")]),
            "POST",
            HeaderMap::new(),
        )
        .unwrap()
    }

    fn fixed(with_token: bool, token_secret: Option<&'static str>) -> SigningParams<'static> {
        SigningParams {
            token: with_token.then_some(TOKEN),
            token_secret,
            extra: Vec::new(),
            nonce: Some(NONCE.to_string()),
            timestamp: Some(TIMESTAMP),
        }
    }

    #[test]
    fn test_signing_key() {
        let signer = Signer::new(CONSUMER_KEY, CONSUMER_SECRET, SignatureMethod::HmacSha1);
        assert_eq!(
            signer.signing_key(Some(TOKEN_SECRET)),
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw&LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE"
        );
        assert_eq!(signer.signing_key(None), format!("{CONSUMER_SECRET}&"));
    }

    #[test]
    fn test_base_string_matches_reference() {
        let request = status_update();
        let mut params: Vec<(String, String)> = [
            ("oauth_consumer_key", CONSUMER_KEY),
            ("oauth_nonce", NONCE),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "1318622958"),
            ("oauth_token", TOKEN),
            ("oauth_version", "1.0"),
        ]
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
        params.extend(request.form_pairs());

        let base = signature_base_string(&request.method, &request.url, &params).unwrap();
        assert_eq!(
            base,
            "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&\
             include_entities%3Dtrue%26oauth_consumer_key%3Dxvz1evFS4wEEPTGEFPHBog%26\
             oauth_nonce%3DkYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg%26\
             oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1318622958%26\
             oauth_token%3D370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb%26\
             oauth_version%3D1.0%26status%3DHello%2520Ladies%2520%252B%2520Gentlemen\
             %252C%2520a%2520signed%2520OAuth%2520request%2521"
        );
    }

    #[test]
    fn test_hmac_signature_matches_reference() {
        let mut request = status_update();
        let signer = Signer::new(CONSUMER_KEY, CONSUMER_SECRET, SignatureMethod::HmacSha1);
        signer
            .sign(&mut request, fixed(true, Some(TOKEN_SECRET)))
            .unwrap();

        let header = request.headers.get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(header.contains("oauth_token=\"370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb\""));
    }

    #[test]
    fn test_plaintext_signature_is_the_key() {
        let mut request = status_update();
        let signer = Signer::new(CONSUMER_KEY, "cs", SignatureMethod::Plaintext);
        signer.sign(&mut request, fixed(false, None)).unwrap();

        let header = request.headers.get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert!(header.contains("oauth_signature_method=\"PLAINTEXT\""));
        assert!(header.contains("oauth_signature=\"cs%26\""));
        assert!(!header.contains("oauth_token="));
    }

    #[test]
    fn test_extra_params_are_signed_and_sent() {
        let mut request = prepare(
            "https://provider.example/request_token",
            Params::new(),
            "POST",
            HeaderMap::new(),
        )
        .unwrap();
        let signer = Signer::new("ck", "cs", SignatureMethod::HmacSha1);
        let mut params = fixed(false, None);
        params.extra.push(("oauth_callback", "https://app.example/cb".into()));
        signer.sign(&mut request, params).unwrap();

        let header = request.headers.get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert!(header.contains("oauth_callback=\"https%3A%2F%2Fapp.example%2Fcb\""));
    }

    #[test]
    fn test_base_url_keeps_non_default_port() {
        let base = signature_base_string(&Method::GET, "http://Example.COM:8080/a?b=1", &[])
            .unwrap();
        assert_eq!(base, "GET&http%3A%2F%2Fexample.com%3A8080%2Fa&b%3D1");

        let base = signature_base_string(&Method::GET, "https://example.com:443/a", &[]).unwrap();
        assert_eq!(base, "GET&https%3A%2F%2Fexample.com%2Fa&");
    }

    #[test]
    fn test_invalid_url() {
        let err = signature_base_string(&Method::GET, "not a url", &[]).unwrap_err();
        assert!(matches!(err, OAuthError::InvalidUrl { .. }));
    }
}
