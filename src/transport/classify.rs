//! Success/failure classification of raw responses

use super::RawResponse;
use crate::decode::{Decoded, decode};
use crate::error::{OAuthError, Result};

/// Decode a response and decide whether it is an error.
///
/// A response is an error when any of these hold:
///
/// - the body could not be structured and is not empty (the text is the message),
/// - the body is a mapping with a non-empty `error` entry (the entry is the message),
/// - the status code is 400 or above (message may be empty).
///
/// Otherwise the decoded body is returned, which may still be plain text.
///
/// # Errors
///
/// Returns [`OAuthError::Protocol`] carrying `url`, the raw body and the status.
pub fn classify(url: &str, response: &RawResponse) -> Result<Decoded> {
    let decoded = decode(&response.body);
    let message = match &decoded {
        Decoded::Text(text) => text.clone(),
        other => other.error_entry().unwrap_or_default(),
    };

    if !message.is_empty() || response.status >= 400 {
        tracing::warn!(url, status = response.status, error = %message, "Provider returned an error");
        return Err(OAuthError::protocol(
            message,
            url,
            response.body.clone(),
            response.status,
        ));
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ResponseInfo;
    use reqwest::header::HeaderMap;
    use serde_json::json;
    use std::time::Duration;

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            headers: HeaderMap::new(),
            header_block: format!("HTTP/1.1 {status}"),
            body: body.to_string(),
            info: ResponseInfo {
                http_code: status,
                effective_url: "https://x/token".into(),
                method: "POST".into(),
                content_type: None,
                total_time: Duration::ZERO,
                request_header: String::new(),
            },
        }
    }

    #[test]
    fn test_error_key_with_ok_status() {
        let err = classify("https://x/token", &response(200, r#"{"error":"bad"}"#)).unwrap_err();
        assert!(matches!(err, OAuthError::Protocol { .. }));
        assert_eq!(err.message(), "bad");
        assert_eq!(err.status_code(), 200);
        assert_eq!(err.body(), r#"{"error":"bad"}"#);
        assert_eq!(err.url(), Some("https://x/token"));
    }

    #[test]
    fn test_status_404_with_empty_body() {
        let err = classify("https://x/missing", &response(404, "")).unwrap_err();
        assert_eq!(err.message(), "");
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_token_mapping_passes_through() {
        let decoded = classify("https://x/token", &response(200, r#"{"access_token":"xyz"}"#))
            .unwrap();
        assert_eq!(decoded, Decoded::Json(json!({"access_token": "xyz"})));
    }

    #[test]
    fn test_unstructured_text_is_an_error() {
        let err = classify("https://x", &response(200, "Service unavailable")).unwrap_err();
        assert_eq!(err.message(), "Service unavailable");
    }

    #[test]
    fn test_empty_body_with_ok_status_is_success() {
        let decoded = classify("https://x", &response(204, "")).unwrap();
        assert_eq!(decoded, Decoded::Text(String::new()));
    }

    #[test]
    fn test_status_500_with_mapping() {
        let err = classify("https://x", &response(500, r#"{"detail":"oops"}"#)).unwrap_err();
        assert_eq!(err.message(), "");
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_form_error() {
        let err = classify("https://x", &response(200, "error=access_denied")).unwrap_err();
        assert_eq!(err.message(), "access_denied");
    }
}
