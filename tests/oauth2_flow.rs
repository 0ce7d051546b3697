//! Integration tests for the OAuth 2.0 flow against a mock provider
//!
//! Every test talks to a local mockito server through the real reqwest
//! transport, so the wire format (query strings, form bodies, headers) is
//! what gets verified.

use std::sync::{Arc, Mutex};

use mockito::{Matcher, Server};
use oauth_flow::{
    AuthorizationRequest, ClientConfig, Decoded, LogLevel, OAuth2Config, OAuthClient, OAuthError,
    OAuthFlow, Params, SharedLogger, TokenGrant,
};
use reqwest::header::HeaderMap;

fn config(base: &str) -> OAuth2Config {
    OAuth2Config {
        client_id: "client-1".into(),
        client_secret: "s3cret".into(),
        redirect_url: "https://app.example/cb".into(),
        authorization_url: format!("{base}/authorize"),
        access_token_url: format!("{base}/token"),
        api_url: format!("{base}/api/"),
    }
}

fn client(base: &str) -> OAuthClient {
    OAuthClient::new(config(base).into()).unwrap()
}

fn recording_logger() -> (SharedLogger, Arc<Mutex<Vec<(LogLevel, String)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let logger: SharedLogger = Arc::new(move |level: LogLevel, message: &str| {
        sink.lock().unwrap().push((level, message.to_string()));
    });
    (logger, seen)
}

// ============================================================================
// Authorization code flow
// ============================================================================

#[tokio::test]
async fn test_full_authorization_code_flow() {
    let mut server = Server::new_async().await;
    let base = server.url();

    let token_mock = server
        .mock("POST", "/token")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_header("expect", Matcher::Missing)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("client_id".into(), "client-1".into()),
            Matcher::UrlEncoded("client_secret".into(), "s3cret".into()),
            Matcher::UrlEncoded("redirect_uri".into(), "https://app.example/cb".into()),
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("code".into(), "auth-code".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"tok-123","expires_in":3600,"token_type":"bearer"}"#)
        .create_async()
        .await;

    let me_mock = server
        .mock("GET", "/api/me")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("fields".into(), "id,name".into()),
            Matcher::UrlEncoded("client_id".into(), "client-1".into()),
            Matcher::UrlEncoded("access_token".into(), "tok-123".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"id":7,"name":"Ada"}"#)
        .create_async()
        .await;

    let mut client = client(&base);

    let request = AuthorizationRequest::builder()
        .scope("profile email")
        .state("xyz")
        .build();
    let auth = client.authorization_url(&request).await.unwrap();
    assert_eq!(
        auth.url(),
        format!(
            "{base}/authorize?client_id=client-1&response_type=code\
             &redirect_uri=https%3A%2F%2Fapp.example%2Fcb&state=xyz&scope=profile+email"
        )
    );
    assert!(auth.secret().is_none());

    let tokens = client
        .exchange_access_token(&TokenGrant::code("auth-code"))
        .await
        .unwrap();
    assert_eq!(tokens.token(), "tok-123");
    assert_eq!(tokens.payload().get_str("expires_in").as_deref(), Some("3600"));

    let me = client
        .fetch(
            "me",
            Params::from([("fields", "id,name")]),
            "GET",
            HeaderMap::new(),
        )
        .await
        .unwrap();
    assert_eq!(me.get_str("name").as_deref(), Some("Ada"));

    token_mock.assert_async().await;
    me_mock.assert_async().await;

    let info = client.last_response_info().unwrap();
    assert_eq!(info.http_code, 200);
    assert_eq!(info.method, "GET");
    assert!(info.effective_url.starts_with(&format!("{base}/api/me?")));
    assert!(info.request_header.starts_with("GET /api/me?"));
}

#[tokio::test]
async fn test_exchange_with_redirect_override_and_form_response() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/token")
        .match_body(Matcher::UrlEncoded(
            "redirect_uri".into(),
            "https://app.example/other".into(),
        ))
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body("access_token=form-tok&expires=3600")
        .create_async()
        .await;

    let mut client = client(&server.url());
    let grant = TokenGrant::builder()
        .token("auth-code")
        .secret_or_redirect("https://app.example/other")
        .build();
    let tokens = client.exchange_access_token(&grant).await.unwrap();

    assert_eq!(tokens.token(), "form-tok");
    assert!(matches!(tokens.payload(), Decoded::Form(_)));
    assert_eq!(client.token().unwrap().token, "form-tok");
    mock.assert_async().await;
}

// ============================================================================
// Error classification
// ============================================================================

#[tokio::test]
async fn test_exchange_error_is_logged_and_returned() {
    let mut server = Server::new_async().await;
    let base = server.url();
    let _mock = server
        .mock("POST", "/token")
        .with_status(400)
        .with_body(r#"{"error":"invalid_grant","error_description":"Code expired"}"#)
        .create_async()
        .await;

    let (logger, seen) = recording_logger();
    let mut client = OAuthClient::builder(config(&base).into())
        .logger(logger)
        .build()
        .unwrap();

    let err = client
        .exchange_access_token(&TokenGrant::code("stale"))
        .await
        .unwrap_err();
    assert!(matches!(err, OAuthError::Protocol { .. }));
    assert_eq!(err.message(), "invalid_grant");
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.url(), Some(format!("{base}/token").as_str()));
    assert!(err.body().contains("Code expired"));
    assert!(client.token().is_none());

    let seen = seen.lock().unwrap();
    assert_eq!(
        seen.as_slice(),
        &[(
            LogLevel::Error,
            format!("Failed to get access token from {base}/token. Error: invalid_grant")
        )]
    );
}

#[tokio::test]
async fn test_error_entry_with_ok_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/token")
        .with_status(200)
        .with_body(r#"{"error":"bad"}"#)
        .create_async()
        .await;

    let mut client = client(&server.url());
    let err = client
        .exchange_access_token(&TokenGrant::code("c"))
        .await
        .unwrap_err();
    assert_eq!(err.message(), "bad");
    assert_eq!(err.status_code(), 200);
}

#[tokio::test]
async fn test_not_found_with_empty_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/missing")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let mut client = client(&server.url());
    client.set_token("tok", None);
    let err = client
        .fetch("missing", Params::new(), "GET", HeaderMap::new())
        .await
        .unwrap_err();

    assert_eq!(err.message(), "");
    assert_eq!(err.status_code(), 404);
    assert_eq!(client.last_response(), Some(""));
    assert!(client.last_response_headers().unwrap().starts_with("HTTP/1.1 404"));
}

#[tokio::test]
async fn test_plain_text_body_is_an_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/status")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("Service temporarily unavailable")
        .create_async()
        .await;

    let mut client = client(&server.url());
    let err = client
        .fetch("status", Params::new(), "GET", HeaderMap::new())
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Service temporarily unavailable");
    assert_eq!(err.status_code(), 200);
}

#[tokio::test]
async fn test_unreachable_provider_reports_status_zero() {
    let mut client = client("http://127.0.0.1:1");

    let err = client
        .exchange_access_token(&TokenGrant::code("c"))
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.status_code(), 0);
    assert_eq!(err.body(), "");
    assert_eq!(err.url(), Some("http://127.0.0.1:1/token"));
    assert!(client.last_response().is_none());
    assert!(client.last_response_info().is_none());
}

// ============================================================================
// Resource resolution
// ============================================================================

#[tokio::test]
async fn test_absolute_resource_bypasses_api_url() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/elsewhere")
        .match_query(Matcher::UrlEncoded("access_token".into(), "tok".into()))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    // api_url points at a host that is never contacted
    let mut client = client("http://127.0.0.1:1");
    client.set_token("tok", None);

    let body = client
        .fetch(
            &format!("{}/elsewhere", server.url()),
            Params::new(),
            "GET",
            HeaderMap::new(),
        )
        .await
        .unwrap();
    assert_eq!(body, Decoded::Json(serde_json::json!([])));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_resource_sends_token_in_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/posts")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("title".into(), "Hello world".into()),
            Matcher::UrlEncoded("client_id".into(), "client-1".into()),
            Matcher::UrlEncoded("access_token".into(), "tok".into()),
        ]))
        .with_status(201)
        .with_body(r#"{"id":"p1"}"#)
        .create_async()
        .await;

    let mut client = client(&server.url());
    client.set_token("tok", None);

    let created = client
        .fetch(
            "posts",
            Params::from([("title", "Hello world")]),
            "post",
            HeaderMap::new(),
        )
        .await
        .unwrap();
    assert_eq!(created.get_str("id").as_deref(), Some("p1"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_last_response_is_stable_between_requests() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/me")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"id":1}"#)
        .create_async()
        .await;

    let mut client = client(&server.url());
    client
        .fetch("me", Params::new(), "GET", HeaderMap::new())
        .await
        .unwrap();

    let first = (
        client.last_response().map(str::to_owned),
        client.last_response_info().cloned(),
    );
    let second = (
        client.last_response().map(str::to_owned),
        client.last_response_info().cloned(),
    );
    assert_eq!(first, second);
}

#[test]
fn test_construction_names_missing_key() {
    let mut config = config("https://provider.example");
    config.api_url.clear();

    let err = OAuthClient::new(ClientConfig::OAuth2(config)).unwrap_err();
    assert_eq!(err.to_string(), "api_url is required.");
}
