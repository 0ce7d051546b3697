//! OAuth Flow Demo
//!
//! Walks through the authorization-code flow against a real provider:
//! 1. Load the provider configuration from a JSON file
//! 2. Print the authorization URL to open in a browser
//! 3. Read back the code (OAuth 2.0) or verifier (OAuth 1.0a)
//! 4. Exchange it for an access token
//! 5. Fetch a protected resource with the token
//!
//! The configuration file names the protocol with `oauth_version`:
//!
//! ```json
//! {
//!   "oauth_version": "2.0",
//!   "client_id": "...",
//!   "client_secret": "...",
//!   "redirect_url": "https://localhost/callback",
//!   "authorization_url": "https://provider.example/oauth/authorize",
//!   "access_token_url": "https://provider.example/oauth/token",
//!   "api_url": "https://api.provider.example/"
//! }
//! ```
//!
//! Run with: cargo run --example oauth_demo -- provider.json [RESOURCE] [SCOPE]

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use oauth_flow::{
    AuthorizationRequest, ClientConfig, OAuthClient, OAuthFlow, OAuthVersion, Params, TokenGrant,
    TokenResult, TracingLogger,
};
use reqwest::header::HeaderMap;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oauth_flow=debug".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(config_path) = args.get(1) else {
        print_help();
        return Ok(());
    };
    if matches!(config_path.as_str(), "help" | "--help" | "-h") {
        print_help();
        return Ok(());
    }
    let resource = args.get(2).map_or("me", String::as_str);
    let scope = args.get(3);

    let raw = std::fs::read_to_string(config_path)
        .with_context(|| format!("reading {config_path}"))?;
    let config: ClientConfig =
        serde_json::from_str(&raw).with_context(|| format!("parsing {config_path}"))?;

    let mut client = OAuthClient::builder(config)
        .logger(Arc::new(TracingLogger))
        .build()?;

    println!("OAuth {} flow", client.version());
    println!("─────────────────");
    println!();

    let mut request = AuthorizationRequest::default();
    request.scope = scope.cloned();
    let auth = client.authorization_url(&request).await?;

    println!("Open this URL in your browser and authorize the application:");
    println!();
    println!("  {}", auth.url());
    println!();

    let grant = match client.version() {
        OAuthVersion::V2 => {
            let code = prompt("Paste the `code` parameter from the redirect: ")?;
            TokenGrant::code(code)
        }
        OAuthVersion::V1 => {
            let token = prompt("Paste the `oauth_token` parameter from the callback: ")?;
            let verifier = prompt("Paste the `oauth_verifier` (or PIN): ")?;
            TokenGrant::builder()
                .token(token)
                .secret_or_redirect(auth.secret().unwrap_or_default())
                .verifier(verifier)
                .build()
        }
    };

    let tokens = client.exchange_access_token(&grant).await?;
    println!();
    print_token_info(&tokens);

    println!();
    println!("Fetching {resource}...");
    match client
        .fetch(resource, Params::new(), "GET", HeaderMap::new())
        .await
    {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body.into_json())?);
        }
        Err(e) => {
            eprintln!("Request failed: {e}");
            eprintln!("  HTTP status: {}", e.status_code());
            eprintln!("  Body: {}", e.body());
        }
    }

    if let Some(info) = client.last_response_info() {
        println!();
        println!(
            "Last response: HTTP {} from {} in {:?}",
            info.http_code, info.effective_url, info.total_time
        );
    }

    Ok(())
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_token_info(tokens: &TokenResult) {
    let token = tokens.token();
    println!("Token Information:");
    println!("  Access Token: {}...", &token[..12.min(token.len())]);
    if tokens.secret().is_some() {
        println!("  Token Secret: (received)");
    }
    if let Some(expires) = tokens.payload().get_str("expires_in") {
        println!("  Expires in: {expires}s");
    }
    if let Some(scope) = tokens.payload().get_str("scope") {
        println!("  Scopes: {scope}");
    }
}

fn print_help() {
    println!("Usage: cargo run --example oauth_demo -- CONFIG.json [RESOURCE] [SCOPE]");
    println!();
    println!("Arguments:");
    println!("  CONFIG.json  Provider configuration with an \"oauth_version\" of \"1.0\" or \"2.0\"");
    println!("  RESOURCE     API resource to fetch after authorization (default: me)");
    println!("  SCOPE        Scope to request (OAuth 2.0)");
    println!();
    println!("Set RUST_LOG=oauth_flow=debug to see every request.");
}
