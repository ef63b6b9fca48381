mod common;

use std::{
    net::SocketAddr,
    time::{Duration, Instant},
};

use axum::{Json, Router, http::StatusCode, routing::get};
use coffee_shop_api::{
    config::Config,
    services::auth::{AuthFailure, HttpKeySource, KeySource, build_auth_gate},
};
use serde_json::{Value, json};
use url::Url;

use common::*;

/// Serve `router` on an ephemeral local port.
async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    addr
}

fn authority() -> Router {
    Router::new().route(
        "/.well-known/jwks.json",
        get(|| async { Json(trusted_jwks_json()) }),
    )
}

fn jwks_url(addr: SocketAddr) -> Url {
    Url::parse(&format!("http://{addr}/.well-known/jwks.json")).expect("url")
}

#[tokio::test]
async fn fetches_key_set_over_http() {
    let addr = serve(authority()).await;
    let source = HttpKeySource::new(jwks_url(addr), Duration::from_secs(2)).expect("client");

    let keys = source.fetch().await.expect("key set");

    assert_eq!(keys.len(), 1);
    assert!(keys.find(TRUSTED_KID).is_some());
    assert!(keys.find("other").is_none());
}

#[tokio::test]
async fn error_status_is_a_fetch_failure() {
    let addr = serve(Router::new().route(
        "/.well-known/jwks.json",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    ))
    .await;
    let source = HttpKeySource::new(jwks_url(addr), Duration::from_secs(2)).expect("client");

    assert!(source.fetch().await.is_err());
}

#[tokio::test]
async fn slow_authority_times_out() {
    let addr = serve(Router::new().route(
        "/.well-known/jwks.json",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Json(trusted_jwks_json())
        }),
    ))
    .await;
    let source =
        HttpKeySource::new(jwks_url(addr), Duration::from_millis(200)).expect("client");

    let started = Instant::now();
    assert!(source.fetch().await.is_err());
    assert!(started.elapsed() < Duration::from_secs(5));
}

fn config_for(addr: SocketAddr, extra: &[(&str, &str)]) -> Config {
    let domain = format!("http://{addr}");
    let mut vars: Vec<(String, String)> = vec![
        ("DATABASE_URL".into(), "postgres://localhost/coffee".into()),
        ("AUTH_DOMAIN".into(), domain),
        ("API_AUDIENCE".into(), AUDIENCE.into()),
        ("JWKS_FETCH_TIMEOUT_SECONDS".into(), "1".into()),
        ("JWKS_FETCH_RETRIES".into(), "0".into()),
    ];
    vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    Config::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .expect("config")
}

fn claims_for_issuer(issuer: &str, permissions: &[&str]) -> Value {
    let mut body = claims(permissions);
    body["iss"] = json!(issuer);
    body
}

#[tokio::test]
async fn gate_from_config_verifies_against_local_authority() {
    let addr = serve(authority()).await;
    let config = config_for(addr, &[]);
    let gate = build_auth_gate(&config).expect("gate");

    let body = claims_for_issuer(&config.auth_issuer, &["get:drinks-detail"]);
    let token = mint(Some(TRUSTED_KID), TRUSTED_PEM, &body);

    let verified = gate
        .authorize(Some(&bearer(&token)), "get:drinks-detail")
        .await
        .expect("allowed");
    assert_eq!(verified.issuer(), Some(config.auth_issuer.as_str()));

    // default issuer (https://coffee.test.auth0.com/) does not match the local authority
    let foreign = mint(Some(TRUSTED_KID), TRUSTED_PEM, &claims(&["get:drinks-detail"]));
    let err = gate
        .authorize(Some(&bearer(&foreign)), "get:drinks-detail")
        .await
        .unwrap_err();
    assert_eq!(err, AuthFailure::InvalidClaims);
}

#[tokio::test]
async fn issuer_check_can_be_disabled() {
    let addr = serve(authority()).await;
    let config = config_for(addr, &[("AUTH_ENFORCE_ISSUER", "false")]);
    let gate = build_auth_gate(&config).expect("gate");

    let foreign = mint(Some(TRUSTED_KID), TRUSTED_PEM, &claims(&["get:drinks-detail"]));
    assert!(
        gate.authorize(Some(&bearer(&foreign)), "get:drinks-detail")
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn unreachable_authority_is_key_fetch_failed() {
    // bind then drop: nothing listens on this port any more
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let config = config_for(addr, &[]);
    let gate = build_auth_gate(&config).expect("gate");
    let body = claims_for_issuer(&config.auth_issuer, &["get:drinks-detail"]);
    let token = mint(Some(TRUSTED_KID), TRUSTED_PEM, &body);

    let err = gate
        .authorize(Some(&bearer(&token)), "get:drinks-detail")
        .await
        .unwrap_err();

    assert_eq!(err, AuthFailure::KeyFetchFailed);
}
