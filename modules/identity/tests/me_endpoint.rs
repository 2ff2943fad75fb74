//! `GET /api/me` behind the ingress stack, with a mocked JWKS endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use httpmock::prelude::*;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use tracing_test::traced_test;

use api_ingress::ApiIngress;
use identity::Identity;
use modkit::contracts::RestHostModule;
use modkit::{ConfigProvider, Module, ModuleCtxBuilder, RestfulModule};

const KEY_1: &str = include_str!("fixtures/rsa_key_1.pem");
const KEY_2: &str = include_str!("fixtures/rsa_key_2.pem");
const JWKS_1: &str = include_str!("fixtures/jwks_1.json");
const JWKS_2: &str = include_str!("fixtures/jwks_2.json");

const DOMAIN: &str = "tenant.example";
const ISSUER: &str = "https://tenant.example/";
const AUDIENCE: &str = "https://api.rhiz.om";
const JWKS_PATH: &str = "/.well-known/jwks.json";

struct MapConfig(HashMap<String, Value>);

impl ConfigProvider for MapConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&Value> {
        self.0.get(module_name)
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn jwks(sets: &[&str]) -> Value {
    let keys: Vec<Value> = sets
        .iter()
        .flat_map(|s| {
            let v: Value = serde_json::from_str(s).unwrap();
            v["keys"].as_array().cloned().unwrap()
        })
        .collect();
    json!({ "keys": keys })
}

fn claims() -> Value {
    json!({
        "sub": "auth0|user-42",
        "iss": ISSUER,
        "aud": AUDIENCE,
        "iat": now(),
        "exp": now() + 3600,
        "scope": "openid profile"
    })
}

fn sign(pem: &str, kid: Option<&str>, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_owned);
    encode(
        &header,
        claims,
        &EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap(),
    )
    .unwrap()
}

fn token(claims: &Value) -> String {
    sign(KEY_1, Some("test-key-1"), claims)
}

async fn app(server: &MockServer, overrides: Value) -> Router {
    let mut section = json!({
        "domain": DOMAIN,
        "audience": AUDIENCE,
        "jwks_url": server.url(JWKS_PATH),
    });
    if let (Some(base), Some(extra)) = (section.as_object_mut(), overrides.as_object()) {
        base.extend(extra.clone());
    }

    let mut map = HashMap::new();
    map.insert(identity::MODULE_NAME.to_string(), section);
    let provider: Arc<dyn ConfigProvider> = Arc::new(MapConfig(map));
    let ctx_for = |name: &str| {
        ModuleCtxBuilder::new()
            .with_config_provider(provider.clone())
            .for_module(name)
            .build()
    };

    let ingress = ApiIngress::new("127.0.0.1:0");
    let module = Identity::default();
    let host_ctx = ctx_for(api_ingress::MODULE_NAME);
    let module_ctx = ctx_for(identity::MODULE_NAME);

    ingress.init(&host_ctx).await.unwrap();
    module.init(&module_ctx).await.unwrap();

    let router = ingress.rest_prepare(&host_ctx, Router::new()).unwrap();
    let router = module.register_rest(&module_ctx, router).unwrap();
    ingress.rest_finalize(&host_ctx, router).unwrap()
}

fn me(authorization: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().uri("/api/me");
    if let Some(value) = authorization {
        req = req.header("authorization", value);
    }
    req.body(Body::empty()).unwrap()
}

fn bearer(token: &str) -> Option<String> {
    Some(format!("Bearer {token}"))
}

async fn text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn serve_jwks(server: &MockServer, body: Value) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(GET).path(JWKS_PATH);
            then.status(200).json_body(body);
        })
        .await
}

#[tokio::test]
async fn missing_header_is_unauthorized() {
    let server = MockServer::start_async().await;
    let response = app(&server, json!({})).await.oneshot(me(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(text(response).await, "Unauthorized");
}

#[tokio::test]
async fn non_bearer_scheme_is_unauthorized() {
    let server = MockServer::start_async().await;
    let response = app(&server, json!({}))
        .await
        .oneshot(me(Some("Basic dXNlcjpwYXNz")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(text(response).await, "Unauthorized");
}

#[tokio::test]
async fn valid_token_returns_claims() {
    let server = MockServer::start_async().await;
    let jwks_mock = serve_jwks(&server, jwks(&[JWKS_1])).await;

    let response = app(&server, json!({}))
        .await
        .oneshot(me(bearer(&token(&claims())).as_deref()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&text(response).await).unwrap();
    assert_eq!(
        body["message"],
        "Hello from a protected endpoint! You are authenticated."
    );
    assert_eq!(body["user_id"], "auth0|user-42");
    assert_eq!(body["payload"]["scope"], "openid profile");
    assert_eq!(body["payload"]["aud"], AUDIENCE);
    jwks_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn token_without_sub_has_empty_user_id() {
    let server = MockServer::start_async().await;
    serve_jwks(&server, jwks(&[JWKS_1])).await;

    let mut claims = claims();
    claims.as_object_mut().unwrap().remove("sub");

    let response = app(&server, json!({}))
        .await
        .oneshot(me(bearer(&token(&claims)).as_deref()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&text(response).await).unwrap();
    assert_eq!(body["user_id"], "");
}

#[tokio::test]
async fn token_without_kid_uses_the_only_key() {
    let server = MockServer::start_async().await;
    serve_jwks(&server, jwks(&[JWKS_1])).await;

    let response = app(&server, json!({}))
        .await
        .oneshot(me(bearer(&sign(KEY_1, None, &claims())).as_deref()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[traced_test]
async fn rejected_tokens_are_invalid() {
    let server = MockServer::start_async().await;
    serve_jwks(&server, jwks(&[JWKS_1])).await;
    let app = app(&server, json!({})).await;

    let mut expired = claims();
    expired["exp"] = json!(now() - 3600);
    let mut wrong_aud = claims();
    wrong_aud["aud"] = json!("https://someone-else");
    let mut wrong_iss = claims();
    wrong_iss["iss"] = json!("https://evil.example/");
    let mut future = claims();
    future["nbf"] = json!(now() + 3600);

    let cases = [
        ("expired", token(&expired)),
        ("wrong audience", token(&wrong_aud)),
        ("wrong issuer", token(&wrong_iss)),
        ("not yet valid", token(&future)),
        // Signed by a key the JWKS does not hold, under a trusted kid.
        ("forged signature", sign(KEY_2, Some("test-key-1"), &claims())),
        ("garbage", "not-a-jwt".to_string()),
        ("empty", String::new()),
    ];

    for (name, token) in cases {
        let response = app
            .clone()
            .oneshot(me(bearer(&token).as_deref()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "case {name}");
        assert_eq!(text(response).await, "Invalid token", "case {name}");
    }

    assert!(logs_contain("Token validation failed"));
    assert!(logs_contain("token expired"));
    assert!(logs_contain("audience mismatch"));
    assert!(logs_contain("issuer mismatch"));
}

#[tokio::test]
async fn disallowed_algorithm_never_reaches_jwks() {
    let server = MockServer::start_async().await;
    let jwks_mock = serve_jwks(&server, jwks(&[JWKS_1])).await;

    let hs_token = encode(
        &Header::new(Algorithm::HS256),
        &claims(),
        &EncodingKey::from_secret(b"shared-secret"),
    )
    .unwrap();

    let response = app(&server, json!({}))
        .await
        .oneshot(me(bearer(&hs_token).as_deref()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(text(response).await, "Invalid token");
    jwks_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn rotated_key_is_picked_up_by_refetch() {
    let server = MockServer::start_async().await;
    let old = serve_jwks(&server, jwks(&[JWKS_1])).await;
    let app = app(&server, json!({ "jwks_cooldown_secs": 0 })).await;

    let response = app
        .clone()
        .oneshot(me(bearer(&token(&claims())).as_deref()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    old.delete_async().await;
    serve_jwks(&server, jwks(&[JWKS_1, JWKS_2])).await;

    let rotated = sign(KEY_2, Some("test-key-2"), &claims());
    let response = app.oneshot(me(bearer(&rotated).as_deref())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[traced_test]
async fn stale_keys_are_served_when_refresh_fails() {
    let server = MockServer::start_async().await;
    let jwks_mock = serve_jwks(&server, jwks(&[JWKS_1])).await;
    let app = app(
        &server,
        json!({ "jwks_cache_ttl_secs": 0, "jwks_cooldown_secs": 0 }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(me(bearer(&token(&claims())).as_deref()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Unmatched requests get a 404 from the mock server.
    jwks_mock.delete_async().await;

    let response = app
        .oneshot(me(bearer(&token(&claims())).as_deref()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(logs_contain("JWKS refresh failed, serving cached keys"));
}

#[tokio::test]
async fn other_routes_are_not_guarded() {
    let server = MockServer::start_async().await;
    let app = app(&server, json!({})).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn section_without_audience_fails_init() {
    let mut map = HashMap::new();
    map.insert(
        identity::MODULE_NAME.to_string(),
        json!({ "domain": DOMAIN }),
    );
    let ctx = ModuleCtxBuilder::new()
        .with_config_provider(Arc::new(MapConfig(map)))
        .for_module(identity::MODULE_NAME)
        .build();

    let err = Identity::default().init(&ctx).await.unwrap_err();
    assert_eq!(err.to_string(), "identity.audience must be set");
}
