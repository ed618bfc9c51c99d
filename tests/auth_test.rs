use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::get,
    Extension, Json, Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value as JsonValue;
use timetracker_backend::middleware::auth::{require_bearer_auth, Claims};
use tower::ServiceExt;

const TEST_SECRET: &str = "test_secret_key";

fn setup() {
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("DATABASE_URL", "postgres://localhost/timetracker_test");
    env::set_var("JWT_SECRET", TEST_SECRET);
    // Subsequent tests in this binary hit the already-initialized config.
    let _ = timetracker_backend::config::init_config();
}

fn protected_router() -> Router {
    async fn whoami(Extension(claims): Extension<Claims>) -> Json<JsonValue> {
        Json(serde_json::json!({ "email": claims.email, "sub": claims.sub }))
    }

    Router::new()
        .route("/protected", get(whoami))
        .layer(axum::middleware::from_fn(require_bearer_auth))
}

fn signed_token(claims: &Claims) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("sign token")
}

fn claims_for(email: &str) -> Claims {
    Claims {
        sub: Some("subject-1".to_string()),
        exp: 4102444800, // 2100-01-01
        email: Some(email.to_string()),
        emails: None,
        preferred_username: None,
        name: Some("Jane Doe".to_string()),
        given_name: None,
        family_name: None,
    }
}

#[tokio::test]
async fn missing_authorization_is_rejected() {
    setup();
    let response = protected_router()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: JsonValue = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "missing_authorization");
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() {
    setup();
    let response = protected_router()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header("Authorization", "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: JsonValue = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "unsupported_scheme");
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    setup();
    let response = protected_router()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header("Authorization", "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: JsonValue = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "invalid_token");
}

#[tokio::test]
async fn token_signed_with_wrong_secret_is_rejected() {
    setup();
    let token = encode(
        &Header::default(),
        &claims_for("a@x.com"),
        &EncodingKey::from_secret(b"some_other_secret"),
    )
    .unwrap();

    let response = protected_router()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_reaches_the_handler_with_claims() {
    setup();
    let token = signed_token(&claims_for("a@x.com"));

    let response = protected_router()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: JsonValue = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["email"], "a@x.com");
    assert_eq!(json["sub"], "subject-1");
}
