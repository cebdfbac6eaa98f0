mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, build_app, json_request_with_bearer, request_with_bearer};
use tower::ServiceExt;

const TOKENS: &str =
    "reader=read.icecream;writer=read.icecream,post.icecream,delete.icecream;admin=*";

fn sample_record(name: &str) -> String {
    format!(
        r#"{{"name":"{}","description":"a test flavour","ingredients":["cream","sugar"]}}"#,
        name
    )
}

#[tokio::test]
async fn test_health_requires_no_auth() {
    let app = build_app(TOKENS);

    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_authorization_header_rejected() {
    let app = build_app(TOKENS);

    let request = axum::http::Request::builder()
        .method(Method::GET)
        .uri("/api/v1/read")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["httpStatus"], 401);
    assert_eq!(body["httpCode"], "unauthorized");
    assert_eq!(body["errors"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_non_bearer_scheme_rejected() {
    let app = build_app(TOKENS);

    let request = axum::http::Request::builder()
        .method(Method::GET)
        .uri("/api/v1/read")
        .header("Authorization", "Basic cmVhZGVyOnBhc3M=")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    // 401 envelopes never carry detail, even for scheme errors.
    assert_eq!(body["errors"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_unknown_token_rejected() {
    let app = build_app(TOKENS);

    let response = app
        .oneshot(request_with_bearer("/api/v1/read", "nope", Method::GET))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_insufficient_scope_rejected() {
    let app = build_app(TOKENS);

    let response = app
        .oneshot(json_request_with_bearer(
            "/api/v1/create",
            "reader",
            Method::POST,
            &sample_record("cherry-garcia"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["httpCode"], "unauthorized");
}

#[tokio::test]
async fn test_wildcard_token_has_blanket_access() {
    let app = build_app(TOKENS);

    let response = app
        .clone()
        .oneshot(json_request_with_bearer(
            "/api/v1/create",
            "admin",
            Method::POST,
            &sample_record("phish-food"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(request_with_bearer(
            "/api/v1/delete/phish-food",
            "admin",
            Method::DELETE,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_crud_round_trip() {
    let app = build_app(TOKENS);

    let response = app
        .clone()
        .oneshot(json_request_with_bearer(
            "/api/v1/create",
            "writer",
            Method::POST,
            &sample_record("half-baked"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(request_with_bearer(
            "/api/v1/read/half-baked",
            "reader",
            Method::GET,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "half-baked");
    assert_eq!(body["description"], "a test flavour");

    let response = app
        .clone()
        .oneshot(json_request_with_bearer(
            "/api/v1/update",
            "writer",
            Method::PUT,
            r#"{"name":"half-baked","description":"updated"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request_with_bearer(
            "/api/v1/delete/half-baked",
            "writer",
            Method::DELETE,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request_with_bearer(
            "/api/v1/read/half-baked",
            "reader",
            Method::GET,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_read_missing_record_is_not_found_envelope() {
    let app = build_app(TOKENS);

    let response = app
        .oneshot(request_with_bearer(
            "/api/v1/read/unknown",
            "reader",
            Method::GET,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["httpCode"], "not_found");
    assert_eq!(body["errors"][0]["code"], "not_found");
}

#[tokio::test]
async fn test_malformed_json_is_format_error() {
    let app = build_app(TOKENS);

    let response = app
        .oneshot(json_request_with_bearer(
            "/api/v1/create",
            "writer",
            Method::POST,
            "{not json",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["httpCode"], "bad_request");
    assert_eq!(body["errors"][0]["code"], "format_error");
}

#[tokio::test]
async fn test_request_id_propagates_into_envelope() {
    let app = build_app(TOKENS);

    let request = axum::http::Request::builder()
        .method(Method::GET)
        .uri("/api/v1/read")
        .header("x-request-id", "test-req-42")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "test-req-42"
    );
    let body = body_json(response).await;
    assert_eq!(body["requestId"], "test-req-42");
}

#[tokio::test]
async fn test_generated_request_id_on_response() {
    let app = build_app(TOKENS);

    let response = app
        .oneshot(request_with_bearer("/api/v1/read", "reader", Method::GET))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_empty_handler_chain_rejects_everything() {
    use creamery::auth::Authenticator;
    use creamery::routes::create_router;
    use creamery::state::AppState;
    use creamery::store::IceCreamStore;
    use std::sync::Arc;

    let config = Arc::new(common::test_config(TOKENS));
    let store: Arc<dyn IceCreamStore> = Arc::new(common::MemoryStore::default());
    let app = create_router(
        AppState { config, store },
        Arc::new(Authenticator::new(Vec::new())),
    );

    let response = app
        .oneshot(request_with_bearer("/api/v1/read", "reader", Method::GET))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
