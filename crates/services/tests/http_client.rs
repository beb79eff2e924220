mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use serde_json::{Value, json};

use common::{client, memory_repo, ok, serve};
use services::auth::AuthSessionStore;
use services::error::ApiError;
use services::http::{Paginated, RequestOptions};
use storage::repository::{AuthSessionRepository, InMemoryRepository};
use vocab_core::model::{PersistedAuth, User, UserId};

fn user() -> User {
    User {
        id: UserId::new(7),
        email: Some("ana@example.com".into()),
        username: Some("ana".into()),
        created_at: None,
        updated_at: None,
        is_active: true,
    }
}

fn expired_router() -> Router {
    Router::new().route(
        "/users/profile",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                axum::Json(json!({
                    "success": false,
                    "error": {"code": "TOKEN_EXPIRED", "message": "token has expired"}
                })),
            )
        }),
    )
}

#[tokio::test]
async fn success_envelope_is_unwrapped_and_headers_attached() {
    let router = Router::new().route(
        "/echo",
        get(|headers: HeaderMap| async move {
            let auth = headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let request_id = headers
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            ok(json!({"auth": auth, "request_id": request_id}))
        }),
    );
    let base = serve(router).await;
    let http = client(&base, memory_repo());
    http.inject_token(Some("tok-123".into()));

    let body: Value = http.get("/echo").await.unwrap();
    assert_eq!(body["auth"], "Bearer tok-123");
    let request_id = body["request_id"].as_str().expect("request id header");
    assert_eq!(request_id.len(), 36);
}

#[tokio::test]
async fn no_token_means_no_authorization_header() {
    let router = Router::new().route(
        "/echo",
        get(|headers: HeaderMap| async move {
            ok(json!({"has_auth": headers.contains_key("authorization")}))
        }),
    );
    let base = serve(router).await;
    let http = client(&base, memory_repo());

    let body: Value = http.get("/echo").await.unwrap();
    assert_eq!(body["has_auth"], false);
}

#[tokio::test]
async fn nested_error_envelope_becomes_api_error() {
    let router = Router::new().route(
        "/vocabgames/sessions",
        axum::routing::post(|| async {
            (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({
                    "success": false,
                    "error": {
                        "code": "INSUFFICIENT_WORDS",
                        "message": "not enough words",
                        "details": {"available": 3}
                    }
                })),
            )
        }),
    );
    let base = serve(router).await;
    let http = client(&base, memory_repo());

    let err = http
        .post::<_, Value>("/vocabgames/sessions", &json!({}))
        .await
        .unwrap_err();
    match err {
        ApiError::Api {
            status,
            code,
            message,
            details,
        } => {
            assert_eq!(status, 400);
            assert_eq!(code, "INSUFFICIENT_WORDS");
            assert_eq!(message, "not enough words");
            assert_eq!(details, Some(json!({"available": 3})));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_uses_status() {
    let router = Router::new().route(
        "/broken",
        get(|| async { (StatusCode::BAD_GATEWAY, "<html>upstream down</html>") }),
    );
    let base = serve(router).await;
    let http = client(&base, memory_repo());

    let err = http.get::<Value>("/broken").await.unwrap_err();
    assert_eq!(err.code(), Some("HTTP_502"));
    assert_eq!(err.status(), Some(502));
}

#[tokio::test]
async fn token_expired_clears_token_and_fires_callback_once() {
    let base = serve(expired_router()).await;
    let repo = Arc::new(InMemoryRepository::with_auth(PersistedAuth {
        token: Some("stale".into()),
        user: Some(user()),
    }));
    let http = client(&base, repo.clone());
    http.inject_token(Some("stale".into()));

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    http.set_token_expired_callback(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let err = http.get::<Value>("/users/profile").await.unwrap_err();
    assert!(matches!(err, ApiError::TokenExpired { ref message } if message == "token has expired"));
    assert!(http.auth_token().is_none());
    assert!(repo.load_auth().await.unwrap().is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn token_expiry_signs_out_the_session_store() {
    let base = serve(expired_router()).await;
    let repo: Arc<dyn AuthSessionRepository> =
        Arc::new(InMemoryRepository::with_auth(PersistedAuth {
            token: Some("stale".into()),
            user: Some(user()),
        }));
    let http = client(&base, Arc::clone(&repo));
    let store = AuthSessionStore::boot(http.clone(), repo).await.unwrap();
    assert!(store.is_authenticated());

    let err = http.get::<Value>("/users/profile").await.unwrap_err();
    assert!(matches!(err, ApiError::TokenExpired { .. }));
    assert!(!store.is_authenticated());
    assert!(store.current_user().is_none());
    assert_eq!(store.expiry_count(), 1);
}

#[tokio::test]
async fn concurrent_expiries_sign_out_once() {
    // Both requests reach the server before either is answered.
    let barrier = Arc::new(tokio::sync::Barrier::new(2));
    let router = Router::new().route(
        "/users/profile",
        get(move || {
            let barrier = Arc::clone(&barrier);
            async move {
                barrier.wait().await;
                (
                    StatusCode::UNAUTHORIZED,
                    axum::Json(json!({
                        "success": false,
                        "error": {"code": "TOKEN_EXPIRED", "message": "token has expired"}
                    })),
                )
            }
        }),
    );
    let base = serve(router).await;
    let repo: Arc<dyn AuthSessionRepository> =
        Arc::new(InMemoryRepository::with_auth(PersistedAuth {
            token: Some("stale".into()),
            user: Some(user()),
        }));
    let http = client(&base, Arc::clone(&repo));
    let store = AuthSessionStore::boot(http.clone(), repo).await.unwrap();

    let (first, second) = tokio::join!(
        http.get::<Value>("/users/profile"),
        http.get::<Value>("/users/profile")
    );
    assert!(matches!(first, Err(ApiError::TokenExpired { .. })));
    assert!(matches!(second, Err(ApiError::TokenExpired { .. })));
    assert!(!store.is_authenticated());
    assert_eq!(store.expiry_count(), 1);
}

#[tokio::test]
async fn slow_response_times_out() {
    let router = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            ok(json!(null))
        }),
    );
    let base = serve(router).await;
    let http = client(&base, memory_repo());

    let options = RequestOptions::new().timeout(Duration::from_millis(100));
    let err = http.get_with::<Value>("/slow", &options).await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout(timeout) if timeout == Duration::from_millis(100)));
    assert!(err.is_network());
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let http = client(&format!("http://{addr}"), memory_repo());
    let err = http.get::<Value>("/anything").await.unwrap_err();
    assert!(err.is_network(), "expected network error, got {err:?}");
}

#[tokio::test]
async fn paginated_envelope_keeps_metadata() {
    let router = Router::new().route(
        "/vocabgames/sessions",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            axum::Json(json!({
                "success": true,
                "data": [{"n": 1}, {"n": 2}],
                "pagination": {
                    "page": params.get("page").and_then(|p| p.parse::<u32>().ok()),
                    "pageSize": 2,
                    "total": 5,
                    "totalPages": 3,
                    "hasNext": true,
                    "hasPrev": false
                }
            }))
        }),
    );
    let base = serve(router).await;
    let http = client(&base, memory_repo());

    let options = RequestOptions::new().query("page", 1).query("pageSize", 2);
    let page: Paginated<Value> = http
        .get_paginated("/vocabgames/sessions", &options)
        .await
        .unwrap();
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.pagination.page, 1);
    assert_eq!(page.pagination.total, 5);
    assert!(page.pagination.has_next);
    assert!(!page.pagination.has_prev);
}
