#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use serde_json::{Value, json};

use services::config::ApiConfig;
use services::http::HttpClient;
use storage::repository::{AuthSessionRepository, InMemoryRepository};

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{addr}")
}

pub fn client(base_url: &str, repo: Arc<dyn AuthSessionRepository>) -> HttpClient {
    let config = ApiConfig::new(base_url).expect("valid base url");
    HttpClient::new(&config, repo).expect("http client")
}

pub fn memory_repo() -> Arc<InMemoryRepository> {
    Arc::new(InMemoryRepository::new())
}

pub fn ok(data: Value) -> axum::Json<Value> {
    axum::Json(json!({ "success": true, "data": data }))
}
