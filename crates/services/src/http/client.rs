use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use reqwest::header::ACCEPT;
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use storage::repository::AuthSessionRepository;

use super::envelope::{ErrorBody, Paginated, Pagination, take_data};
use crate::config::ApiConfig;
use crate::error::{ApiError, codes};

const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Invoked after a `TOKEN_EXPIRED` response has cleared local credentials.
pub type TokenExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// Per-request overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

/// Shared HTTP client: base URL, timeout, bearer token, and the
/// token-expiry hook. Clones share all of it.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<Inner>,
}

struct Inner {
    client: Client,
    base_url: String,
    default_timeout: Duration,
    token: RwLock<Option<String>>,
    on_token_expired: RwLock<Option<TokenExpiredHook>>,
    tokens: Arc<dyn AuthSessionRepository>,
}

impl HttpClient {
    /// Build a client for `config`; `tokens` persists the bearer token.
    ///
    /// The client starts without a token; the auth session store injects a
    /// rehydrated one during boot.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the TLS backend cannot be initialised.
    pub fn new(
        config: &ApiConfig,
        tokens: Arc<dyn AuthSessionRepository>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("vocab-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(Self {
            inner: Arc::new(Inner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_owned(),
                default_timeout: config.timeout,
                token: RwLock::new(None),
                on_token_expired: RwLock::new(None),
                tokens,
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.inner.default_timeout
    }

    #[must_use]
    pub fn auth_token(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the in-memory token without touching persistence.
    pub fn inject_token(&self, token: Option<String>) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Replace the token and persist it; `None` removes it from storage.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Storage` if persistence fails. The in-memory token is
    /// updated regardless.
    pub async fn set_auth_token(&self, token: Option<String>) -> Result<(), ApiError> {
        self.inject_token(token.clone());
        self.inner.tokens.store_token(token.as_deref()).await?;
        Ok(())
    }

    /// Register the hook run once per expiry, when a `TOKEN_EXPIRED` response clears the token.
    pub fn set_token_expired_callback(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self
            .inner
            .on_token_expired
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(hook));
    }

    // ─── Verbs ─────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-success status, or a body
    /// whose `data` does not decode as `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get_with(path, &RequestOptions::default()).await
    }

    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        let envelope = self.execute(Method::GET, path, None, options).await?;
        decode_data(envelope)
    }

    /// Fetch a list endpoint that returns `{success, data, pagination}`.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Paginated<T>, ApiError> {
        let mut envelope = self.execute(Method::GET, path, None, options).await?;
        let pagination = match envelope
            .as_object_mut()
            .and_then(|object| object.remove("pagination"))
        {
            Some(value) => serde_json::from_value::<Pagination>(value)
                .map_err(|err| ApiError::Decode(err.to_string()))?,
            None => Pagination::default(),
        };
        let data: Option<Vec<T>> = decode_data(envelope)?;
        Ok(Paginated {
            data: data.unwrap_or_default(),
            pagination,
        })
    }

    /// # Errors
    ///
    /// See [`HttpClient::get`]; also fails if `body` cannot be serialized.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post_with(path, body, &RequestOptions::default()).await
    }

    /// # Errors
    ///
    /// See [`HttpClient::post`].
    pub async fn post_with<B, T>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, body, options).await
    }

    /// # Errors
    ///
    /// See [`HttpClient::post`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, body, &RequestOptions::default())
            .await
    }

    /// # Errors
    ///
    /// See [`HttpClient::post`].
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PATCH, path, body, &RequestOptions::default())
            .await
    }

    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let envelope = self
            .execute(Method::DELETE, path, None, &RequestOptions::default())
            .await?;
        decode_data(envelope)
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)
            .map_err(|err| ApiError::Decode(format!("request body: {err}")))?;
        let envelope = self.execute(method, path, Some(body), options).await?;
        decode_data(envelope)
    }

    // ─── Transport ─────────────────────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.inner.base_url)
        } else {
            format!("{}/{path}", self.inner.base_url)
        }
    }

    /// Send one request and return the parsed success envelope.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: &RequestOptions,
    ) -> Result<Value, ApiError> {
        let timeout = options.timeout.unwrap_or(self.inner.default_timeout);
        let request_id = Uuid::new_v4().to_string();

        let mut request = self
            .inner
            .client
            .request(method.clone(), self.url(path))
            .header(REQUEST_ID_HEADER, &request_id)
            .header(ACCEPT, "application/json");
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(token) = self.auth_token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let started = Instant::now();
        // Dropping the future on timeout aborts the in-flight request.
        let outcome = tokio::time::timeout(timeout, async {
            let response = request.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        })
        .await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (status, bytes) = match outcome {
            Err(_) => {
                warn!(%method, path, elapsed_ms, request_id = %request_id, "request timed out");
                return Err(ApiError::Timeout(timeout));
            }
            Ok(Err(err)) => {
                warn!(%method, path, elapsed_ms, request_id = %request_id, error = %err, "request failed");
                return Err(transport_error(&err, timeout));
            }
            Ok(Ok(pair)) => pair,
        };
        debug!(
            %method,
            path,
            status = status.as_u16(),
            elapsed_ms,
            request_id = %request_id,
            "api request"
        );

        if status.is_success() {
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()));
        }

        let error = ErrorBody::extract(status, &bytes);
        if error.code == codes::TOKEN_EXPIRED {
            self.expire_token().await;
            return Err(ApiError::TokenExpired {
                message: error.message,
            });
        }
        Err(ApiError::Api {
            status: status.as_u16(),
            code: error.code,
            message: error.message,
            details: error.details,
        })
    }

    /// Drop the current token; only the request that actually removes it
    /// clears storage and fires the hook, so concurrent expiries count once.
    async fn expire_token(&self) {
        let removed = self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if removed.is_none() {
            debug!("token already cleared by an earlier expiry");
            return;
        }
        if let Err(err) = self.inner.tokens.clear().await {
            warn!(error = %err, "failed to clear persisted auth session");
        }
        let hook = self
            .inner
            .on_token_expired
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        warn!("token expired; local credentials cleared");
        if let Some(hook) = hook {
            hook();
        }
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.inner.base_url)
            .field("default_timeout", &self.inner.default_timeout)
            .field("has_token", &self.auth_token().is_some())
            .finish_non_exhaustive()
    }
}

fn decode_data<T: DeserializeOwned>(mut envelope: Value) -> Result<T, ApiError> {
    serde_json::from_value(take_data(&mut envelope)).map_err(|err| ApiError::Decode(err.to_string()))
}

fn transport_error(err: &reqwest::Error, timeout: Duration) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout(timeout)
    } else if err.is_builder() {
        ApiError::InvalidUrl(err.to_string())
    } else {
        ApiError::Network(err.to_string())
    }
}
