use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use vocab_core::model::{PersistedAuth, User};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Client-side persistence for the authenticated session.
///
/// Token and user are written independently: the HTTP layer owns the token,
/// the session store owns the user.
#[async_trait]
pub trait AuthSessionRepository: Send + Sync {
    /// Load whatever survived the last run.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read or decoded.
    async fn load_auth(&self) -> Result<Option<PersistedAuth>, StorageError>;

    /// Persist the bearer token, or remove it with `None`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the token cannot be written.
    async fn store_token(&self, token: Option<&str>) -> Result<(), StorageError>;

    /// Persist the signed-in user, or remove it with `None`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the user cannot be written.
    async fn store_user(&self, user: Option<&User>) -> Result<(), StorageError>;

    /// Remove every persisted auth value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be cleared.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    auth: Arc<Mutex<PersistedAuth>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repository as if a previous run had persisted `auth`.
    #[must_use]
    pub fn with_auth(auth: PersistedAuth) -> Self {
        Self {
            auth: Arc::new(Mutex::new(auth)),
        }
    }
}

#[async_trait]
impl AuthSessionRepository for InMemoryRepository {
    async fn load_auth(&self) -> Result<Option<PersistedAuth>, StorageError> {
        let guard = self
            .auth
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.is_empty() {
            Ok(None)
        } else {
            Ok(Some(guard.clone()))
        }
    }

    async fn store_token(&self, token: Option<&str>) -> Result<(), StorageError> {
        let mut guard = self
            .auth
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.token = token.map(str::to_owned);
        Ok(())
    }

    async fn store_user(&self, user: Option<&User>) -> Result<(), StorageError> {
        let mut guard = self
            .auth
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.user = user.cloned();
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self
            .auth
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = PersistedAuth::default();
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub auth: Arc<dyn AuthSessionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let auth: Arc<dyn AuthSessionRepository> = Arc::new(InMemoryRepository::new());
        Self { auth }
    }
}
