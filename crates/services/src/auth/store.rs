use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use tracing::{info, warn};

use storage::repository::AuthSessionRepository;
use vocab_core::model::{AuthState, User};

use crate::error::AuthError;
use crate::http::HttpClient;

/// Authenticated-session context shared by the app.
///
/// Built once by [`AuthSessionStore::boot`]; clones share state.
#[derive(Clone)]
pub struct AuthSessionStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    http: HttpClient,
    repo: Arc<dyn AuthSessionRepository>,
    state: RwLock<AuthState>,
    expirations: AtomicU64,
}

impl StoreInner {
    fn replace(&self, next: AuthState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn expire(&self) {
        self.replace(AuthState::default());
        self.expirations.fetch_add(1, Ordering::SeqCst);
        info!("auth session expired; signed out");
    }
}

impl AuthSessionStore {
    /// Rehydrate the persisted session and wire token-expiry handling.
    ///
    /// Any recovered token is injected into `http` before this returns, so the
    /// first request after boot is already authenticated.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the persisted session cannot be read.
    pub async fn boot(
        http: HttpClient,
        repo: Arc<dyn AuthSessionRepository>,
    ) -> Result<Self, AuthError> {
        let persisted = repo.load_auth().await?.unwrap_or_default();
        let state = AuthState::from_persisted(persisted);
        http.inject_token(state.token.clone());
        if state.is_authenticated {
            info!("restored persisted auth session");
        }

        let inner = Arc::new(StoreInner {
            http: http.clone(),
            repo,
            state: RwLock::new(state),
            expirations: AtomicU64::new(0),
        });
        let weak: Weak<StoreInner> = Arc::downgrade(&inner);
        http.set_token_expired_callback(move || {
            if let Some(inner) = weak.upgrade() {
                inner.expire();
            }
        });
        Ok(Self { inner })
    }

    /// Record a successful sign-in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the token or user cannot be persisted. The
    /// in-memory state is updated first.
    pub async fn login(&self, token: String, user: User) -> Result<(), AuthError> {
        self.inner
            .replace(AuthState::signed_in(token.clone(), user.clone()));
        self.inner.http.set_auth_token(Some(token)).await?;
        self.inner.repo.store_user(Some(&user)).await?;
        info!(user_id = %user.id, "signed in");
        Ok(())
    }

    /// Clear the session locally and in storage.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if persistence cannot be cleared. The in-memory
    /// state and the client token are cleared regardless.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.inner.replace(AuthState::default());
        self.inner.http.inject_token(None);
        self.inner.repo.clear().await?;
        info!("signed out");
        Ok(())
    }

    /// Replace the current user, keeping the token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the user cannot be persisted.
    pub async fn set_user(&self, user: Option<User>) -> Result<(), AuthError> {
        {
            let mut state = self
                .inner
                .state
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            state.user.clone_from(&user);
        }
        if let Err(err) = self.inner.repo.store_user(user.as_ref()).await {
            warn!(error = %err, "failed to persist user");
            return Err(err.into());
        }
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_authenticated
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.state().user
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state().token
    }

    /// How many times the server has expired this session since boot.
    #[must_use]
    pub fn expiry_count(&self) -> u64 {
        self.inner.expirations.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.inner.http
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use storage::repository::InMemoryRepository;
    use vocab_core::model::{PersistedAuth, UserId};

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

    fn http(repo: Arc<dyn AuthSessionRepository>) -> HttpClient {
        HttpClient::new(&ApiConfig::default(), repo).unwrap()
    }

    #[tokio::test]
    async fn boot_rehydrates_token_into_client() {
        let repo: Arc<dyn AuthSessionRepository> =
            Arc::new(InMemoryRepository::with_auth(PersistedAuth {
                token: Some("tok".into()),
                user: Some(user()),
            }));
        let client = http(Arc::clone(&repo));
        let store = AuthSessionStore::boot(client.clone(), repo).await.unwrap();

        assert!(store.is_authenticated());
        assert_eq!(client.auth_token().as_deref(), Some("tok"));
        assert_eq!(store.current_user(), Some(user()));
    }

    #[tokio::test]
    async fn boot_without_persisted_session_is_signed_out() {
        let repo: Arc<dyn AuthSessionRepository> = Arc::new(InMemoryRepository::new());
        let client = http(Arc::clone(&repo));
        let store = AuthSessionStore::boot(client.clone(), repo).await.unwrap();
        assert!(!store.is_authenticated());
        assert!(client.auth_token().is_none());
    }

    #[tokio::test]
    async fn login_then_logout_round_trips_storage() {
        let repo = Arc::new(InMemoryRepository::new());
        let client = http(repo.clone());
        let store = AuthSessionStore::boot(client.clone(), repo.clone())
            .await
            .unwrap();

        store.login("tok".into(), user()).await.unwrap();
        assert!(store.is_authenticated());
        assert_eq!(client.auth_token().as_deref(), Some("tok"));
        let persisted = repo.load_auth().await.unwrap().unwrap();
        assert_eq!(persisted.token.as_deref(), Some("tok"));
        assert_eq!(persisted.user, Some(user()));

        store.logout().await.unwrap();
        assert!(!store.is_authenticated());
        assert!(client.auth_token().is_none());
        assert!(repo.load_auth().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_user_keeps_token() {
        let repo = Arc::new(InMemoryRepository::new());
        let store = AuthSessionStore::boot(http(repo.clone()), repo.clone())
            .await
            .unwrap();
        store.login("tok".into(), user()).await.unwrap();

        let mut renamed = user();
        renamed.username = Some("ana2".into());
        store.set_user(Some(renamed.clone())).await.unwrap();

        assert_eq!(store.token().as_deref(), Some("tok"));
        assert_eq!(store.current_user(), Some(renamed));
    }
}
