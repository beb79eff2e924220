use std::sync::Arc;

use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::auth::{AuthService, AuthSessionStore};
use crate::config::ApiConfig;
use crate::dictionary::DictionaryService;
use crate::error::AppServicesError;
use crate::game::{GameApi, GameSessionService, HttpGameApi};
use crate::http::HttpClient;
use crate::reference::ReferenceService;

/// Assembles app-facing services around one HTTP client and auth session.
#[derive(Clone)]
pub struct AppServices {
    http: HttpClient,
    session: AuthSessionStore,
    auth: Arc<AuthService>,
    reference: Arc<ReferenceService>,
    dictionary: Arc<DictionaryService>,
    games: Arc<GameSessionService>,
}

impl AppServices {
    /// Build services over `storage`, rehydrating any persisted session.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be built or the
    /// persisted session cannot be read.
    pub async fn connect(
        config: &ApiConfig,
        storage: Storage,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let http = HttpClient::new(config, Arc::clone(&storage.auth))?;
        let session = AuthSessionStore::boot(http.clone(), Arc::clone(&storage.auth)).await?;
        info!(
            base_url = config.base_url.as_str(),
            authenticated = session.is_authenticated(),
            "services ready"
        );

        let auth = Arc::new(AuthService::new(http.clone(), session.clone()));
        let reference = Arc::new(ReferenceService::new(http.clone(), clock.clone()));
        let dictionary = Arc::new(DictionaryService::new(http.clone(), clock.clone()));
        let game_api: Arc<dyn GameApi> = Arc::new(HttpGameApi::new(http.clone()));
        let games = Arc::new(GameSessionService::new(game_api, clock));

        Ok(Self {
            http,
            session,
            auth,
            reference,
            dictionary,
            games,
        })
    }

    /// Build services with the auth session persisted in `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or boot fails.
    pub async fn new_sqlite(
        config: &ApiConfig,
        db_url: &str,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::connect(config, storage, clock).await
    }

    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    #[must_use]
    pub fn session(&self) -> &AuthSessionStore {
        &self.session
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn reference(&self) -> Arc<ReferenceService> {
        Arc::clone(&self.reference)
    }

    #[must_use]
    pub fn dictionary(&self) -> Arc<DictionaryService> {
        Arc::clone(&self.dictionary)
    }

    #[must_use]
    pub fn games(&self) -> Arc<GameSessionService> {
        Arc::clone(&self.games)
    }
}
