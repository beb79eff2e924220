use tracing::info;

use vocab_core::ValidationError;
use vocab_core::model::{
    Availability, LoginDraft, LoginResponse, ProfileDraft, RegisterDraft, RegisterResponse, User,
    UserProfile,
};

use super::AuthSessionStore;
use crate::error::AuthError;
use crate::http::{HttpClient, RequestOptions};

/// Account endpoints layered over the session store.
#[derive(Clone)]
pub struct AuthService {
    http: HttpClient,
    store: AuthSessionStore,
}

impl AuthService {
    #[must_use]
    pub fn new(http: HttpClient, store: AuthSessionStore) -> Self {
        Self { http, store }
    }

    #[must_use]
    pub fn store(&self) -> &AuthSessionStore {
        &self.store
    }

    /// Create an account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` before any request when the form is
    /// invalid, or `AuthError::Api` if the server rejects it.
    pub async fn register(&self, draft: &RegisterDraft) -> Result<RegisterResponse, AuthError> {
        let request = draft.validate().map_err(ValidationError::from)?;
        let response: RegisterResponse = self.http.post("/auth/register", &request).await?;
        info!(user_id = %response.user_id, "registered account");
        Ok(response)
    }

    /// Sign in with an email or username and store the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` before any request when the form is
    /// invalid, `AuthError::Api` on rejected credentials, or
    /// `AuthError::Storage` if the session cannot be persisted.
    pub async fn login(&self, draft: &LoginDraft) -> Result<User, AuthError> {
        let request = draft.validate().map_err(ValidationError::from)?;
        let response: LoginResponse = self.http.post("/auth/login", &request).await?;
        let user = response.user();
        self.store.login(response.token, user.clone()).await?;
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns `AuthError` if local persistence cannot be cleared.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.store.logout().await
    }

    /// # Errors
    ///
    /// Returns `AuthError::Api` if the request fails.
    pub async fn check_email(&self, email: &str) -> Result<Availability, AuthError> {
        let options = RequestOptions::new().query("email", email.trim());
        Ok(self.http.get_with("/auth/check-email", &options).await?)
    }

    /// # Errors
    ///
    /// Returns `AuthError::Api` if the request fails.
    pub async fn check_username(&self, username: &str) -> Result<Availability, AuthError> {
        let options = RequestOptions::new().query("username", username.trim());
        Ok(self.http.get_with("/auth/check-username", &options).await?)
    }

    /// # Errors
    ///
    /// Returns `AuthError::Api` if the request fails.
    pub async fn profile(&self) -> Result<UserProfile, AuthError> {
        Ok(self.http.get("/users/profile").await?)
    }

    /// # Errors
    ///
    /// Returns `AuthError::Validation` before any request when the form is
    /// invalid, or `AuthError::Api` if the server rejects it.
    pub async fn update_profile(&self, draft: &ProfileDraft) -> Result<UserProfile, AuthError> {
        let request = draft.validate().map_err(ValidationError::from)?;
        Ok(self.http.put("/users/profile", &request).await?)
    }
}
