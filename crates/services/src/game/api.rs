use async_trait::async_trait;

use vocab_core::model::{
    Answer, CreateSessionRequest, GameSession, SessionId, SessionStatistics,
    SessionWithQuestions, SubmitAnswerRequest,
};

use crate::error::ApiError;
use crate::http::{HttpClient, Paginated, RequestOptions};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// One page of a session history listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// `page` starts at 1; `page_size` is clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn to_options(self) -> RequestOptions {
        RequestOptions::new()
            .query("page", self.page)
            .query("pageSize", self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Remote game endpoints.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError` if the server refuses or the request fails.
    async fn create_session(&self, request: &CreateSessionRequest)
    -> Result<GameSession, ApiError>;

    /// Load a session with its questions and options.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    async fn get_session(&self, session_id: SessionId) -> Result<SessionWithQuestions, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the server refuses or the request fails.
    async fn submit_answer(
        &self,
        session_id: SessionId,
        request: &SubmitAnswerRequest,
    ) -> Result<Answer, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    async fn session_statistics(&self, session_id: SessionId)
    -> Result<SessionStatistics, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    async fn list_sessions(&self, page: PageRequest) -> Result<Paginated<GameSession>, ApiError>;
}

/// `GameApi` over the `/vocabgames` routes.
#[derive(Clone, Debug)]
pub struct HttpGameApi {
    http: HttpClient,
}

impl HttpGameApi {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<GameSession, ApiError> {
        self.http.post("/vocabgames/sessions", request).await
    }

    async fn get_session(&self, session_id: SessionId) -> Result<SessionWithQuestions, ApiError> {
        self.http
            .get(&format!("/vocabgames/sessions/{session_id}"))
            .await
    }

    async fn submit_answer(
        &self,
        session_id: SessionId,
        request: &SubmitAnswerRequest,
    ) -> Result<Answer, ApiError> {
        self.http
            .post(&format!("/vocabgames/sessions/{session_id}/answers"), request)
            .await
    }

    async fn session_statistics(
        &self,
        session_id: SessionId,
    ) -> Result<SessionStatistics, ApiError> {
        self.http
            .get(&format!("/vocabgames/sessions/{session_id}/statistics"))
            .await
    }

    async fn list_sessions(&self, page: PageRequest) -> Result<Paginated<GameSession>, ApiError> {
        self.http
            .get_paginated("/vocabgames/sessions", &page.to_options())
            .await
    }
}
