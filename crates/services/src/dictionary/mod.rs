//! Dictionary search and word detail lookups.

mod debounce;

pub use debounce::{Debounced, SEARCH_DEBOUNCE, SearchDebouncer};

use chrono::Duration;
use tracing::debug;

use vocab_core::Clock;
use vocab_core::model::{LanguageId, SearchQuery, WordDetail, WordId, WordSearchResponse};

use crate::cache::QueryCache;
use crate::error::{ApiError, DictionaryError};
use crate::http::{HttpClient, RequestOptions};

/// Search results older than this are refetched.
pub const SEARCH_STALE_AFTER_SECS: i64 = 30;

pub struct DictionaryService {
    http: HttpClient,
    searches: QueryCache<SearchQuery, WordSearchResponse>,
    words: QueryCache<WordId, WordDetail>,
    debouncer: SearchDebouncer,
}

impl DictionaryService {
    #[must_use]
    pub fn new(http: HttpClient, clock: Clock) -> Self {
        Self {
            http,
            searches: QueryCache::new("dictionary.search", clock.clone())
                .with_ttl(Duration::seconds(SEARCH_STALE_AFTER_SECS)),
            words: QueryCache::new("dictionary.word", clock),
            debouncer: SearchDebouncer::default(),
        }
    }

    /// Replace the debouncer, e.g. with a shorter delay.
    #[must_use]
    pub fn with_debouncer(mut self, debouncer: SearchDebouncer) -> Self {
        self.debouncer = debouncer;
        self
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn search(&self, query: &SearchQuery) -> Result<WordSearchResponse, ApiError> {
        let http = &self.http;
        self.searches
            .get_or_fetch(query.clone(), || async move {
                let options = query
                    .to_params()
                    .into_iter()
                    .fold(RequestOptions::new(), |options, (key, value)| {
                        options.query(key, value)
                    });
                http.get_with("/dictionary/search", &options).await
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn word_detail(&self, word_id: WordId) -> Result<WordDetail, ApiError> {
        let http = &self.http;
        self.words
            .get_or_fetch(word_id, || async move {
                http.get(&format!("/dictionary/words/{word_id}")).await
            })
            .await
    }

    /// Debounced search for text typed one keystroke at a time.
    ///
    /// Blank input cancels anything pending and resolves to `Ready(Ok(None))`
    /// without a request.
    pub async fn search_as_you_type(
        &self,
        text: &str,
        language_id: LanguageId,
    ) -> Debounced<Result<Option<WordSearchResponse>, DictionaryError>> {
        if text.trim().is_empty() {
            self.debouncer.cancel_pending();
            return Debounced::Ready(Ok(None));
        }
        let query = match SearchQuery::new(text, language_id) {
            Ok(query) => query,
            Err(err) => return Debounced::Ready(Err(err.into())),
        };
        debug!(text = query.text(), %language_id, "search input");
        let query = &query;
        self.debouncer
            .submit(|| async move {
                self.search(query)
                    .await
                    .map(Some)
                    .map_err(DictionaryError::from)
            })
            .await
    }
}
