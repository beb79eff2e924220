mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::{Path, Query};
use axum::routing::get;
use serde_json::json;

use common::{client, memory_repo, ok, serve};
use services::dictionary::{Debounced, DictionaryService, SearchDebouncer};
use services::reference::ReferenceService;
use vocab_core::model::{LanguageId, SearchQuery, WordId};
use vocab_core::time::manual_clock;

#[tokio::test]
async fn reference_lists_are_fetched_once() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let router = Router::new()
        .route(
            "/reference/languages",
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    ok(json!([
                        {"id": 1, "code": "en", "name": "English"},
                        {"id": 2, "code": "vi", "name": "Vietnamese"}
                    ]))
                }
            }),
        )
        .route("/reference/topics", get(|| async { ok(json!(null)) }));
    let base = serve(router).await;
    let reference = ReferenceService::new(client(&base, memory_repo()), manual_clock());

    let first = reference.languages().await.unwrap();
    let second = reference.languages().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // A null payload is an empty list.
    assert!(reference.topics().await.unwrap().is_empty());

    reference.invalidate();
    reference.languages().await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn levels_are_cached_per_language_filter() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let router = Router::new().route(
        "/reference/levels",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let language_id = params
                    .get("languageId")
                    .and_then(|id| id.parse::<i64>().ok());
                ok(json!([
                    {"id": 3, "code": "a1", "name": "Beginner", "language_id": language_id}
                ]))
            }
        }),
    );
    let base = serve(router).await;
    let reference = ReferenceService::new(client(&base, memory_repo()), manual_clock());

    let all = reference.levels(None).await.unwrap();
    let english = reference.levels(Some(LanguageId::new(1))).await.unwrap();
    reference.levels(Some(LanguageId::new(1))).await.unwrap();
    reference.levels(None).await.unwrap();

    assert_eq!(all[0].language_id, None);
    assert_eq!(english[0].language_id, Some(LanguageId::new(1)));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

fn dictionary_router(hits: Arc<AtomicUsize>) -> Router {
    let search_hits = Arc::clone(&hits);
    Router::new()
        .route(
            "/dictionary/search",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let counter = Arc::clone(&search_hits);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let q = params.get("q").cloned().unwrap_or_default();
                    ok(json!({
                        "words": [{"id": 11, "language_id": 1, "lemma": q}],
                        "total": 1,
                        "limit": params.get("limit").and_then(|v| v.parse::<u32>().ok()),
                        "offset": params.get("offset").and_then(|v| v.parse::<u32>().ok()),
                    }))
                }
            }),
        )
        .route(
            "/dictionary/words/{id}",
            get(|Path(id): Path<i64>| async move {
                ok(json!({
                    "word": {"id": id, "language_id": 1, "lemma": "house"},
                    "senses": []
                }))
            }),
        )
}

#[tokio::test]
async fn search_sends_query_params_and_caches() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(dictionary_router(Arc::clone(&hits))).await;
    let clock = manual_clock();
    let dictionary = DictionaryService::new(client(&base, memory_repo()), clock.clone());

    let query = SearchQuery::new(" house ", LanguageId::new(1))
        .unwrap()
        .with_page(10, 20);
    let result = dictionary.search(&query).await.unwrap();
    assert_eq!(result.words[0].lemma, "house");
    assert_eq!(result.limit, 10);
    assert_eq!(result.offset, 20);

    dictionary.search(&query).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // Stale after thirty seconds.
    clock.advance_ms(30_000);
    dictionary.search(&query).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    let detail = dictionary.word_detail(WordId::new(11)).await.unwrap();
    assert_eq!(detail.word.id, WordId::new(11));
}

#[tokio::test]
async fn search_as_you_type_skips_blank_input() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(dictionary_router(Arc::clone(&hits))).await;
    let dictionary = DictionaryService::new(client(&base, memory_repo()), manual_clock())
        .with_debouncer(SearchDebouncer::new(std::time::Duration::from_millis(10)));

    let blank = dictionary
        .search_as_you_type("   ", LanguageId::new(1))
        .await;
    assert!(matches!(blank, Debounced::Ready(Ok(None))));
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    let typed = dictionary
        .search_as_you_type("cat", LanguageId::new(1))
        .await
        .ready()
        .expect("not superseded")
        .unwrap()
        .expect("results");
    assert_eq!(typed.words[0].lemma, "cat");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
