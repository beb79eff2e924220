mod common;

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde_json::{Value, json};

use common::{client, memory_repo, ok, serve};
use services::game::{GameApi, GameSessionService, HttpGameApi, PageRequest};
use vocab_core::model::{LanguageId, LevelId, OptionId, SessionConfigDraft, TopicId};
use vocab_core::time::manual_clock;

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<Value>>>,
}

fn session_json(id: i64) -> Value {
    json!({
        "id": id,
        "user_id": 1,
        "mode": "level",
        "source_language_id": 1,
        "target_language_id": 2,
        "level_id": 3,
        "total_questions": 1,
        "correct_questions": 0,
        "started_at": "2024-01-01T00:00:00Z"
    })
}

fn question_json(session_id: i64) -> Value {
    let options: Vec<Value> = ["A", "B", "C", "D"]
        .iter()
        .enumerate()
        .map(|(offset, label)| {
            json!({
                "id": 10 + offset,
                "question_id": 5,
                "option_label": label,
                "target_word_id": 200 + offset,
                "word_text": format!("choice {label}")
            })
        })
        .collect();
    json!({
        "id": 5,
        "session_id": session_id,
        "question_order": 1,
        "question_type": "translation",
        "source_word_id": 99,
        "source_word_text": "house",
        "options": options
    })
}

fn game_router(recorded: Recorded) -> Router {
    Router::new()
        .route(
            "/vocabgames/sessions",
            post(
                |State(recorded): State<Recorded>, axum::Json(body): axum::Json<Value>| async move {
                    recorded.bodies.lock().unwrap().push(body);
                    (StatusCode::CREATED, ok(session_json(41)))
                },
            )
            .get(|| async {
                axum::Json(json!({
                    "success": true,
                    "data": [session_json(41)],
                    "pagination": {"page": 1, "pageSize": 20, "total": 1, "totalPages": 1}
                }))
            }),
        )
        .route(
            "/vocabgames/sessions/{id}",
            get(|Path(id): Path<i64>| async move {
                ok(json!({"session": session_json(id), "questions": [question_json(id)]}))
            }),
        )
        .route(
            "/vocabgames/sessions/{id}/answers",
            post(
                |State(recorded): State<Recorded>,
                 Path(id): Path<i64>,
                 axum::Json(body): axum::Json<Value>| async move {
                    recorded.bodies.lock().unwrap().push(body.clone());
                    (
                        StatusCode::CREATED,
                        ok(json!({
                            "id": 1,
                            "question_id": body["question_id"],
                            "session_id": id,
                            "user_id": 1,
                            "selected_option_id": body["selected_option_id"],
                            "is_correct": true,
                            "response_time_ms": body["response_time_ms"],
                            "answered_at": "2024-01-01T00:00:02Z"
                        })),
                    )
                },
            ),
        )
        .route(
            "/vocabgames/sessions/{id}/statistics",
            get(|Path(id): Path<i64>| async move {
                ok(json!({
                    "session_id": id,
                    "total_questions": 1,
                    "correct_answers": 1,
                    "accuracy": 100.0,
                    "average_response_time_ms": 1200.0
                }))
            }),
        )
        .with_state(recorded)
}

#[tokio::test]
async fn full_round_trip_over_http() {
    let recorded = Recorded::default();
    let base = serve(game_router(recorded.clone())).await;
    let api: Arc<dyn GameApi> = Arc::new(HttpGameApi::new(client(&base, memory_repo())));
    let clock = manual_clock();
    let games = GameSessionService::new(api, clock.clone())
        .with_feedback_delay(std::time::Duration::ZERO);

    let draft = SessionConfigDraft::level(LanguageId::new(1), LanguageId::new(2), LevelId::new(3))
        .with_topics([TopicId::new(8), TopicId::new(7)]);
    let mut play = games.create(&draft).await.unwrap();
    play.begin(clock.now()).unwrap();
    clock.advance_ms(1200);
    let outcome = games.submit(&mut play, OptionId::new(10)).await.unwrap();
    assert!(outcome.is_complete);

    let bodies = recorded.bodies.lock().unwrap().clone();
    assert_eq!(
        bodies[0],
        json!({
            "mode": "level",
            "source_language_id": 1,
            "target_language_id": 2,
            "level_id": 3,
            "topic_ids": [7, 8]
        })
    );
    assert_eq!(
        bodies[1],
        json!({"question_id": 5, "selected_option_id": 10, "response_time_ms": 1200})
    );

    let stats = games.statistics(&play).await.unwrap();
    assert_eq!(stats.correct_answers, 1);
    assert_eq!(stats.average_response_time_ms, Some(1200.0));

    let history = games.history(PageRequest::default()).await.unwrap();
    assert_eq!(history.data.len(), 1);
    assert_eq!(history.pagination.total, 1);
}
