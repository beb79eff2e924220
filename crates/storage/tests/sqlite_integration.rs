use storage::repository::AuthSessionRepository;
use storage::sqlite::SqliteRepository;
use vocab_core::model::{User, UserId};

fn user() -> User {
    User {
        id: UserId::new(42),
        email: Some("ana@example.com".into()),
        username: Some("ana".into()),
        created_at: None,
        updated_at: None,
        is_active: true,
    }
}

async fn repo(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_persists_token_and_user() {
    let repo = repo("memdb_auth_roundtrip").await;
    assert!(repo.load_auth().await.unwrap().is_none());

    repo.store_token(Some("bearer-123")).await.unwrap();
    repo.store_user(Some(&user())).await.unwrap();

    let loaded = repo.load_auth().await.unwrap().expect("persisted");
    assert_eq!(loaded.token.as_deref(), Some("bearer-123"));
    assert_eq!(loaded.user, Some(user()));
}

#[tokio::test]
async fn sqlite_removing_token_keeps_user() {
    let repo = repo("memdb_auth_remove_token").await;
    repo.store_user(Some(&user())).await.unwrap();
    repo.store_token(Some("bearer-123")).await.unwrap();

    repo.store_token(None).await.unwrap();

    let loaded = repo.load_auth().await.unwrap().expect("user persisted");
    assert!(loaded.token.is_none());
    assert_eq!(loaded.user.map(|u| u.id), Some(UserId::new(42)));
}

#[tokio::test]
async fn sqlite_clear_and_migrate_are_idempotent() {
    let repo = repo("memdb_auth_clear").await;
    repo.store_token(Some("bearer-123")).await.unwrap();
    repo.clear().await.unwrap();
    repo.migrate().await.expect("second migrate is a no-op");

    assert!(repo.load_auth().await.unwrap().is_none());
}
