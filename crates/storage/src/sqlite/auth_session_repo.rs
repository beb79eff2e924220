use async_trait::async_trait;
use chrono::Utc;
use vocab_core::model::{PersistedAuth, User};

use crate::repository::{AuthSessionRepository, StorageError};

use super::SqliteRepository;
use super::mapping::{map_auth_row, user_to_json};

fn conn(err: sqlx::Error) -> StorageError {
    StorageError::Connection(err.to_string())
}

#[async_trait]
impl AuthSessionRepository for SqliteRepository {
    async fn load_auth(&self) -> Result<Option<PersistedAuth>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT token, user_json
            FROM auth_session
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let auth = map_auth_row(&row)?;
        Ok((!auth.is_empty()).then_some(auth))
    }

    async fn store_token(&self, token: Option<&str>) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO auth_session (id, token, updated_at)
            VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET
                token = excluded.token,
                updated_at = excluded.updated_at
            ",
        )
        .bind(token)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn store_user(&self, user: Option<&User>) -> Result<(), StorageError> {
        let user_json = user_to_json(user)?;
        sqlx::query(
            r"
            INSERT INTO auth_session (id, user_json, updated_at)
            VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET
                user_json = excluded.user_json,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM auth_session WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
