use sqlx::Row;
use vocab_core::model::{PersistedAuth, User};

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn user_to_json(user: Option<&User>) -> Result<Option<String>, StorageError> {
    user.map(|u| serde_json::to_string(u).map_err(ser)).transpose()
}

pub(crate) fn map_auth_row(row: &sqlx::sqlite::SqliteRow) -> Result<PersistedAuth, StorageError> {
    let token: Option<String> = row.try_get("token").map_err(ser)?;
    let user_json: Option<String> = row.try_get("user_json").map_err(ser)?;
    let user = user_json
        .as_deref()
        .map(serde_json::from_str::<User>)
        .transpose()
        .map_err(ser)?;
    Ok(PersistedAuth { token, user })
}
