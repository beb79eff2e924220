use serde::{Deserialize, Serialize};

use crate::model::User;

/// In-memory authentication state held by the session store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
}

impl AuthState {
    #[must_use]
    pub fn signed_in(token: String, user: User) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            is_authenticated: true,
        }
    }

    /// Rebuild state from what survived a restart. A token alone is enough to
    /// count as authenticated; the user may be refetched later.
    #[must_use]
    pub fn from_persisted(persisted: PersistedAuth) -> Self {
        let is_authenticated = persisted.token.is_some();
        Self {
            user: persisted.user,
            token: persisted.token,
            is_authenticated,
        }
    }
}

/// Auth values persisted in client storage across restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAuth {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl PersistedAuth {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none()
    }
}
