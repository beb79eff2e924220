use thiserror::Error;

use crate::model::{ConfigError, LoginError, ProfileError, RegistrationError, SearchError};

/// Any client-side form validation failure, raised before a request is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    Login(#[from] LoginError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Search(#[from] SearchError),
}
