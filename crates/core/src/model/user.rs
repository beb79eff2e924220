use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use validator::ValidateEmail;

use crate::model::UserId;

const DISPLAY_NAME_MAX: usize = 100;
const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 100;
const PASSWORD_MIN: usize = 6;
const AVATAR_URL_MAX: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Best human-readable handle: username, then email, then the numeric id.
    #[must_use]
    pub fn handle(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| format!("user #{}", self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub available: bool,
    pub exists: bool,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

//
// ─── REGISTRATION ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistrationError {
    #[error("display name must be at most {DISPLAY_NAME_MAX} characters")]
    DisplayNameTooLong,
    #[error("username must be at least {USERNAME_MIN} characters")]
    UsernameTooShort,
    #[error("username must be at most {USERNAME_MAX} characters")]
    UsernameTooLong,
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("enter an email or a username")]
    MissingIdentity,
    #[error("password must be at least {PASSWORD_MIN} characters")]
    PasswordTooShort,
    #[error("password confirmation does not match")]
    PasswordMismatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterDraft {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterDraft {
    /// Validate the form; empty strings count as absent.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError` for the first failing rule.
    pub fn validate(&self) -> Result<RegisterRequest, RegistrationError> {
        let display_name = non_empty(&self.display_name);
        if display_name
            .as_ref()
            .is_some_and(|name| name.chars().count() > DISPLAY_NAME_MAX)
        {
            return Err(RegistrationError::DisplayNameTooLong);
        }

        let username = non_empty(&self.username);
        if username
            .as_ref()
            .is_some_and(|name| name.chars().count() < USERNAME_MIN)
        {
            return Err(RegistrationError::UsernameTooShort);
        }
        if username
            .as_ref()
            .is_some_and(|name| name.chars().count() > USERNAME_MAX)
        {
            return Err(RegistrationError::UsernameTooLong);
        }

        let email = non_empty(&self.email);
        if email.as_ref().is_some_and(|email| !email.validate_email()) {
            return Err(RegistrationError::InvalidEmail);
        }
        if email.is_none() && username.is_none() {
            return Err(RegistrationError::MissingIdentity);
        }

        if self.password.chars().count() < PASSWORD_MIN {
            return Err(RegistrationError::PasswordTooShort);
        }
        if self.password != self.confirm_password {
            return Err(RegistrationError::PasswordMismatch);
        }

        Ok(RegisterRequest {
            display_name,
            email,
            username,
            password: self.password.clone(),
        })
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

//
// ─── LOGIN ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoginError {
    #[error("enter an email or a username")]
    MissingIdentifier,
    #[error("password must be at least {PASSWORD_MIN} characters")]
    PasswordTooShort,
}

/// Login form: a single identifier field that accepts an email or a username.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginDraft {
    pub identifier: String,
    pub password: String,
}

impl LoginDraft {
    #[must_use]
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }

    /// # Errors
    ///
    /// Returns `LoginError` when the identifier is blank or the password too short.
    pub fn validate(&self) -> Result<LoginRequest, LoginError> {
        let identifier = self.identifier.trim();
        if identifier.is_empty() {
            return Err(LoginError::MissingIdentifier);
        }
        if self.password.chars().count() < PASSWORD_MIN {
            return Err(LoginError::PasswordTooShort);
        }

        let (email, username) = if identifier.contains('@') {
            (Some(identifier.to_owned()), None)
        } else {
            (None, Some(identifier.to_owned()))
        };
        Ok(LoginRequest {
            email,
            username,
            password: self.password.clone(),
        })
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl LoginResponse {
    #[must_use]
    pub fn user(&self) -> User {
        User {
            id: self.user_id,
            email: self.email.clone(),
            username: self.username.clone(),
            created_at: None,
            updated_at: None,
            is_active: true,
        }
    }
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

//
// ─── PROFILE ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("display name must be at most {DISPLAY_NAME_MAX} characters")]
    DisplayNameTooLong,
    #[error("avatar URL is not a valid absolute URL")]
    InvalidAvatarUrl,
    #[error("avatar URL must be at most {AVATAR_URL_MAX} characters")]
    AvatarUrlTooLong,
    #[error("birth day must be a date in YYYY-MM-DD format")]
    InvalidBirthDay,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub birth_day: Option<String>,
    pub bio: Option<String>,
}

impl ProfileDraft {
    /// # Errors
    ///
    /// Returns `ProfileError` for the first failing field.
    pub fn validate(&self) -> Result<UpdateProfileRequest, ProfileError> {
        let display_name = non_empty(&self.display_name);
        if display_name
            .as_ref()
            .is_some_and(|name| name.chars().count() > DISPLAY_NAME_MAX)
        {
            return Err(ProfileError::DisplayNameTooLong);
        }

        let avatar_url = non_empty(&self.avatar_url);
        if let Some(raw) = &avatar_url {
            if raw.chars().count() > AVATAR_URL_MAX {
                return Err(ProfileError::AvatarUrlTooLong);
            }
            Url::parse(raw).map_err(|_| ProfileError::InvalidAvatarUrl)?;
        }

        let birth_day = non_empty(&self.birth_day);
        if let Some(raw) = &birth_day {
            if !is_iso_date(raw) {
                return Err(ProfileError::InvalidBirthDay);
            }
        }

        Ok(UpdateProfileRequest {
            display_name,
            avatar_url,
            birth_day,
            bio: non_empty(&self.bio),
        })
    }
}

fn is_iso_date(raw: &str) -> bool {
    let shape_ok = raw.len() == 10
        && raw.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    shape_ok && NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
