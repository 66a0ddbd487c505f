use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Minimum password length enforced by the identity provider.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(alias = "student", alias = "STUDENT")]
    Student,
    #[serde(alias = "teacher", alias = "TEACHER")]
    Teacher,
}

impl Role {
    /// Landing route after a successful login.
    #[must_use]
    pub fn home_route(self) -> &'static str {
        match self {
            Role::Student => "/studenthome",
            Role::Teacher => "/teacherhome",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => f.write_str("Student"),
            Role::Teacher => f.write_str("Teacher"),
        }
    }
}

/// Public profile returned by the backend for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublicInfo {
    pub name: String,
    pub nickname: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error("invalid email address")]
    InvalidEmail,

    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    #[error("passwords do not match")]
    PasswordMismatch,
}

fn require(field: &'static str, value: &str) -> Result<String, UserError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(UserError::EmptyField { field });
    }
    Ok(trimmed.to_string())
}

fn require_email(value: &str) -> Result<String, UserError> {
    let email = require("email", value)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(UserError::InvalidEmail),
    }
}

/// Body of `POST /api/auth/createuser`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub nickname: String,
    pub email: String,
    pub role: Role,
}

impl NewUser {
    /// Build a trimmed, validated profile.
    ///
    /// # Errors
    ///
    /// Returns `UserError` for blank fields or a malformed email.
    pub fn new(name: &str, nickname: &str, email: &str, role: Role) -> Result<Self, UserError> {
        Ok(Self {
            name: require("name", name)?,
            nickname: require("nickname", nickname)?,
            email: require_email(email)?,
            role,
        })
    }
}

/// Sign-up form as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub nickname: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

impl RegistrationForm {
    /// Validate and split into the profile and the password to register with.
    ///
    /// # Errors
    ///
    /// Returns `UserError` for the first failing field.
    pub fn validate(&self) -> Result<(NewUser, String), UserError> {
        let profile = NewUser::new(&self.name, &self.nickname, &self.email, self.role)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(UserError::PasswordTooShort);
        }
        if self.password != self.confirm_password {
            return Err(UserError::PasswordMismatch);
        }
        Ok((profile, self.password.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegistrationForm {
        RegistrationForm {
            name: " Aigerim S ".into(),
            email: "aigerim@example.com".into(),
            nickname: "aigerim_s".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            role: Role::Student,
        }
    }

    #[test]
    fn role_routes_to_lowercase_home() {
        assert_eq!(Role::Student.home_route(), "/studenthome");
        assert_eq!(Role::Teacher.home_route(), "/teacherhome");
    }

    #[test]
    fn role_accepts_backend_casing() {
        let role: Role = serde_json::from_str("\"teacher\"").unwrap();
        assert_eq!(role, Role::Teacher);
        let role: Role = serde_json::from_str("\"Student\"").unwrap();
        assert_eq!(role, Role::Student);
    }

    #[test]
    fn valid_form_trims_profile() {
        let (profile, password) = form().validate().unwrap();
        assert_eq!(profile.name, "Aigerim S");
        assert_eq!(password, "secret1");
    }

    #[test]
    fn mismatched_passwords_fail() {
        let mut f = form();
        f.confirm_password = "secret2".into();
        assert_eq!(f.validate().unwrap_err(), UserError::PasswordMismatch);
    }

    #[test]
    fn short_password_fails() {
        let mut f = form();
        f.password = "abc".into();
        f.confirm_password = "abc".into();
        assert_eq!(f.validate().unwrap_err(), UserError::PasswordTooShort);
    }

    #[test]
    fn blank_nickname_fails() {
        let err = NewUser::new("Dana", "  ", "dana@example.com", Role::Student).unwrap_err();
        assert_eq!(err, UserError::EmptyField { field: "nickname" });
    }

    #[test]
    fn email_needs_local_and_domain() {
        let err = NewUser::new("Dana", "dana_k", "dana@", Role::Student).unwrap_err();
        assert_eq!(err, UserError::InvalidEmail);
    }
}
