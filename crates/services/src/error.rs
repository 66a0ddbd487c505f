//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::AttemptError;
use storage::StorageError;

/// Errors emitted by the identity provider client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("identity provider is not configured")]
    Disabled,
    #[error("no user is signed in")]
    NotSignedIn,
    #[error("identity provider rejected the request: {0}")]
    Rejected(String),
    #[error("identity provider returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("identity provider returned no user record")]
    EmptyResponse,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `BackendClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("no user is signed in")]
    NotSignedIn,
    #[error("backend request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by login and registration flows.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] exam_core::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `GroupService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GroupServiceError {
    #[error(transparent)]
    Validation(#[from] exam_core::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by attempt services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttemptServiceError {
    #[error("choose at least one subject")]
    NoSubjects,
    #[error("attempt state is unavailable")]
    StatePoisoned,
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
