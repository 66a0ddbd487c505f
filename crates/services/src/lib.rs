#![forbid(unsafe_code)]

pub mod accounts;
pub mod app_services;
pub mod attempts;
pub mod backend;
pub mod config;
pub mod error;
pub mod group_service;
pub mod identity;

pub use exam_core::Clock;

pub use accounts::{LoginOutcome, LoginService, RegistrationService};
pub use app_services::AppServices;
pub use attempts::{AttemptResults, AttemptService, LiveAttempt};
pub use backend::{BackendApi, BackendClient};
pub use config::AppConfig;
pub use error::{
    AccountError, ApiError, AppServicesError, AttemptServiceError, AuthError, GroupServiceError,
};
pub use group_service::GroupService;
pub use identity::{AuthUser, FirebaseIdentity, IdentityProvider};
