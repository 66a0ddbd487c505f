use std::sync::Arc;

use exam_core::Clock;
use storage::Storage;

use crate::accounts::{LoginService, RegistrationService};
use crate::attempts::AttemptService;
use crate::backend::{BackendApi, BackendClient};
use crate::config::AppConfig;
use crate::error::AppServicesError;
use crate::group_service::GroupService;
use crate::identity::{FirebaseIdentity, IdentityProvider};

/// Assembles app-facing services around one identity client.
#[derive(Clone)]
pub struct AppServices {
    identity: Arc<dyn IdentityProvider>,
    backend: Arc<dyn BackendApi>,
    login: Arc<LoginService>,
    registration: Arc<RegistrationService>,
    groups: Arc<GroupService>,
    attempts: Arc<AttemptService>,
}

impl AppServices {
    /// Build services from configuration: identity toolkit, HTTP backend, JSON bank.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the configuration is unusable.
    pub fn from_config(config: &AppConfig, clock: Clock) -> Result<Self, AppServicesError> {
        if config.attempt.duration_seconds == 0 {
            return Err(AppServicesError::Config(
                "attempt duration must be positive".into(),
            ));
        }
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(FirebaseIdentity::new(config.identity.clone()));
        if config.identity.is_none() {
            log::warn!("EXAM_AUTH_API_KEY not set; sign-in is disabled");
        }
        let backend: Arc<dyn BackendApi> =
            Arc::new(BackendClient::new(&config.api, Arc::clone(&identity)));
        let storage = Storage::json_file(config.attempt.bank_path.clone());

        Ok(Self::new(clock, identity, backend, &storage, config))
    }

    /// Build services from already constructed collaborators.
    #[must_use]
    pub fn new(
        clock: Clock,
        identity: Arc<dyn IdentityProvider>,
        backend: Arc<dyn BackendApi>,
        storage: &Storage,
        config: &AppConfig,
    ) -> Self {
        let login = Arc::new(LoginService::new(
            Arc::clone(&identity),
            Arc::clone(&backend),
        ));
        let registration = Arc::new(RegistrationService::new(
            Arc::clone(&identity),
            Arc::clone(&backend),
        ));
        let groups = Arc::new(GroupService::new(Arc::clone(&backend)));
        let attempts = Arc::new(AttemptService::from_config(
            clock,
            Arc::clone(&storage.banks),
            &config.attempt,
        ));

        Self {
            identity,
            backend,
            login,
            registration,
            groups,
            attempts,
        }
    }

    #[must_use]
    pub fn identity(&self) -> Arc<dyn IdentityProvider> {
        Arc::clone(&self.identity)
    }

    #[must_use]
    pub fn backend(&self) -> Arc<dyn BackendApi> {
        Arc::clone(&self.backend)
    }

    #[must_use]
    pub fn login(&self) -> Arc<LoginService> {
        Arc::clone(&self.login)
    }

    #[must_use]
    pub fn registration(&self) -> Arc<RegistrationService> {
        Arc::clone(&self.registration)
    }

    #[must_use]
    pub fn groups(&self) -> Arc<GroupService> {
        Arc::clone(&self.groups)
    }

    #[must_use]
    pub fn attempts(&self) -> Arc<AttemptService> {
        Arc::clone(&self.attempts)
    }
}
