use std::sync::Arc;

use exam_core::model::{NewUser, RegistrationForm, UserPublicInfo};

use crate::backend::BackendApi;
use crate::error::AccountError;
use crate::identity::{AuthUser, IdentityProvider};

/// Where the app should go after a sign-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Known user: land on the role's home page.
    Home {
        user: UserPublicInfo,
        route: &'static str,
        email_verified: bool,
    },
    /// Verified e-mail but no backend profile yet: show the profile step.
    CompleteProfile { email: String },
    /// Unverified e-mail and no backend profile: ask the user to verify first.
    VerifyEmail { email: String },
}

/// Sign-in flow: identity provider first, then the backend profile.
#[derive(Clone)]
pub struct LoginService {
    identity: Arc<dyn IdentityProvider>,
    backend: Arc<dyn BackendApi>,
}

impl LoginService {
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>, backend: Arc<dyn BackendApi>) -> Self {
        Self { identity, backend }
    }

    /// # Errors
    ///
    /// Returns `AccountError` when sign-in or a backend call fails.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AccountError> {
        let user = self.identity.sign_in(email.trim(), password).await?;
        if !user.email_verified {
            log::warn!("{} signed in with an unverified email", user.email);
        }

        if self.backend.check_user_existence().await? {
            let profile = self.backend.get_user().await?;
            let route = profile.role.home_route();
            log::info!("{} signed in as {}", profile.nickname, profile.role);
            return Ok(LoginOutcome::Home {
                user: profile,
                route,
                email_verified: user.email_verified,
            });
        }

        if user.email_verified {
            Ok(LoginOutcome::CompleteProfile { email: user.email })
        } else {
            Ok(LoginOutcome::VerifyEmail { email: user.email })
        }
    }

    pub fn logout(&self) {
        self.identity.sign_out();
    }
}

/// Sign-up flow: create the account, send verification, then store the profile.
#[derive(Clone)]
pub struct RegistrationService {
    identity: Arc<dyn IdentityProvider>,
    backend: Arc<dyn BackendApi>,
}

impl RegistrationService {
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>, backend: Arc<dyn BackendApi>) -> Self {
        Self { identity, backend }
    }

    /// Validate the form, create the account and send the verification e-mail.
    ///
    /// Returns the validated profile to post once the e-mail is verified.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Validation` for bad input, or identity errors.
    pub async fn register(
        &self,
        form: &RegistrationForm,
    ) -> Result<(AuthUser, NewUser), AccountError> {
        let (profile, password) = form.validate().map_err(exam_core::Error::from)?;
        let user = self.identity.register(&profile.email, &password).await?;
        self.identity.send_verification_email().await?;
        log::info!("registered {} as {}", profile.nickname, profile.role);
        Ok((user, profile))
    }

    /// Post the profile to the backend and read it back.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Validation` for blank fields or a malformed
    /// email, or `AccountError::Api` on backend failures.
    pub async fn complete_profile(&self, profile: &NewUser) -> Result<UserPublicInfo, AccountError> {
        let profile = NewUser::new(&profile.name, &profile.nickname, &profile.email, profile.role)
            .map_err(exam_core::Error::from)?;
        self.backend.create_user(&profile).await?;
        Ok(self.backend.get_user().await?)
    }
}
