use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::config::IdentityConfig;
use crate::error::AuthError;

/// Signed-in account as seen by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub email_verified: bool,
}

/// Contract for the external identity provider.
///
/// Constructed once at start-up and passed to whatever needs it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, if any.
    fn current_user(&self) -> Option<AuthUser>;

    /// # Errors
    ///
    /// Returns `AuthError` if the provider rejects the credentials or is unreachable.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the provider rejects the registration.
    async fn register(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` without a session, or provider errors.
    async fn send_verification_email(&self) -> Result<(), AuthError>;

    /// Bearer credential of the signed-in user; `None` when signed out.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the provider cannot produce a token.
    async fn id_token(&self) -> Result<Option<String>, AuthError>;

    fn sign_out(&self);

    /// Auth-state change notifications.
    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>>;
}

#[derive(Debug, Clone)]
struct AuthSession {
    user: AuthUser,
    id_token: String,
}

/// Identity toolkit REST client.
pub struct FirebaseIdentity {
    client: Client,
    config: Option<IdentityConfig>,
    session: Mutex<Option<AuthSession>>,
    changes: watch::Sender<Option<AuthUser>>,
}

impl FirebaseIdentity {
    #[must_use]
    pub fn new(config: Option<IdentityConfig>) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            client: Client::new(),
            config,
            session: Mutex::new(None),
            changes,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    fn endpoint(config: &IdentityConfig, method: &str) -> String {
        format!(
            "{}/accounts:{method}?key={}",
            config.base_url.trim_end_matches('/'),
            config.api_key
        )
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R, AuthError>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let config = self.config.as_ref().ok_or(AuthError::Disabled)?;
        let response = self
            .client
            .post(Self::endpoint(config, method))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if let Ok(body) = response.json::<ErrorEnvelope>().await {
                log::warn!("identity {method} rejected: {}", body.error.message);
                return Err(AuthError::Rejected(body.error.message));
            }
            return Err(AuthError::HttpStatus(status));
        }
        Ok(response.json().await?)
    }

    async fn lookup(&self, id_token: &str) -> Result<AuthUser, AuthError> {
        let body: LookupResponse = self.call("lookup", &LookupRequest { id_token }).await?;
        let record = body
            .users
            .into_iter()
            .next()
            .ok_or(AuthError::EmptyResponse)?;
        Ok(AuthUser {
            uid: record.local_id,
            email: record.email.unwrap_or_default(),
            email_verified: record.email_verified,
        })
    }

    fn store(&self, session: Option<AuthSession>) {
        let user = session.as_ref().map(|s| s.user.clone());
        match self.session.lock() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
        self.changes.send_replace(user);
    }

    fn session(&self) -> Option<AuthSession> {
        match self.session.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    async fn password_flow(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError> {
        let token: TokenResponse = self
            .call(
                method,
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        let user = self.lookup(&token.id_token).await?;
        log::info!("identity {method} succeeded for {}", user.email);
        self.store(Some(AuthSession {
            user: user.clone(),
            id_token: token.id_token,
        }));
        Ok(user)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    fn current_user(&self) -> Option<AuthUser> {
        self.session().map(|s| s.user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        self.password_flow("signInWithPassword", email, password)
            .await
    }

    async fn register(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        self.password_flow("signUp", email, password).await
    }

    async fn send_verification_email(&self) -> Result<(), AuthError> {
        let session = self.session().ok_or(AuthError::NotSignedIn)?;
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &OobRequest {
                    request_type: "VERIFY_EMAIL",
                    id_token: &session.id_token,
                },
            )
            .await?;
        log::info!("verification email sent to {}", session.user.email);
        Ok(())
    }

    async fn id_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self.session().map(|s| s.id_token))
    }

    fn sign_out(&self) {
        self.store(None);
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.changes.subscribe()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OobRequest<'a> {
    request_type: &'static str,
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    local_id: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
