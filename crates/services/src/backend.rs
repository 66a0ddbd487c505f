use std::sync::Arc;

use async_trait::async_trait;
use exam_core::model::{Group, Invitation, InvitationRequest, NewGroup, NewUser, UserPublicInfo};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::identity::IdentityProvider;

pub const GET_USER: &str = "/api/auth/getuser";
pub const CHECK_USER_EXISTENCE: &str = "/api/auth/checkuserexistence";
pub const CREATE_USER: &str = "/api/auth/createuser";
pub const GET_TEACHER_GROUPS: &str = "/api/group/getteachergroups";
pub const CREATE_GROUP: &str = "/api/group/creategroup";
pub const GET_INVITATIONS: &str = "/api/membership/getinvitations";
pub const SEND_INVITATION: &str = "/api/membership/sendinvitation";

/// Backend REST surface used by the app. Every call acts as the signed-in user.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn get_user(&self) -> Result<UserPublicInfo, ApiError>;
    async fn check_user_existence(&self) -> Result<bool, ApiError>;
    async fn create_user(&self, user: &NewUser) -> Result<(), ApiError>;
    async fn get_teacher_groups(&self) -> Result<Vec<Group>, ApiError>;
    async fn create_group(&self, group: &NewGroup) -> Result<Group, ApiError>;
    async fn get_invitations(&self) -> Result<Vec<Invitation>, ApiError>;
    async fn send_invitation(&self, invitation: &InvitationRequest) -> Result<(), ApiError>;
}

/// `reqwest` client for the backend, authenticating with the identity token.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    identity: Arc<dyn IdentityProvider>,
}

impl BackendClient {
    #[must_use]
    pub fn new(config: &ApiConfig, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            identity,
        }
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = self
            .identity
            .id_token()
            .await?
            .ok_or(ApiError::NotSignedIn)?;
        Ok(self
            .client
            .request(method, self.endpoint(path))
            .bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("backend {path} failed with {status}");
            return Err(ApiError::HttpStatus(status));
        }
        log::debug!("backend {path} -> {status}");
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.authorized(Method::GET, path).await?;
        Ok(self.send(request, path).await?.json().await?)
    }
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn get_user(&self) -> Result<UserPublicInfo, ApiError> {
        self.get_json(GET_USER).await
    }

    async fn check_user_existence(&self) -> Result<bool, ApiError> {
        self.get_json(CHECK_USER_EXISTENCE).await
    }

    async fn create_user(&self, user: &NewUser) -> Result<(), ApiError> {
        let request = self.authorized(Method::POST, CREATE_USER).await?.json(user);
        self.send(request, CREATE_USER).await?;
        Ok(())
    }

    async fn get_teacher_groups(&self) -> Result<Vec<Group>, ApiError> {
        self.get_json(GET_TEACHER_GROUPS).await
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group, ApiError> {
        let request = self.authorized(Method::POST, CREATE_GROUP).await?.json(group);
        Ok(self.send(request, CREATE_GROUP).await?.json().await?)
    }

    async fn get_invitations(&self) -> Result<Vec<Invitation>, ApiError> {
        self.get_json(GET_INVITATIONS).await
    }

    async fn send_invitation(&self, invitation: &InvitationRequest) -> Result<(), ApiError> {
        let request = self
            .authorized(Method::POST, SEND_INVITATION)
            .await?
            .json(invitation);
        self.send(request, SEND_INVITATION).await?;
        Ok(())
    }
}
