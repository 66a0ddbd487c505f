use std::sync::Arc;

use exam_core::model::{Group, Invitation, InvitationRequest, JoinRequest, NewGroup};

use crate::backend::BackendApi;
use crate::error::GroupServiceError;

/// Group management for teachers and join requests for students.
#[derive(Clone)]
pub struct GroupService {
    backend: Arc<dyn BackendApi>,
}

impl GroupService {
    #[must_use]
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        Self { backend }
    }

    /// # Errors
    ///
    /// Returns `GroupServiceError::Api` on backend failures.
    pub async fn teacher_groups(&self) -> Result<Vec<Group>, GroupServiceError> {
        Ok(self.backend.get_teacher_groups().await?)
    }

    /// # Errors
    ///
    /// Returns `GroupServiceError::Validation` for a blank name, or backend errors.
    pub async fn create_group(&self, name: &str) -> Result<Group, GroupServiceError> {
        let draft = NewGroup::new(name).map_err(exam_core::Error::from)?;
        let group = self.backend.create_group(&draft).await?;
        log::info!("created group {} ({})", group.name, group.id);
        Ok(group)
    }

    /// # Errors
    ///
    /// Returns `GroupServiceError::Api` on backend failures.
    pub async fn invitations(&self) -> Result<Vec<Invitation>, GroupServiceError> {
        Ok(self.backend.get_invitations().await?)
    }

    /// # Errors
    ///
    /// Returns `GroupServiceError::Validation` for a blank nickname or group id.
    pub async fn send_invitation(
        &self,
        nickname: &str,
        group_id: &str,
    ) -> Result<(), GroupServiceError> {
        let request = InvitationRequest::new(nickname, group_id).map_err(exam_core::Error::from)?;
        self.backend.send_invitation(&request).await?;
        log::info!("invited {} to {}", request.nickname, request.group_id);
        Ok(())
    }

    /// Validate a student's join request; it stays pending until a teacher acts on it.
    ///
    /// # Errors
    ///
    /// Returns `GroupServiceError::Validation` for a blank group id.
    pub fn request_join(&self, group_id: &str) -> Result<JoinRequest, GroupServiceError> {
        let request = JoinRequest::pending(group_id).map_err(exam_core::Error::from)?;
        log::info!("join request for {}", request.group_id);
        Ok(request)
    }
}
