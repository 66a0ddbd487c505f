use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::GroupId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GroupError {
    #[error("group name cannot be empty")]
    EmptyName,

    #[error("student nickname cannot be empty")]
    EmptyNickname,

    #[error("enter a group id")]
    EmptyGroupId,
}

/// A teacher's study group as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub students: u32,
}

/// Body of `POST /api/group/creategroup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    pub name: String,
}

impl NewGroup {
    /// # Errors
    ///
    /// Returns `GroupError::EmptyName` if the trimmed name is empty.
    pub fn new(name: &str) -> Result<Self, GroupError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GroupError::EmptyName);
        }
        Ok(Self {
            name: name.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvitationStatus {
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "accepted")]
    Accepted,
    #[serde(alias = "declined", alias = "Rejected", alias = "rejected")]
    Declined,
}

/// A pending or resolved invitation of a student into a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub nickname: String,
    pub group_id: GroupId,
    #[serde(default)]
    pub group_name: Option<String>,
    pub status: InvitationStatus,
}

/// Body of `POST /api/membership/sendinvitation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationRequest {
    pub nickname: String,
    pub group_id: GroupId,
}

impl InvitationRequest {
    /// # Errors
    ///
    /// Returns `GroupError` when the nickname or group id is blank.
    pub fn new(nickname: &str, group_id: &str) -> Result<Self, GroupError> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(GroupError::EmptyNickname);
        }
        let group_id = GroupId::parse(group_id).map_err(|_| GroupError::EmptyGroupId)?;
        Ok(Self {
            nickname: nickname.to_string(),
            group_id,
        })
    }
}

/// A student's request to join a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub group_id: GroupId,
    pub status: InvitationStatus,
}

impl JoinRequest {
    /// # Errors
    ///
    /// Returns `GroupError::EmptyGroupId` if the id is blank.
    pub fn pending(group_id: &str) -> Result<Self, GroupError> {
        let group_id = GroupId::parse(group_id).map_err(|_| GroupError::EmptyGroupId)?;
        Ok(Self {
            group_id,
            status: InvitationStatus::Pending,
        })
    }
}
