//! Collaborator (folder sharing invitation) model

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{null_to_default, DocId};
use crate::error::{Error, Result};

/// A pending or accepted invitation to a shared folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub id: DocId,
    pub email: String,
    /// Invitation token
    #[serde(default, deserialize_with = "null_to_default")]
    pub token: String,
    /// Shared folder
    pub folder_id: DocId,
    /// Inviting user
    #[serde(default)]
    pub owner_id: Option<String>,
    /// Invitation timestamp (Unix ms)
    #[serde(default)]
    pub dt_invite: i64,
}

/// Caller-supplied fields for saving an invitation.
///
/// `folder_id` and `email` are required. A token is generated and `dt_invite`
/// defaults to the save time when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorDraft {
    id: Option<DocId>,
    email: String,
    token: Option<String>,
    folder_id: DocId,
    owner_id: Option<String>,
    dt_invite: Option<i64>,
}

impl CollaboratorDraft {
    pub fn new(folder_id: DocId, email: &str) -> Result<Self> {
        Ok(Self {
            id: None,
            email: normalize_email(email)?,
            token: None,
            folder_id,
            owner_id: None,
            dt_invite: None,
        })
    }

    #[must_use]
    pub fn with_id(mut self, id: Option<DocId>) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub fn owner(mut self, owner_id: Option<String>) -> Self {
        self.owner_id = owner_id;
        self
    }

    #[must_use]
    pub const fn invited_at(mut self, dt_invite: Option<i64>) -> Self {
        self.dt_invite = dt_invite;
        self
    }

    pub const fn id(&self) -> Option<&DocId> {
        self.id.as_ref()
    }

    pub(crate) fn body(&self, now: i64) -> Value {
        let token = self
            .token
            .clone()
            .unwrap_or_else(|| Uuid::now_v7().simple().to_string());
        json!({
            "email": self.email,
            "token": token,
            "folderId": self.folder_id,
            "ownerId": self.owner_id,
            "dtInvite": self.dt_invite.unwrap_or(now),
        })
    }
}

impl From<Collaborator> for CollaboratorDraft {
    fn from(collaborator: Collaborator) -> Self {
        Self {
            id: Some(collaborator.id),
            email: collaborator.email,
            token: Some(collaborator.token),
            folder_id: collaborator.folder_id,
            owner_id: collaborator.owner_id,
            dt_invite: Some(collaborator.dt_invite),
        }
    }
}

/// Trim and lowercase an email address, rejecting obviously invalid input.
pub(crate) fn normalize_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(Error::InvalidInput(format!("invalid email address: {raw}"))),
    }
}
