use serde::{Deserialize, Serialize};

/// A capability token scoped to one workspace. At most one invite per
/// workspace is active at a time; creating a new one deactivates the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    pub id: String,
    pub workspace_id: String,
    pub token: String,
    pub created_by_id: String,
    pub is_active: bool,
    pub used_count: i64,
    pub created_at: i64,
}

/// Invite joined with workspace and creator names, for API responses.
#[derive(Debug, Clone)]
pub struct InviteWithContext {
    pub invite: Invite,
    pub workspace_name: Option<String>,
    pub creator_name: Option<String>,
}

impl InviteWithContext {
    pub fn into_details(self, frontend_base: &str) -> InviteDetails {
        let base = frontend_base.trim_end_matches('/');
        let invite_url = format!("{}/invite/{}", base, self.invite.token);
        InviteDetails {
            token: self.invite.token,
            workspace_id: self.invite.workspace_id,
            workspace_name: self.workspace_name,
            creator_name: self.creator_name,
            created_at: self.invite.created_at,
            is_active: self.invite.is_active,
            used_count: self.invite.used_count,
            invite_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InviteDetails {
    pub token: String,
    pub workspace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
    pub created_at: i64,
    pub is_active: bool,
    pub used_count: i64,
    pub invite_url: String,
}

/// Outcome of an invite acceptance or a direct add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
    Joined { workspace_id: String },
    AlreadyMember { workspace_id: String },
}

impl AcceptOutcome {
    pub fn workspace_id(&self) -> &str {
        match self {
            AcceptOutcome::Joined { workspace_id } => workspace_id,
            AcceptOutcome::AlreadyMember { workspace_id } => workspace_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InviteAcceptResponse {
    pub status: String,
    pub message: String,
    pub workspace_id: String,
}

/// Direct-add request: a manager adds a specific user without a token.
#[derive(Debug, Deserialize)]
pub struct DirectAddRequest {
    pub workspace_id: String,
    pub user_id: String,
}
