use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Workspace role. The canonical tiers are owner/participant/commenter/
/// reader; `admin` is accepted as a manage-rights alias (it belongs to the
/// default manager set but appears in no task or project allow-list).
///
/// Capability is action-specific, not a total order: a commenter can comment
/// but not edit, and a participant holds comment rights only because the
/// allow-list names them explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WorkspaceRole {
    Owner,
    Admin,
    Participant,
    Commenter,
    Reader,
}

impl WorkspaceRole {
    /// Owners see and edit every project in the workspace without a
    /// ProjectAccess row.
    pub fn has_implicit_project_access(&self) -> bool {
        matches!(self, WorkspaceRole::Owner)
    }

    /// Roles allowed to create/edit/delete tasks (view access still required).
    pub fn can_author_tasks(&self) -> bool {
        matches!(self, WorkspaceRole::Owner | WorkspaceRole::Participant)
    }

    /// Roles allowed to comment on tasks (view access still required).
    /// Explicit allow-list; participant does not inherit from commenter or
    /// vice versa.
    pub fn can_comment_tasks(&self) -> bool {
        matches!(
            self,
            WorkspaceRole::Owner | WorkspaceRole::Participant | WorkspaceRole::Commenter
        )
    }
}

/// A user's standing in one workspace. At most one row per
/// (user_id, workspace_id), enforced by the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub user_id: String,
    pub workspace_id: String,
    pub role: WorkspaceRole,
    pub can_create_projects: bool,
    pub can_invite_users: bool,
    pub created_at: i64,
}

/// Membership row joined with user details, for member listings.
#[derive(Debug, Clone, Serialize)]
pub struct MemberWithUser {
    pub id: String,
    pub user_id: String,
    pub workspace_id: String,
    pub role: WorkspaceRole,
    pub can_create_projects: bool,
    pub can_invite_users: bool,
    pub joined_at: i64,
    pub email: String,
    pub name: String,
}

/// Tagged member-update request. The role variant is validated against the
/// enum at deserialization time, before the store is touched.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MemberUpdate {
    Role(WorkspaceRole),
    Flags {
        #[serde(default)]
        can_create_projects: Option<bool>,
        #[serde(default)]
        can_invite_users: Option<bool>,
    },
    /// Full replacement of the member's accessible-project set.
    ProjectAccess(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_lowercase() {
        assert_eq!("owner".parse::<WorkspaceRole>().unwrap(), WorkspaceRole::Owner);
        assert_eq!(WorkspaceRole::Commenter.as_ref(), "commenter");
        assert!("manager".parse::<WorkspaceRole>().is_err());
    }

    #[test]
    fn capability_lists_are_not_hierarchical() {
        assert!(WorkspaceRole::Participant.can_author_tasks());
        assert!(!WorkspaceRole::Commenter.can_author_tasks());
        assert!(WorkspaceRole::Commenter.can_comment_tasks());
        assert!(WorkspaceRole::Participant.can_comment_tasks());
        assert!(!WorkspaceRole::Reader.can_comment_tasks());
        // admin is a manage alias, not a capability tier
        assert!(!WorkspaceRole::Admin.can_author_tasks());
        assert!(!WorkspaceRole::Admin.has_implicit_project_access());
    }

    #[test]
    fn member_update_deserializes_tagged_variants() {
        let update: MemberUpdate =
            serde_json::from_str(r#"{"kind": "role", "value": "commenter"}"#).unwrap();
        assert!(matches!(update, MemberUpdate::Role(WorkspaceRole::Commenter)));

        let update: MemberUpdate =
            serde_json::from_str(r#"{"kind": "project_access", "value": ["p1", "p2"]}"#).unwrap();
        assert!(matches!(update, MemberUpdate::ProjectAccess(ids) if ids.len() == 2));

        // unknown roles are rejected before they reach the store
        assert!(serde_json::from_str::<MemberUpdate>(r#"{"kind": "role", "value": "root"}"#).is_err());
    }
}
