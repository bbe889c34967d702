use serde::{Deserialize, Serialize};

/// Per-user, per-project view/edit override. Meaningful only for members
/// whose workspace role is not owner; owners bypass this table entirely.
/// At most one row per (user_id, project_id), enforced by the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectAccess {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub can_view: bool,
    pub can_edit: bool,
    pub created_at: i64,
}

/// Input for a single-project access grant.
#[derive(Debug, Deserialize)]
pub struct GrantProjectAccess {
    pub user_id: String,
    pub can_view: bool,
    #[serde(default)]
    pub can_edit: bool,
}
