use axum::extract::{Extension, State};
use serde_json::json;

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::memberships;
use crate::middleware::UserContext;
use crate::models::MemberUpdate;

use super::workspaces::WorkspaceQuery;

/// Apply a tagged member update: role change, permission flags, or a full
/// replacement of the member's accessible-project set.
pub async fn update_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(target_user_id): Path<String>,
    Query(query): Query<WorkspaceQuery>,
    Json(update): Json<MemberUpdate>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let membership =
        memberships::resolve_membership(&conn, &ctx.user.id, query.workspace_id.as_deref())?;
    if !memberships::can_manage_members(&conn, &membership, &state.manager_roles)? {
        return Err(AppError::Forbidden(
            "Not enough rights to manage members".into(),
        ));
    }

    let workspace_id = membership.workspace_id;
    match update {
        MemberUpdate::Role(role) => {
            let updated =
                memberships::update_member_role(&conn, &workspace_id, &target_user_id, role)?;
            Ok(Json(json!({
                "status": "updated",
                "user_id": target_user_id,
                "role": updated.role,
            })))
        }
        MemberUpdate::Flags {
            can_create_projects,
            can_invite_users,
        } => {
            let updated = memberships::update_member_flags(
                &conn,
                &workspace_id,
                &target_user_id,
                can_create_projects,
                can_invite_users,
            )?;
            Ok(Json(json!({
                "status": "updated",
                "user_id": target_user_id,
                "can_create_projects": updated.can_create_projects,
                "can_invite_users": updated.can_invite_users,
            })))
        }
        MemberUpdate::ProjectAccess(project_ids) => {
            memberships::replace_project_accesses(
                &conn,
                &workspace_id,
                &target_user_id,
                &project_ids,
            )?;
            Ok(Json(json!({
                "status": "updated",
                "user_id": target_user_id,
            })))
        }
    }
}

pub async fn remove_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(target_user_id): Path<String>,
    Query(query): Query<WorkspaceQuery>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let membership =
        memberships::resolve_membership(&conn, &ctx.user.id, query.workspace_id.as_deref())?;

    memberships::remove_member(&conn, &membership, &target_user_id, &state.manager_roles)?;
    Ok(Json(json!({ "status": "removed", "user_id": target_user_id })))
}
