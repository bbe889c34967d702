use axum::extract::{Extension, State};
use serde_json::json;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::invites;
use crate::memberships;
use crate::middleware::UserContext;
use crate::models::{AcceptOutcome, DirectAddRequest, InviteAcceptResponse, InviteDetails};

use super::workspaces::WorkspaceQuery;

pub async fn create_invite(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Query(query): Query<WorkspaceQuery>,
) -> Result<Json<InviteDetails>> {
    let mut conn = state.db.get()?;
    let membership =
        memberships::resolve_membership(&conn, &ctx.user.id, query.workspace_id.as_deref())?;
    if !memberships::can_manage_members(&conn, &membership, &state.manager_roles)? {
        return Err(AppError::Forbidden(
            "Not enough rights to generate invites".into(),
        ));
    }

    let invite = invites::create_invite(&mut conn, &membership.workspace_id, &ctx.user.id)?;
    let details = invites::get_invite(&conn, &invite.token)?;
    Ok(Json(details.into_details(&state.frontend_url)))
}

/// Public lookup so the join page can show what the link is for.
pub async fn get_invite_details(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<InviteDetails>> {
    let conn = state.db.get()?;
    let invite = invites::get_invite(&conn, &token)?;
    Ok(Json(invite.into_details(&state.frontend_url)))
}

pub async fn get_active_invite(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(workspace_id): Path<String>,
) -> Result<Json<InviteDetails>> {
    let conn = state.db.get()?;

    let manages = match memberships::get_membership(&conn, &ctx.user.id, &workspace_id)? {
        Some(membership) => {
            memberships::can_manage_members(&conn, &membership, &state.manager_roles)?
        }
        None => false,
    };
    if !manages {
        return Err(AppError::Forbidden(
            "No access to this workspace's invites".into(),
        ));
    }

    let invite = invites::active_invite_for_workspace(&conn, &workspace_id)?
        .ok_or_else(|| AppError::NotFound("No active invite for this workspace".into()))?;
    Ok(Json(invite.into_details(&state.frontend_url)))
}

pub async fn accept_invite(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(token): Path<String>,
) -> Result<Json<InviteAcceptResponse>> {
    let mut conn = state.db.get()?;
    let outcome = invites::accept_invite(&mut conn, &token, &ctx.user.id)?;

    let response = match &outcome {
        AcceptOutcome::Joined { workspace_id } => InviteAcceptResponse {
            status: "joined".into(),
            message: "You have joined the workspace".into(),
            workspace_id: workspace_id.clone(),
        },
        AcceptOutcome::AlreadyMember { workspace_id } => InviteAcceptResponse {
            status: "already_member".into(),
            message: "You are already a member of this workspace".into(),
            workspace_id: workspace_id.clone(),
        },
    };
    Ok(Json(response))
}

pub async fn deactivate_invite(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(token): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    invites::deactivate_invite(&conn, &token, &ctx.user.id, &state.manager_roles)?;
    Ok(Json(json!({ "status": "deactivated", "token": token })))
}

/// Direct add: a manager adds a known user without a token.
pub async fn send_invite(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<DirectAddRequest>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.db.get()?;

    let manages = match memberships::get_membership(&conn, &ctx.user.id, &input.workspace_id)? {
        Some(membership) => {
            memberships::can_manage_members(&conn, &membership, &state.manager_roles)?
        }
        None => false,
    };
    if !manages {
        return Err(AppError::Forbidden(
            "Not enough rights to add members to this workspace".into(),
        ));
    }

    if queries::get_user_by_id(&conn, &input.user_id)?.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }

    let outcome = invites::add_member_direct(&mut conn, &input.workspace_id, &input.user_id)?;
    let status = match outcome {
        AcceptOutcome::Joined { .. } => "added",
        AcceptOutcome::AlreadyMember { .. } => "already_member",
    };
    Ok(Json(json!({
        "status": status,
        "workspace_id": input.workspace_id,
    })))
}
