use axum::extract::{Extension, State};
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::memberships;
use crate::middleware::UserContext;
use crate::models::{CreateWorkspace, MemberWithUser, Workspace, WorkspaceRole, WorkspaceSummary};

/// Optional workspace scope shared by several member/invite endpoints.
/// Omitted, the caller's first workspace by join order is used.
#[derive(Debug, Deserialize)]
pub struct WorkspaceQuery {
    #[serde(default)]
    pub workspace_id: Option<String>,
}

pub async fn create_workspace(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<CreateWorkspace>,
) -> Result<Json<Workspace>> {
    let mut conn = state.db.get()?;

    let tx = conn.transaction()?;
    let workspace = queries::create_workspace(&tx, &input)?;
    queries::insert_membership(
        &tx,
        &ctx.user.id,
        &workspace.id,
        WorkspaceRole::Owner,
        true,
        true,
    )?;
    tx.commit()?;

    Ok(Json(workspace))
}

pub async fn list_workspaces(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<Vec<WorkspaceSummary>>> {
    let conn = state.db.get()?;
    let workspaces = queries::list_workspaces_for_user(&conn, &ctx.user.id)?;
    Ok(Json(workspaces))
}

/// Membership is required to see a workspace; outsiders get the same 404 a
/// missing workspace would give.
pub async fn get_workspace(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(workspace_id): Path<String>,
) -> Result<Json<Workspace>> {
    let conn = state.db.get()?;

    let workspace = queries::get_workspace_by_id(&conn, &workspace_id)?;
    let membership = queries::get_membership(&conn, &ctx.user.id, &workspace_id)?;
    match (workspace, membership) {
        (Some(workspace), Some(_)) => Ok(Json(workspace)),
        _ => Err(AppError::NotFound(
            "Workspace not found or not accessible".into(),
        )),
    }
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Query(query): Query<WorkspaceQuery>,
) -> Result<Json<Vec<MemberWithUser>>> {
    let conn = state.db.get()?;
    let membership =
        memberships::resolve_membership(&conn, &ctx.user.id, query.workspace_id.as_deref())?;
    let members = memberships::list_members(&conn, &membership.workspace_id)?;
    Ok(Json(members))
}
