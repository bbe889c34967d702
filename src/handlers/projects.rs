use axum::extract::{Extension, State};
use serde_json::json;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::memberships;
use crate::middleware::UserContext;
use crate::models::{CreateProject, GrantProjectAccess, Project, ProjectAccess};
use crate::permissions;

use super::workspaces::WorkspaceQuery;

pub async fn create_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Query(query): Query<WorkspaceQuery>,
    Json(input): Json<CreateProject>,
) -> Result<Json<Project>> {
    let mut conn = state.db.get()?;
    let membership =
        memberships::resolve_membership(&conn, &ctx.user.id, query.workspace_id.as_deref())?;
    if !permissions::can_create_project(&conn, &ctx.user.id, &membership.workspace_id)? {
        return Err(AppError::Forbidden(
            "Not enough rights to create projects".into(),
        ));
    }

    // Non-owner creators get a view grant in the same transaction; without
    // one the overlay would hide their own project from them.
    let tx = conn.transaction()?;
    let project = queries::create_project(&tx, &membership.workspace_id, &input)?;
    if !membership.role.has_implicit_project_access() {
        queries::upsert_project_access(&tx, &ctx.user.id, &project.id, true, false)?;
    }
    tx.commit()?;

    Ok(Json(project))
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Query(query): Query<WorkspaceQuery>,
) -> Result<Json<Vec<Project>>> {
    let conn = state.db.get()?;
    let membership =
        memberships::resolve_membership(&conn, &ctx.user.id, query.workspace_id.as_deref())?;
    let projects = permissions::accessible_projects(&conn, &ctx.user.id, &membership.workspace_id)?;
    Ok(Json(projects))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(project_id): Path<String>,
) -> Result<Json<Project>> {
    let conn = state.db.get()?;

    let project = queries::get_project_by_id(&conn, &project_id)?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))?;
    if !permissions::can_view_project(&conn, &ctx.user.id, &project_id)? {
        return Err(AppError::Forbidden("No access to this project".into()));
    }

    Ok(Json(project))
}

/// Grant or adjust one member's access to one project. Manager-gated;
/// granting to the owner is a no-op (owners bypass the overlay).
pub async fn grant_project_access(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(project_id): Path<String>,
    Json(input): Json<GrantProjectAccess>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;

    let project = queries::get_project_by_id(&conn, &project_id)?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))?;

    let manages = match memberships::get_membership(&conn, &ctx.user.id, &project.workspace_id)? {
        Some(membership) => {
            memberships::can_manage_members(&conn, &membership, &state.manager_roles)?
        }
        None => false,
    };
    if !manages {
        return Err(AppError::Forbidden(
            "Not enough rights to grant project access".into(),
        ));
    }

    let target = memberships::get_membership(&conn, &input.user_id, &project.workspace_id)?
        .ok_or_else(|| AppError::NotFound("User is not a member of this workspace".into()))?;

    let access: Option<ProjectAccess> = if target.role.has_implicit_project_access() {
        None
    } else {
        Some(queries::upsert_project_access(
            &conn,
            &input.user_id,
            &project_id,
            input.can_view,
            input.can_edit,
        )?)
    };

    Ok(Json(json!({
        "status": "granted",
        "user_id": input.user_id,
        "project_id": project_id,
        "access": access,
    })))
}
