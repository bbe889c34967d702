//! Membership Store: resolution of a user's standing in a workspace, the
//! manager predicate, and the member-management operations (role changes,
//! flag changes, removal, accessible-project replacement).
//!
//! Handlers gate manager-only operations with [`can_manage_members`]; the
//! functions here enforce the state-transition rules that hold regardless of
//! who the actor is (owner rows are immutable, nobody removes themself).

use rusqlite::Connection;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::models::{MemberWithUser, Membership, WorkspaceRole};

pub fn get_membership(
    conn: &Connection,
    user_id: &str,
    workspace_id: &str,
) -> Result<Option<Membership>> {
    queries::get_membership(conn, user_id, workspace_id)
}

/// Resolve the membership an operation runs under. With no explicit
/// workspace the user's first membership by creation order is used; a user
/// with no membership at all (or none in the requested workspace) is
/// Forbidden.
pub fn resolve_membership(
    conn: &Connection,
    user_id: &str,
    workspace_id: Option<&str>,
) -> Result<Membership> {
    let membership = match workspace_id {
        Some(ws) => queries::get_membership(conn, user_id, ws)?,
        None => queries::first_membership_for_user(conn, user_id)?,
    };
    membership.ok_or_else(|| AppError::Forbidden("Workspace is not accessible".into()))
}

/// True when the membership carries member-management rights: a manager
/// role, an explicit invite grant, or the sole-member bootstrap (the only
/// member of a workspace may manage it before anyone else joins).
pub fn can_manage_members(
    conn: &Connection,
    membership: &Membership,
    manager_roles: &[WorkspaceRole],
) -> Result<bool> {
    if manager_roles.contains(&membership.role) || membership.can_invite_users {
        return Ok(true);
    }
    Ok(queries::count_members(conn, &membership.workspace_id)? <= 1)
}

pub fn list_members(conn: &Connection, workspace_id: &str) -> Result<Vec<MemberWithUser>> {
    queries::list_members_with_user(conn, workspace_id)
}

fn target_membership(
    conn: &Connection,
    workspace_id: &str,
    target_user_id: &str,
) -> Result<Membership> {
    queries::get_membership(conn, target_user_id, workspace_id)?
        .ok_or_else(|| AppError::NotFound("User is not a member of this workspace".into()))
}

/// Change a member's role. Owner rows are immutable and ownership is not
/// transferable here, so both demoting an owner and promoting to owner are
/// conflicts.
pub fn update_member_role(
    conn: &Connection,
    workspace_id: &str,
    target_user_id: &str,
    new_role: WorkspaceRole,
) -> Result<Membership> {
    let target = target_membership(conn, workspace_id, target_user_id)?;

    if target.role == WorkspaceRole::Owner {
        return Err(AppError::Conflict(
            "The workspace owner's role cannot be changed".into(),
        ));
    }
    if new_role == WorkspaceRole::Owner {
        return Err(AppError::Conflict(
            "Ownership cannot be granted through member management".into(),
        ));
    }

    queries::update_membership_role(conn, &target.id, new_role)?;
    Ok(Membership {
        role: new_role,
        ..target
    })
}

pub fn update_member_flags(
    conn: &Connection,
    workspace_id: &str,
    target_user_id: &str,
    can_create_projects: Option<bool>,
    can_invite_users: Option<bool>,
) -> Result<Membership> {
    let target = target_membership(conn, workspace_id, target_user_id)?;
    queries::update_membership_flags(conn, &target.id, can_create_projects, can_invite_users)?;
    Ok(Membership {
        can_create_projects: can_create_projects.unwrap_or(target.can_create_projects),
        can_invite_users: can_invite_users.unwrap_or(target.can_invite_users),
        ..target
    })
}

/// Remove a member. Self-removal and owner removal are illegal transitions
/// and reported as Conflict regardless of the actor's standing; the manager
/// gate applies after those checks.
pub fn remove_member(
    conn: &Connection,
    actor: &Membership,
    target_user_id: &str,
    manager_roles: &[WorkspaceRole],
) -> Result<()> {
    if target_user_id == actor.user_id {
        return Err(AppError::Conflict("You cannot remove yourself".into()));
    }

    let target = target_membership(conn, &actor.workspace_id, target_user_id)?;
    if target.role == WorkspaceRole::Owner {
        return Err(AppError::Conflict(
            "The workspace owner cannot be removed".into(),
        ));
    }

    if !can_manage_members(conn, actor, manager_roles)? {
        return Err(AppError::Forbidden(
            "Not enough rights to remove members".into(),
        ));
    }

    queries::delete_membership(conn, &target.id)?;
    Ok(())
}

/// Replace a member's accessible-project set with `project_ids`: grants not
/// in the set are deleted, missing ones are inserted with view-only access,
/// and the intersection is left untouched. Ids outside the workspace are
/// ignored. Owners bypass the overlay, so an owner target is a no-op.
pub fn replace_project_accesses(
    conn: &Connection,
    workspace_id: &str,
    target_user_id: &str,
    project_ids: &[String],
) -> Result<()> {
    let target = target_membership(conn, workspace_id, target_user_id)?;
    if target.role.has_implicit_project_access() {
        return Ok(());
    }

    let workspace_projects: Vec<String> = queries::list_projects_for_workspace(conn, workspace_id)?
        .into_iter()
        .map(|p| p.id)
        .collect();
    let wanted: Vec<&String> = project_ids
        .iter()
        .filter(|id| workspace_projects.contains(*id))
        .collect();

    let current = queries::list_access_project_ids(conn, target_user_id, workspace_id)?;

    for project_id in &current {
        if !wanted.iter().any(|id| *id == project_id) {
            queries::delete_project_access(conn, target_user_id, project_id)?;
        }
    }
    for project_id in wanted {
        if !current.contains(project_id) {
            queries::upsert_project_access(conn, target_user_id, project_id, true, false)?;
        }
    }
    Ok(())
}
