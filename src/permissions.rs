//! Permission Evaluator: pure per-action decision functions combining the
//! membership store, the project-access overlay, and the resource hierarchy.
//!
//! Every function fails closed: a missing workspace, project, membership, or
//! ancestor link yields `Ok(false)`, never an error. Callers translate a
//! `false` into Forbidden; distinguishing "does not exist" happens at the
//! resolver layer, before the evaluator is consulted.
//!
//! Capability is deliberately not a role hierarchy. View access for
//! non-owners is delegated entirely to the overlay, so a participant with no
//! `can_view` grant sees nothing; comment rights come from an explicit
//! three-role list rather than any ordering of tiers.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::hierarchy;
use crate::models::{Project, ProjectRef, ResourceKind, WorkspaceRole};

/// Owner of the project's workspace, or a `can_view` grant on the project.
pub fn can_view_project(conn: &Connection, user_id: &str, project_id: &str) -> Result<bool> {
    let Some(project) = queries::get_project_by_id(conn, project_id)? else {
        return Ok(false);
    };
    let Some(membership) = queries::get_membership(conn, user_id, &project.workspace_id)? else {
        return Ok(false);
    };

    if membership.role.has_implicit_project_access() {
        return Ok(true);
    }

    let access = queries::get_project_access(conn, user_id, project_id)?;
    Ok(access.map(|a| a.can_view).unwrap_or(false))
}

/// Only the workspace owner edits a project; no override exists.
pub fn can_edit_project(conn: &Connection, user_id: &str, project_id: &str) -> Result<bool> {
    let Some(project) = queries::get_project_by_id(conn, project_id)? else {
        return Ok(false);
    };
    let Some(membership) = queries::get_membership(conn, user_id, &project.workspace_id)? else {
        return Ok(false);
    };
    Ok(membership.role == WorkspaceRole::Owner)
}

fn role_in_project(
    conn: &Connection,
    user_id: &str,
    project: &ProjectRef,
) -> Result<Option<WorkspaceRole>> {
    Ok(queries::get_membership(conn, user_id, &project.workspace_id)?.map(|m| m.role))
}

fn task_action_allowed(
    conn: &Connection,
    user_id: &str,
    kind: ResourceKind,
    resource_id: &str,
    allowed: fn(&WorkspaceRole) -> bool,
) -> Result<bool> {
    let Some(project) = hierarchy::resolve_project(conn, kind, resource_id)? else {
        return Ok(false);
    };
    if !can_view_project(conn, user_id, &project.project_id)? {
        return Ok(false);
    }
    let Some(role) = role_in_project(conn, user_id, &project)? else {
        return Ok(false);
    };
    Ok(allowed(&role))
}

/// Create a task in a column: view access plus an authoring role.
pub fn can_create_task(conn: &Connection, user_id: &str, column_id: &str) -> Result<bool> {
    task_action_allowed(
        conn,
        user_id,
        ResourceKind::Column,
        column_id,
        WorkspaceRole::can_author_tasks,
    )
}

pub fn can_edit_task(conn: &Connection, user_id: &str, task_id: &str) -> Result<bool> {
    task_action_allowed(
        conn,
        user_id,
        ResourceKind::Task,
        task_id,
        WorkspaceRole::can_author_tasks,
    )
}

pub fn can_delete_task(conn: &Connection, user_id: &str, task_id: &str) -> Result<bool> {
    can_edit_task(conn, user_id, task_id)
}

pub fn can_comment_task(conn: &Connection, user_id: &str, task_id: &str) -> Result<bool> {
    task_action_allowed(
        conn,
        user_id,
        ResourceKind::Task,
        task_id,
        WorkspaceRole::can_comment_tasks,
    )
}

/// Boards and columns are workspace structure: view and edit access must
/// both hold, which today means the owner.
pub fn can_create_board(conn: &Connection, user_id: &str, project_id: &str) -> Result<bool> {
    Ok(can_view_project(conn, user_id, project_id)?
        && can_edit_project(conn, user_id, project_id)?)
}

/// Owner, or a member holding the `can_create_projects` flag.
pub fn can_create_project(conn: &Connection, user_id: &str, workspace_id: &str) -> Result<bool> {
    let Some(membership) = queries::get_membership(conn, user_id, workspace_id)? else {
        return Ok(false);
    };
    Ok(membership.role == WorkspaceRole::Owner || membership.can_create_projects)
}

/// Projects the user can see in a workspace: all of them for the owner,
/// the `can_view`-granted subset for everyone else, nothing for outsiders.
pub fn accessible_projects(
    conn: &Connection,
    user_id: &str,
    workspace_id: &str,
) -> Result<Vec<Project>> {
    let Some(membership) = queries::get_membership(conn, user_id, workspace_id)? else {
        return Ok(Vec::new());
    };
    if membership.role.has_implicit_project_access() {
        return queries::list_projects_for_workspace(conn, workspace_id);
    }
    queries::list_viewable_projects_for_user(conn, workspace_id, user_id)
}
