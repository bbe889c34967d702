//! Row-mapping helpers: column lists and `FromRow` implementations for every
//! queryable shape, plus the `query_one`/`query_all` wrappers used throughout
//! `queries.rs`.

use rusqlite::types::Type;
use rusqlite::{Connection, Params, Row};

use crate::error::Result;
use crate::models::*;

pub const USER_COLS: &str = "id, email, name, token_hash, created_at";
pub const WORKSPACE_COLS: &str = "id, name, description, created_at";
pub const WORKSPACE_SUMMARY_COLS: &str = "w.id, w.name, w.description, m.role, w.created_at";
pub const MEMBERSHIP_COLS: &str =
    "id, user_id, workspace_id, role, can_create_projects, can_invite_users, created_at";
pub const MEMBER_WITH_USER_COLS: &str = "m.id, m.user_id, m.workspace_id, m.role, \
     m.can_create_projects, m.can_invite_users, m.created_at, u.email, u.name";
pub const PROJECT_COLS: &str = "id, workspace_id, title, created_at";
pub const PROJECT_ACCESS_COLS: &str = "id, user_id, project_id, can_view, can_edit, created_at";
pub const BOARD_COLS: &str = "id, project_id, title, created_at";
pub const COLUMN_COLS: &str = "id, board_id, title, position, created_at";
pub const TASK_COLS: &str = "id, column_id, title, description, created_by, created_at";
pub const COMMENT_COLS: &str = "id, task_id, user_id, content, created_at";
pub const INVITE_COLS: &str =
    "id, workspace_id, token, created_by_id, is_active, used_count, created_at";
pub const INVITE_WITH_CONTEXT_COLS: &str = "i.id, i.workspace_id, i.token, i.created_by_id, \
     i.is_active, i.used_count, i.created_at, w.name, u.name";

pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Parse a TEXT role column into the enum, surfacing bad data as a
/// conversion failure instead of a panic.
fn get_role(row: &Row<'_>, idx: usize) -> rusqlite::Result<WorkspaceRole> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown workspace role: {raw}").into(),
        )
    })
}

impl FromRow for User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            token_hash: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for Workspace {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Workspace {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for WorkspaceSummary {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(WorkspaceSummary {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            role: get_role(row, 3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for Membership {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Membership {
            id: row.get(0)?,
            user_id: row.get(1)?,
            workspace_id: row.get(2)?,
            role: get_role(row, 3)?,
            can_create_projects: row.get(4)?,
            can_invite_users: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl FromRow for MemberWithUser {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(MemberWithUser {
            id: row.get(0)?,
            user_id: row.get(1)?,
            workspace_id: row.get(2)?,
            role: get_role(row, 3)?,
            can_create_projects: row.get(4)?,
            can_invite_users: row.get(5)?,
            joined_at: row.get(6)?,
            email: row.get(7)?,
            name: row.get(8)?,
        })
    }
}

impl FromRow for Project {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Project {
            id: row.get(0)?,
            workspace_id: row.get(1)?,
            title: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for ProjectAccess {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ProjectAccess {
            id: row.get(0)?,
            user_id: row.get(1)?,
            project_id: row.get(2)?,
            can_view: row.get(3)?,
            can_edit: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for Board {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Board {
            id: row.get(0)?,
            project_id: row.get(1)?,
            title: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for BoardColumn {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(BoardColumn {
            id: row.get(0)?,
            board_id: row.get(1)?,
            title: row.get(2)?,
            position: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for Task {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Task {
            id: row.get(0)?,
            column_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            created_by: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for Comment {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Comment {
            id: row.get(0)?,
            task_id: row.get(1)?,
            user_id: row.get(2)?,
            content: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for Invite {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Invite {
            id: row.get(0)?,
            workspace_id: row.get(1)?,
            token: row.get(2)?,
            created_by_id: row.get(3)?,
            is_active: row.get(4)?,
            used_count: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl FromRow for InviteWithContext {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(InviteWithContext {
            invite: Invite::from_row(row)?,
            workspace_name: row.get(7)?,
            creator_name: row.get(8)?,
        })
    }
}

pub fn query_one<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query_map(params, |row| T::from_row(row))?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

pub fn query_all<T: FromRow, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| T::from_row(row))?;
    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}
