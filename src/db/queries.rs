use chrono::Utc;
use rusqlite::{Connection, params, types::Value};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::*;

use super::from_row::{
    BOARD_COLS, COLUMN_COLS, COMMENT_COLS, INVITE_COLS, INVITE_WITH_CONTEXT_COLS,
    MEMBER_WITH_USER_COLS, MEMBERSHIP_COLS, PROJECT_ACCESS_COLS, PROJECT_COLS, TASK_COLS,
    USER_COLS, WORKSPACE_COLS, WORKSPACE_SUMMARY_COLS, query_all, query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
        }
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    fn execute(self, conn: &Connection) -> Result<bool> {
        if self.fields.is_empty() {
            return Ok(false);
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

// ============ Users ============

pub fn create_user(conn: &Connection, email: &str, name: &str, token_hash: &str) -> Result<User> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO users (id, email, name, token_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, email, name, token_hash, now],
    )?;

    Ok(User {
        id,
        email: email.to_string(),
        name: name.to_string(),
        token_hash: token_hash.to_string(),
        created_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        &[&email],
    )
}

pub fn get_user_by_token_hash(conn: &Connection, token_hash: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE token_hash = ?1", USER_COLS),
        &[&token_hash],
    )
}

// ============ Workspaces ============

pub fn create_workspace(conn: &Connection, input: &CreateWorkspace) -> Result<Workspace> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO workspaces (id, name, description, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![&id, &input.name, &input.description, now],
    )?;

    Ok(Workspace {
        id,
        name: input.name.clone(),
        description: input.description.clone(),
        created_at: now,
    })
}

pub fn get_workspace_by_id(conn: &Connection, id: &str) -> Result<Option<Workspace>> {
    query_one(
        conn,
        &format!("SELECT {} FROM workspaces WHERE id = ?1", WORKSPACE_COLS),
        &[&id],
    )
}

/// List all workspaces where a user holds a membership, with their role.
pub fn list_workspaces_for_user(conn: &Connection, user_id: &str) -> Result<Vec<WorkspaceSummary>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM workspaces w
             JOIN memberships m ON m.workspace_id = w.id
             WHERE m.user_id = ?1
             ORDER BY m.created_at, m.id",
            WORKSPACE_SUMMARY_COLS
        ),
        &[&user_id],
    )
}

// ============ Memberships ============

/// Insert a membership row. Fails on a duplicate (user, workspace) pair;
/// callers that need idempotence use `insert_membership_if_absent`.
pub fn insert_membership(
    conn: &Connection,
    user_id: &str,
    workspace_id: &str,
    role: WorkspaceRole,
    can_create_projects: bool,
    can_invite_users: bool,
) -> Result<Membership> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO memberships (id, user_id, workspace_id, role, can_create_projects, can_invite_users, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![&id, user_id, workspace_id, role.as_ref(), can_create_projects, can_invite_users, now],
    )?;

    Ok(Membership {
        id,
        user_id: user_id.to_string(),
        workspace_id: workspace_id.to_string(),
        role,
        can_create_projects,
        can_invite_users,
        created_at: now,
    })
}

/// Insert a membership unless one already exists for the pair. The unique
/// constraint on (user_id, workspace_id) resolves concurrent joins: the
/// loser sees zero affected rows and gets `None`.
pub fn insert_membership_if_absent(
    conn: &Connection,
    user_id: &str,
    workspace_id: &str,
    role: WorkspaceRole,
) -> Result<Option<Membership>> {
    let id = gen_id();
    let now = now();

    let affected = conn.execute(
        "INSERT INTO memberships (id, user_id, workspace_id, role, can_create_projects, can_invite_users, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, 0, ?5)
         ON CONFLICT (user_id, workspace_id) DO NOTHING",
        params![&id, user_id, workspace_id, role.as_ref(), now],
    )?;

    if affected == 0 {
        return Ok(None);
    }
    Ok(Some(Membership {
        id,
        user_id: user_id.to_string(),
        workspace_id: workspace_id.to_string(),
        role,
        can_create_projects: false,
        can_invite_users: false,
        created_at: now,
    }))
}

pub fn get_membership(
    conn: &Connection,
    user_id: &str,
    workspace_id: &str,
) -> Result<Option<Membership>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM memberships WHERE user_id = ?1 AND workspace_id = ?2",
            MEMBERSHIP_COLS
        ),
        params![user_id, workspace_id],
    )
}

/// The user's first membership by creation order. Deterministic tiebreak on
/// id so multi-workspace users always resolve to the same default.
pub fn first_membership_for_user(conn: &Connection, user_id: &str) -> Result<Option<Membership>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM memberships WHERE user_id = ?1
             ORDER BY created_at, id LIMIT 1",
            MEMBERSHIP_COLS
        ),
        &[&user_id],
    )
}

pub fn count_members(conn: &Connection, workspace_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM memberships WHERE workspace_id = ?1",
        params![workspace_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// List workspace members with user details, ordered by join time.
pub fn list_members_with_user(conn: &Connection, workspace_id: &str) -> Result<Vec<MemberWithUser>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM memberships m
             JOIN users u ON m.user_id = u.id
             WHERE m.workspace_id = ?1
             ORDER BY m.created_at, m.id",
            MEMBER_WITH_USER_COLS
        ),
        &[&workspace_id],
    )
}

pub fn update_membership_role(conn: &Connection, id: &str, role: WorkspaceRole) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE memberships SET role = ?1 WHERE id = ?2",
        params![role.as_ref(), id],
    )?;
    Ok(affected > 0)
}

pub fn update_membership_flags(
    conn: &Connection,
    id: &str,
    can_create_projects: Option<bool>,
    can_invite_users: Option<bool>,
) -> Result<bool> {
    UpdateBuilder::new("memberships", id)
        .set_opt("can_create_projects", can_create_projects)
        .set_opt("can_invite_users", can_invite_users)
        .execute(conn)
}

pub fn delete_membership(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM memberships WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

// ============ Projects ============

pub fn create_project(
    conn: &Connection,
    workspace_id: &str,
    input: &CreateProject,
) -> Result<Project> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO projects (id, workspace_id, title, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![&id, workspace_id, &input.title, now],
    )?;

    Ok(Project {
        id,
        workspace_id: workspace_id.to_string(),
        title: input.title.clone(),
        created_at: now,
    })
}

pub fn get_project_by_id(conn: &Connection, id: &str) -> Result<Option<Project>> {
    query_one(
        conn,
        &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLS),
        &[&id],
    )
}

pub fn list_projects_for_workspace(conn: &Connection, workspace_id: &str) -> Result<Vec<Project>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM projects WHERE workspace_id = ?1 ORDER BY created_at, id",
            PROJECT_COLS
        ),
        &[&workspace_id],
    )
}

/// Projects in a workspace the user holds a `can_view` grant for.
/// Owners never hit this path; they see every project.
pub fn list_viewable_projects_for_user(
    conn: &Connection,
    workspace_id: &str,
    user_id: &str,
) -> Result<Vec<Project>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM projects
             WHERE workspace_id = ?1
             AND id IN (SELECT project_id FROM project_accesses
                        WHERE user_id = ?2 AND can_view = 1)
             ORDER BY created_at, id",
            PROJECT_COLS
        ),
        params![workspace_id, user_id],
    )
}

// ============ Project Accesses ============

pub fn get_project_access(
    conn: &Connection,
    user_id: &str,
    project_id: &str,
) -> Result<Option<ProjectAccess>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM project_accesses WHERE user_id = ?1 AND project_id = ?2",
            PROJECT_ACCESS_COLS
        ),
        params![user_id, project_id],
    )
}

pub fn upsert_project_access(
    conn: &Connection,
    user_id: &str,
    project_id: &str,
    can_view: bool,
    can_edit: bool,
) -> Result<ProjectAccess> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO project_accesses (id, user_id, project_id, can_view, can_edit, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (user_id, project_id)
         DO UPDATE SET can_view = excluded.can_view, can_edit = excluded.can_edit",
        params![&id, user_id, project_id, can_view, can_edit, now],
    )?;

    // Re-read: on conflict the original row id and created_at survive.
    get_project_access(conn, user_id, project_id)?
        .ok_or_else(|| AppError::Internal("project access row vanished after upsert".into()))
}

pub fn delete_project_access(conn: &Connection, user_id: &str, project_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM project_accesses WHERE user_id = ?1 AND project_id = ?2",
        params![user_id, project_id],
    )?;
    Ok(deleted > 0)
}

/// Project ids within one workspace the user holds any access row for.
/// Used by the diff-based bulk replacement.
pub fn list_access_project_ids(
    conn: &Connection,
    user_id: &str,
    workspace_id: &str,
) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT a.project_id FROM project_accesses a
         JOIN projects p ON a.project_id = p.id
         WHERE a.user_id = ?1 AND p.workspace_id = ?2",
    )?;
    let rows = stmt.query_map(params![user_id, workspace_id], |row| row.get(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

// ============ Boards ============

pub fn create_board(conn: &Connection, project_id: &str, input: &CreateBoard) -> Result<Board> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO boards (id, project_id, title, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![&id, project_id, &input.title, now],
    )?;

    Ok(Board {
        id,
        project_id: project_id.to_string(),
        title: input.title.clone(),
        created_at: now,
    })
}

pub fn get_board_by_id(conn: &Connection, id: &str) -> Result<Option<Board>> {
    query_one(
        conn,
        &format!("SELECT {} FROM boards WHERE id = ?1", BOARD_COLS),
        &[&id],
    )
}

// ============ Columns ============

pub fn create_column(conn: &Connection, board_id: &str, input: &CreateColumn) -> Result<BoardColumn> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO board_columns (id, board_id, title, position, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, board_id, &input.title, input.position, now],
    )?;

    Ok(BoardColumn {
        id,
        board_id: board_id.to_string(),
        title: input.title.clone(),
        position: input.position,
        created_at: now,
    })
}

pub fn get_column_by_id(conn: &Connection, id: &str) -> Result<Option<BoardColumn>> {
    query_one(
        conn,
        &format!("SELECT {} FROM board_columns WHERE id = ?1", COLUMN_COLS),
        &[&id],
    )
}

// ============ Tasks ============

pub fn create_task(
    conn: &Connection,
    column_id: &str,
    input: &CreateTask,
    created_by: &str,
) -> Result<Task> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO tasks (id, column_id, title, description, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, column_id, &input.title, &input.description, created_by, now],
    )?;

    Ok(Task {
        id,
        column_id: column_id.to_string(),
        title: input.title.clone(),
        description: input.description.clone(),
        created_by: created_by.to_string(),
        created_at: now,
    })
}

pub fn get_task_by_id(conn: &Connection, id: &str) -> Result<Option<Task>> {
    query_one(
        conn,
        &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLS),
        &[&id],
    )
}

pub fn update_task(conn: &Connection, id: &str, input: &UpdateTask) -> Result<bool> {
    UpdateBuilder::new("tasks", id)
        .set_opt("title", input.title.clone())
        .set_opt("description", input.description.clone())
        .execute(conn)
}

pub fn delete_task(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

// ============ Comments ============

pub fn create_comment(
    conn: &Connection,
    task_id: &str,
    user_id: &str,
    input: &CreateComment,
) -> Result<Comment> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO comments (id, task_id, user_id, content, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, task_id, user_id, &input.content, now],
    )?;

    Ok(Comment {
        id,
        task_id: task_id.to_string(),
        user_id: user_id.to_string(),
        content: input.content.clone(),
        created_at: now,
    })
}

pub fn list_comments_for_task(conn: &Connection, task_id: &str) -> Result<Vec<Comment>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM comments WHERE task_id = ?1 ORDER BY created_at, id",
            COMMENT_COLS
        ),
        &[&task_id],
    )
}

// ============ Resource Ancestry ============

pub fn project_ref_for_project(conn: &Connection, id: &str) -> Result<Option<ProjectRef>> {
    project_ref_query(
        conn,
        "SELECT p.id, p.workspace_id FROM projects p WHERE p.id = ?1",
        id,
    )
}

pub fn project_ref_for_board(conn: &Connection, id: &str) -> Result<Option<ProjectRef>> {
    project_ref_query(
        conn,
        "SELECT p.id, p.workspace_id FROM boards b
         JOIN projects p ON b.project_id = p.id
         WHERE b.id = ?1",
        id,
    )
}

pub fn project_ref_for_column(conn: &Connection, id: &str) -> Result<Option<ProjectRef>> {
    project_ref_query(
        conn,
        "SELECT p.id, p.workspace_id FROM board_columns c
         JOIN boards b ON c.board_id = b.id
         JOIN projects p ON b.project_id = p.id
         WHERE c.id = ?1",
        id,
    )
}

pub fn project_ref_for_task(conn: &Connection, id: &str) -> Result<Option<ProjectRef>> {
    project_ref_query(
        conn,
        "SELECT p.id, p.workspace_id FROM tasks t
         JOIN board_columns c ON t.column_id = c.id
         JOIN boards b ON c.board_id = b.id
         JOIN projects p ON b.project_id = p.id
         WHERE t.id = ?1",
        id,
    )
}

fn project_ref_query(conn: &Connection, sql: &str, id: &str) -> Result<Option<ProjectRef>> {
    use rusqlite::OptionalExtension;
    let found = conn
        .query_row(sql, params![id], |row| {
            Ok(ProjectRef {
                project_id: row.get(0)?,
                workspace_id: row.get(1)?,
            })
        })
        .optional()?;
    Ok(found)
}

// ============ Invites ============

pub fn find_invite_by_token(conn: &Connection, token: &str) -> Result<Option<Invite>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM workspace_invites WHERE token = ?1",
            INVITE_COLS
        ),
        &[&token],
    )
}

pub fn find_invite_with_context_by_token(
    conn: &Connection,
    token: &str,
) -> Result<Option<InviteWithContext>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM workspace_invites i
             JOIN workspaces w ON i.workspace_id = w.id
             JOIN users u ON i.created_by_id = u.id
             WHERE i.token = ?1",
            INVITE_WITH_CONTEXT_COLS
        ),
        &[&token],
    )
}

pub fn active_invite_for_workspace(
    conn: &Connection,
    workspace_id: &str,
) -> Result<Option<InviteWithContext>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM workspace_invites i
             JOIN workspaces w ON i.workspace_id = w.id
             JOIN users u ON i.created_by_id = u.id
             WHERE i.workspace_id = ?1 AND i.is_active = 1
             ORDER BY i.created_at DESC LIMIT 1",
            INVITE_WITH_CONTEXT_COLS
        ),
        &[&workspace_id],
    )
}

pub fn invite_token_exists(conn: &Connection, token: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM workspace_invites WHERE token = ?1",
        params![token],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn deactivate_invites_for_workspace(conn: &Connection, workspace_id: &str) -> Result<usize> {
    let affected = conn.execute(
        "UPDATE workspace_invites SET is_active = 0
         WHERE workspace_id = ?1 AND is_active = 1",
        params![workspace_id],
    )?;
    Ok(affected)
}

pub fn insert_invite(
    conn: &Connection,
    workspace_id: &str,
    token: &str,
    created_by_id: &str,
) -> Result<Invite> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO workspace_invites (id, workspace_id, token, created_by_id, is_active, used_count, created_at)
         VALUES (?1, ?2, ?3, ?4, 1, 0, ?5)",
        params![&id, workspace_id, token, created_by_id, now],
    )?;

    Ok(Invite {
        id,
        workspace_id: workspace_id.to_string(),
        token: token.to_string(),
        created_by_id: created_by_id.to_string(),
        is_active: true,
        used_count: 0,
        created_at: now,
    })
}

pub fn deactivate_invite(conn: &Connection, token: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE workspace_invites SET is_active = 0 WHERE token = ?1",
        params![token],
    )?;
    Ok(affected > 0)
}

pub fn increment_invite_usage(conn: &Connection, token: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE workspace_invites SET used_count = used_count + 1 WHERE token = ?1",
        params![token],
    )?;
    Ok(affected > 0)
}
