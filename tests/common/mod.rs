//! Shared helpers for integration tests: a tempfile-backed pool and seed
//! functions for users, workspaces, and the containment hierarchy.

#![allow(dead_code)]

use rusqlite::Connection;
use tempfile::TempDir;

use taskdeck::db::{self, DbPool, queries};
use taskdeck::models::*;
use taskdeck::util::hash_token;

pub const MANAGER_ROLES: [WorkspaceRole; 2] = [WorkspaceRole::Owner, WorkspaceRole::Admin];

/// A pooled test database. The temp dir must outlive the pool, so it rides
/// along in the struct.
pub struct TestDb {
    pub pool: DbPool,
    _dir: TempDir,
}

impl TestDb {
    pub fn conn(&self) -> r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager> {
        self.pool.get().unwrap()
    }
}

pub fn test_db() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskdeck-test.db");
    let pool = db::open_pool(path.to_str().unwrap()).unwrap();
    {
        let conn = pool.get().unwrap();
        db::init_db(&conn).unwrap();
    }
    TestDb { pool, _dir: dir }
}

/// Create a user whose bearer token is "td_{name}".
pub fn create_test_user(conn: &Connection, name: &str) -> User {
    let email = format!("{name}@example.com");
    queries::create_user(conn, &email, name, &hash_token(&format!("td_{name}"))).unwrap()
}

pub fn token_for(name: &str) -> String {
    format!("td_{name}")
}

pub fn create_test_workspace(conn: &Connection, name: &str, owner: &User) -> Workspace {
    let workspace = queries::create_workspace(
        conn,
        &CreateWorkspace {
            name: name.to_string(),
            description: None,
        },
    )
    .unwrap();
    queries::insert_membership(conn, &owner.id, &workspace.id, WorkspaceRole::Owner, true, true)
        .unwrap();
    workspace
}

pub fn add_member(
    conn: &Connection,
    workspace: &Workspace,
    user: &User,
    role: WorkspaceRole,
) -> Membership {
    queries::insert_membership(conn, &user.id, &workspace.id, role, false, false).unwrap()
}

pub fn create_test_project(conn: &Connection, workspace: &Workspace, title: &str) -> Project {
    queries::create_project(
        conn,
        &workspace.id,
        &CreateProject {
            title: title.to_string(),
        },
    )
    .unwrap()
}

pub fn grant_view(conn: &Connection, user: &User, project: &Project) {
    queries::upsert_project_access(conn, &user.id, &project.id, true, false).unwrap();
}

/// Build board → column → task under a project, authored by `creator`.
pub fn create_task_tree(
    conn: &Connection,
    project: &Project,
    creator: &User,
) -> (Board, BoardColumn, Task) {
    let board = queries::create_board(
        conn,
        &project.id,
        &CreateBoard {
            title: "Board".to_string(),
        },
    )
    .unwrap();
    let column = queries::create_column(
        conn,
        &board.id,
        &CreateColumn {
            title: "Todo".to_string(),
            position: 0,
        },
    )
    .unwrap();
    let task = queries::create_task(
        conn,
        &column.id,
        &CreateTask {
            title: "Task".to_string(),
            description: None,
        },
        &creator.id,
    )
    .unwrap();
    (board, column, task)
}
