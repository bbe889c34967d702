pub mod from_row;
pub mod queries;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::config::Config;
use crate::error::Result;
use crate::models::WorkspaceRole;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub frontend_url: String,
    pub manager_roles: Vec<WorkspaceRole>,
}

impl AppState {
    pub fn new(db: DbPool, config: &Config) -> Self {
        Self {
            db,
            frontend_url: config.frontend_url.clone(),
            manager_roles: config.manager_roles.clone(),
        }
    }
}

/// Open a file-backed pool. Every connection enforces foreign keys and waits
/// out writer contention instead of failing fast; correctness under
/// concurrency rests on the schema constraints, not in-process locks.
pub fn open_pool(path: &str) -> std::result::Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        // journal_mode returns a row, so it cannot go through execute_batch
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
        Ok(())
    });
    Pool::builder().build(manager)
}

/// Create the schema. The constraints here carry the core invariants:
/// one membership per (user, workspace), one access row per (user, project),
/// globally unique invite tokens, and at most one active invite per
/// workspace (partial unique index).
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            name        TEXT NOT NULL,
            token_hash  TEXT NOT NULL UNIQUE,
            created_at  INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS workspaces (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            description TEXT,
            created_at  INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS memberships (
            id                  TEXT PRIMARY KEY,
            user_id             TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            workspace_id        TEXT NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
            role                TEXT NOT NULL,
            can_create_projects INTEGER NOT NULL DEFAULT 0,
            can_invite_users    INTEGER NOT NULL DEFAULT 0,
            created_at          INTEGER NOT NULL,
            UNIQUE (user_id, workspace_id)
        );

        CREATE TABLE IF NOT EXISTS projects (
            id           TEXT PRIMARY KEY,
            workspace_id TEXT NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
            title        TEXT NOT NULL,
            created_at   INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS project_accesses (
            id         TEXT PRIMARY KEY,
            user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            can_view   INTEGER NOT NULL DEFAULT 0,
            can_edit   INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            UNIQUE (user_id, project_id)
        );

        CREATE TABLE IF NOT EXISTS boards (
            id         TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            title      TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS board_columns (
            id         TEXT PRIMARY KEY,
            board_id   TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
            title      TEXT NOT NULL,
            position   INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id          TEXT PRIMARY KEY,
            column_id   TEXT NOT NULL REFERENCES board_columns(id) ON DELETE CASCADE,
            title       TEXT NOT NULL,
            description TEXT,
            created_by  TEXT NOT NULL REFERENCES users(id),
            created_at  INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS comments (
            id         TEXT PRIMARY KEY,
            task_id    TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content    TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS workspace_invites (
            id            TEXT PRIMARY KEY,
            workspace_id  TEXT NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
            token         TEXT NOT NULL UNIQUE,
            created_by_id TEXT NOT NULL REFERENCES users(id),
            is_active     INTEGER NOT NULL DEFAULT 1,
            used_count    INTEGER NOT NULL DEFAULT 0,
            created_at    INTEGER NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_one_active_invite_per_workspace
            ON workspace_invites(workspace_id) WHERE is_active = 1;

        CREATE INDEX IF NOT EXISTS idx_memberships_workspace
            ON memberships(workspace_id);
        CREATE INDEX IF NOT EXISTS idx_project_accesses_project
            ON project_accesses(project_id);
        ",
    )?;
    Ok(())
}
