//! Resource Hierarchy Resolver: maps any task/column/board/project id to the
//! project and workspace that own it.
//!
//! Read-only. A broken ancestor link resolves to `None`, which callers must
//! treat as "resource does not exist" (404), never as an authorization
//! failure.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::{ProjectRef, ResourceKind};

pub fn resolve_project(
    conn: &Connection,
    kind: ResourceKind,
    resource_id: &str,
) -> Result<Option<ProjectRef>> {
    match kind {
        ResourceKind::Project => queries::project_ref_for_project(conn, resource_id),
        ResourceKind::Board => queries::project_ref_for_board(conn, resource_id),
        ResourceKind::Column => queries::project_ref_for_column(conn, resource_id),
        ResourceKind::Task => queries::project_ref_for_task(conn, resource_id),
    }
}
