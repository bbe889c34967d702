use axum::extract::{Extension, State};
use serde_json::json;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::hierarchy;
use crate::middleware::UserContext;
use crate::models::{Comment, CreateComment, CreateTask, ResourceKind, Task, UpdateTask};
use crate::permissions;

pub async fn create_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(column_id): Path<String>,
    Json(input): Json<CreateTask>,
) -> Result<Json<Task>> {
    let conn = state.db.get()?;

    if queries::get_column_by_id(&conn, &column_id)?.is_none() {
        return Err(AppError::NotFound("Column not found".into()));
    }
    if !permissions::can_create_task(&conn, &ctx.user.id, &column_id)? {
        return Err(AppError::Forbidden(
            "Not enough rights to create tasks here".into(),
        ));
    }

    let task = queries::create_task(&conn, &column_id, &input, &ctx.user.id)?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(task_id): Path<String>,
    Json(input): Json<UpdateTask>,
) -> Result<Json<Task>> {
    let conn = state.db.get()?;

    if queries::get_task_by_id(&conn, &task_id)?.is_none() {
        return Err(AppError::NotFound("Task not found".into()));
    }
    if !permissions::can_edit_task(&conn, &ctx.user.id, &task_id)? {
        return Err(AppError::Forbidden(
            "Not enough rights to edit this task".into(),
        ));
    }

    queries::update_task(&conn, &task_id, &input)?;
    let task = queries::get_task_by_id(&conn, &task_id)?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(task_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;

    if queries::get_task_by_id(&conn, &task_id)?.is_none() {
        return Err(AppError::NotFound("Task not found".into()));
    }
    if !permissions::can_delete_task(&conn, &ctx.user.id, &task_id)? {
        return Err(AppError::Forbidden(
            "Not enough rights to delete this task".into(),
        ));
    }

    queries::delete_task(&conn, &task_id)?;
    Ok(Json(json!({ "deleted": true })))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(task_id): Path<String>,
    Json(input): Json<CreateComment>,
) -> Result<Json<Comment>> {
    let conn = state.db.get()?;

    if queries::get_task_by_id(&conn, &task_id)?.is_none() {
        return Err(AppError::NotFound("Task not found".into()));
    }
    if !permissions::can_comment_task(&conn, &ctx.user.id, &task_id)? {
        return Err(AppError::Forbidden(
            "Not enough rights to comment on this task".into(),
        ));
    }

    let comment = queries::create_comment(&conn, &task_id, &ctx.user.id, &input)?;
    Ok(Json(comment))
}

/// Reading comments needs view access to the task's project, nothing more.
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<Comment>>> {
    let conn = state.db.get()?;

    let project = hierarchy::resolve_project(&conn, ResourceKind::Task, &task_id)?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    if !permissions::can_view_project(&conn, &ctx.user.id, &project.project_id)? {
        return Err(AppError::Forbidden("No access to this task".into()));
    }

    let comments = queries::list_comments_for_task(&conn, &task_id)?;
    Ok(Json(comments))
}
