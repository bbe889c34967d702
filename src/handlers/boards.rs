use axum::extract::{Extension, State};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::UserContext;
use crate::models::{Board, BoardColumn, CreateBoard, CreateColumn};
use crate::permissions;

pub async fn create_board(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(project_id): Path<String>,
    Json(input): Json<CreateBoard>,
) -> Result<Json<Board>> {
    let conn = state.db.get()?;

    if queries::get_project_by_id(&conn, &project_id)?.is_none() {
        return Err(AppError::NotFound("Project not found".into()));
    }
    if !permissions::can_create_board(&conn, &ctx.user.id, &project_id)? {
        return Err(AppError::Forbidden(
            "Not enough rights to modify this project's structure".into(),
        ));
    }

    let board = queries::create_board(&conn, &project_id, &input)?;
    Ok(Json(board))
}

pub async fn create_column(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(board_id): Path<String>,
    Json(input): Json<CreateColumn>,
) -> Result<Json<BoardColumn>> {
    let conn = state.db.get()?;

    let board = queries::get_board_by_id(&conn, &board_id)?
        .ok_or_else(|| AppError::NotFound("Board not found".into()))?;
    if !permissions::can_create_board(&conn, &ctx.user.id, &board.project_id)? {
        return Err(AppError::Forbidden(
            "Not enough rights to modify this project's structure".into(),
        ));
    }

    let column = queries::create_column(&conn, &board_id, &input)?;
    Ok(Json(column))
}
