use axum::extract::{Extension, State};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::middleware::UserContext;
use crate::models::{CreateWorkspace, RegisterUser, User, UserRegistered, WorkspaceRole};
use crate::util::{generate_access_token, hash_token};

/// Register a user. Provisions the default workspace and its owner
/// membership in the same transaction; the access token is returned once.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterUser>,
) -> Result<Json<UserRegistered>> {
    let mut conn = state.db.get()?;

    if queries::get_user_by_email(&conn, &input.email)?.is_some() {
        return Err(AppError::Conflict("Email is already registered".into()));
    }

    let token = generate_access_token();
    let token_hash = hash_token(&token);
    let workspace_name = input
        .workspace_name
        .clone()
        .unwrap_or_else(|| format!("{}'s workspace", input.name));

    let tx = conn.transaction()?;
    let user = queries::create_user(&tx, &input.email, &input.name, &token_hash)?;
    let workspace = queries::create_workspace(
        &tx,
        &CreateWorkspace {
            name: workspace_name,
            description: None,
        },
    )?;
    queries::insert_membership(&tx, &user.id, &workspace.id, WorkspaceRole::Owner, true, true)?;
    tx.commit()?;

    tracing::info!(user_id = %user.id, workspace_id = %workspace.id, "registered user");

    Ok(Json(UserRegistered {
        id: user.id,
        email: user.email,
        name: user.name,
        token,
        workspace_id: workspace.id,
        created_at: user.created_at,
    }))
}

pub async fn me(Extension(ctx): Extension<UserContext>) -> Result<Json<User>> {
    Ok(Json(ctx.user))
}
