use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::db::{AppState, queries};
use crate::models::User;
use crate::util::{extract_bearer_token, hash_token};

/// The authenticated caller, inserted by [`user_auth`] for every protected
/// route.
#[derive(Clone)]
pub struct UserContext {
    pub user: User,
}

/// Authenticate the caller from the bearer access token.
pub async fn user_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer_token(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let conn = state.db.get().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let user = queries::get_user_by_token_hash(&conn, &hash_token(token))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(UserContext { user });
    Ok(next.run(request).await)
}
