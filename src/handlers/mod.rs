mod boards;
mod invites;
mod members;
mod projects;
mod tasks;
mod users;
mod workspaces;

pub use boards::*;
pub use invites::*;
pub use members::*;
pub use projects::*;
pub use tasks::*;
pub use users::*;
pub use workspaces::*;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::db::AppState;
use crate::middleware::user_auth;

pub fn router(state: AppState) -> Router<AppState> {
    // Open routes: registration and the invite landing lookup.
    let public_routes = Router::new()
        .route("/api/users", post(register))
        .route("/api/invites/{token}", get(get_invite_details));

    let protected_routes = Router::new()
        .route("/api/users/me", get(me))
        // Workspaces and members
        .route("/api/workspaces", post(create_workspace))
        .route("/api/workspaces", get(list_workspaces))
        .route("/api/workspaces/{workspace_id}", get(get_workspace))
        .route("/api/workspace/members", get(list_members))
        .route("/api/workspace/members/{user_id}", put(update_member))
        .route("/api/workspace/members/{user_id}", delete(remove_member))
        // Invites
        .route("/api/invites", post(create_invite))
        .route("/api/invites/workspace/{workspace_id}", get(get_active_invite))
        .route("/api/invites/accept/{token}", post(accept_invite))
        .route("/api/invites/{token}", delete(deactivate_invite))
        .route("/api/invites/send", post(send_invite))
        // Projects and the containment hierarchy
        .route("/api/projects", post(create_project))
        .route("/api/projects", get(list_projects))
        .route("/api/projects/{project_id}", get(get_project))
        .route("/api/projects/{project_id}/access", post(grant_project_access))
        .route("/api/projects/{project_id}/boards", post(create_board))
        .route("/api/boards/{board_id}/columns", post(create_column))
        .route("/api/columns/{column_id}/tasks", post(create_task))
        .route("/api/tasks/{task_id}", put(update_task))
        .route("/api/tasks/{task_id}", delete(delete_task))
        .route("/api/tasks/{task_id}/comments", post(create_comment))
        .route("/api/tasks/{task_id}/comments", get(list_comments))
        .layer(middleware::from_fn_with_state(state.clone(), user_auth));

    public_routes.merge(protected_routes)
}
