use std::env;

use crate::models::WorkspaceRole;

/// Roles that carry member-management rights by default. `admin` is accepted
/// in the role column as a manage-rights alias; it grants nothing else.
const DEFAULT_MANAGER_ROLES: [WorkspaceRole; 2] = [WorkspaceRole::Owner, WorkspaceRole::Admin];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub base_url: String,
    /// Base URL the invite links point at (the web client).
    pub frontend_url: String,
    /// Roles treated as workspace managers, configurable via MANAGER_ROLES.
    pub manager_roles: Vec<WorkspaceRole>,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("TASKDECK_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url = env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));
        let frontend_url = env::var("FRONTEND_URL").unwrap_or_else(|_| base_url.clone());

        let manager_roles = env::var("MANAGER_ROLES")
            .ok()
            .map(|v| parse_manager_roles(&v))
            .filter(|roles| !roles.is_empty())
            .unwrap_or_else(|| DEFAULT_MANAGER_ROLES.to_vec());

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "taskdeck.db".to_string()),
            base_url,
            frontend_url,
            manager_roles,
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_manager_roles(value: &str) -> Vec<WorkspaceRole> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}
