use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUser {
    pub email: String,
    pub name: String,
    /// Name for the default workspace provisioned at registration.
    /// Defaults to "{name}'s workspace".
    #[serde(default)]
    pub workspace_name: Option<String>,
}

/// Response when registering (includes the access token, shown only once).
#[derive(Debug, Serialize)]
pub struct UserRegistered {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Full access token - shown only on registration
    pub token: String,
    pub workspace_id: String,
    pub created_at: i64,
}
