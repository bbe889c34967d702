//! Shared utility functions for the taskdeck application.

use axum::http::HeaderMap;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

/// Extract a Bearer token from the Authorization header.
///
/// Returns the token string without the "Bearer " prefix, or None if
/// the header is missing, malformed, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Generate an opaque URL-safe token from `n` random bytes.
///
/// Used for invite tokens (16 bytes, 22 chars) and access tokens (32 bytes).
pub fn generate_token(n: usize) -> String {
    let mut bytes = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a user access token with a recognizable prefix.
/// The full token is shown once at registration; only its hash is stored.
pub fn generate_access_token() -> String {
    format!("td_{}", generate_token(32))
}

/// Hash an access token for storage/lookup (raw tokens are never stored).
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"taskdeck-token-v1:");
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
