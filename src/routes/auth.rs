use axum::{response::IntoResponse, Extension, Json};
use serde_json::json;

use crate::middleware::auth::Claims;

/// Echoes the verified claim set of the current token. Handy for checking
/// what the identity provider actually sends.
#[axum::debug_handler]
pub async fn me(Extension(claims): Extension<Claims>) -> impl IntoResponse {
    Json(json!({
        "subject": claims.sub,
        "email": claims.email,
        "emails": claims.emails,
        "preferred_username": claims.preferred_username,
        "name": claims.name,
        "given_name": claims.given_name,
        "family_name": claims.family_name,
    }))
}
