use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::user_dto::{UpdateUserPayload, UserListResponse, UserResponse},
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let users = state.user_service.list().await?;
    let items = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(UserListResponse { items }))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.get_by_id(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Resolves (and on first contact provisions) the caller's own record.
#[axum::debug_handler]
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user = state.identity_service.resolve(&claims).await?;
    Ok(Json(UserResponse::from(user)))
}

#[axum::debug_handler]
pub async fn update_current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.identity_service.resolve(&claims).await?;
    let user = state.user_service.update_profile(user.id, payload).await?;
    Ok(Json(UserResponse::from(user)))
}

#[axum::debug_handler]
pub async fn deactivate_current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user = state.identity_service.resolve(&claims).await?;
    state.user_service.deactivate(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
