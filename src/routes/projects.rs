use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::project_dto::{
        CreateProjectPayload, ProjectListResponse, ProjectResponse, UpdateProjectPayload,
    },
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[axum::debug_handler]
pub async fn create_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateProjectPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.identity_service.resolve(&claims).await?;
    let project = state.project_service.create(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(ProjectResponse::from(project))))
}

#[axum::debug_handler]
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user = state.identity_service.resolve(&claims).await?;
    let projects = state.project_service.list(user.id).await?;
    let items = projects.into_iter().map(ProjectResponse::from).collect();
    Ok(Json(ProjectListResponse { items }))
}

#[axum::debug_handler]
pub async fn get_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state.identity_service.resolve(&claims).await?;
    let project = state.project_service.get(user.id, id).await?;
    Ok(Json(ProjectResponse::from(project)))
}

#[axum::debug_handler]
pub async fn update_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.identity_service.resolve(&claims).await?;
    let project = state.project_service.update(user.id, id, payload).await?;
    Ok(Json(ProjectResponse::from(project)))
}

#[axum::debug_handler]
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state.identity_service.resolve(&claims).await?;
    state.project_service.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
