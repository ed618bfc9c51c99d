use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::time_entry_dto::{
        CreateTimeEntryPayload, StartTimeEntryPayload, StopTimeEntryPayload, TimeEntryListQuery,
        TimeEntryListResponse, TimeEntryResponse, UpdateTimeEntryPayload,
    },
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[axum::debug_handler]
pub async fn start_time_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartTimeEntryPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.identity_service.resolve(&claims).await?;
    let entry = state.time_entry_service.start(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(TimeEntryResponse::from(entry))))
}

#[axum::debug_handler]
pub async fn stop_time_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StopTimeEntryPayload>,
) -> Result<impl IntoResponse> {
    let user = state.identity_service.resolve(&claims).await?;
    let entry = state
        .time_entry_service
        .stop(user.id, id, payload.end_time)
        .await?;
    Ok(Json(TimeEntryResponse::from(entry)))
}

#[axum::debug_handler]
pub async fn create_time_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateTimeEntryPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.identity_service.resolve(&claims).await?;
    let entry = state.time_entry_service.create(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(TimeEntryResponse::from(entry))))
}

#[axum::debug_handler]
pub async fn update_time_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTimeEntryPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.identity_service.resolve(&claims).await?;
    let entry = state.time_entry_service.update(user.id, id, payload).await?;
    Ok(Json(TimeEntryResponse::from(entry)))
}

#[axum::debug_handler]
pub async fn delete_time_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state.identity_service.resolve(&claims).await?;
    state.time_entry_service.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn get_time_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state.identity_service.resolve(&claims).await?;
    let entry = state.time_entry_service.get(user.id, id).await?;
    Ok(Json(TimeEntryResponse::from(entry)))
}

/// The single running entry of the caller, if any. 404 when nothing runs.
#[axum::debug_handler]
pub async fn get_current_time_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user = state.identity_service.resolve(&claims).await?;
    let entry = state
        .time_entry_service
        .get_running(user.id)
        .await?
        .ok_or_else(|| crate::error::Error::NotFound("No running time entry".to_string()))?;
    Ok(Json(TimeEntryResponse::from(entry)))
}

#[axum::debug_handler]
pub async fn list_time_entries(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<TimeEntryListQuery>,
) -> Result<impl IntoResponse> {
    let user = state.identity_service.resolve(&claims).await?;
    let list = state.time_entry_service.list(user.id, query).await?;
    Ok(Json(TimeEntryListResponse {
        items: list.items.into_iter().map(TimeEntryResponse::from).collect(),
        total: list.total,
        page: list.page,
        per_page: list.per_page,
        total_pages: list.total_pages,
    }))
}
