// src/handlers/rooms.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AdminOnly, RequireRole},
    models::room::{CreateRoomPayload, UpdateRoomPayload},
};

pub async fn list_rooms(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rooms = app_state.room_service.list_rooms().await?;
    Ok(Json(rooms))
}

pub async fn get_room(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let room = app_state.room_service.get_room(id).await?;
    Ok(Json(room))
}

pub async fn create_room(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<CreateRoomPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    let room = app_state.room_service.create_room(&payload).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn update_room(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoomPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    let room = app_state.room_service.update_room(id, &payload).await?;
    Ok(Json(room))
}

pub async fn delete_room(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.room_service.delete_room(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
