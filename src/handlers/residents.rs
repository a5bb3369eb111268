// src/handlers/residents.rs

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
    models::resident::{CreateResidentPayload, UpdateResidentPayload},
};

pub async fn list_residents(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let residents = app_state.resident_service.list_residents().await?;
    Ok(Json(residents))
}

pub async fn get_resident(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let resident = app_state.resident_service.get_resident(id).await?;
    Ok(Json(resident))
}

// Quarto inexistente (422) e quarto lotado (409) voltam como erro e nada é gravado
pub async fn create_resident(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateResidentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    let resident = app_state.resident_service.create_resident(&payload).await?;
    Ok((StatusCode::CREATED, Json(resident)))
}

pub async fn update_resident(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateResidentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    let resident = app_state.resident_service.update_resident(id, &payload).await?;
    Ok(Json(resident))
}

// Sempre responde sucesso se o hóspede existia, mesmo que o quarto não tenha sido limpo
pub async fn delete_resident(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.resident_service.delete_resident(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
