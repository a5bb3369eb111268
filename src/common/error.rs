// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::occupancy::SyncError;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário inativo")]
    UserInactive,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Quarto não encontrado")]
    RoomNotFound,

    #[error("Já existe um quarto com o número '{0}'")]
    RoomNumberAlreadyExists(String),

    #[error("O quarto '{0}' possui hóspedes")]
    RoomOccupied(String),

    #[error("O quarto '{number}' comporta {capacity} hóspede(s), mas possui {occupants}")]
    RoomCapacityBelowOccupancy {
        number: String,
        capacity: usize,
        occupants: usize,
    },

    #[error("Hóspede não encontrado")]
    ResidentNotFound,

    // Falhas do sincronizador de ocupação (quarto inexistente, lotado, banco fora)
    #[error(transparent)]
    Occupancy(#[from] SyncError),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Status HTTP e código estável (para o cliente distinguir os casos).
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "EMAIL_ALREADY_EXISTS"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            AppError::UserInactive => (StatusCode::FORBIDDEN, "USER_INACTIVE"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::RoomNotFound => (StatusCode::NOT_FOUND, "ROOM_NOT_FOUND"),
            AppError::RoomNumberAlreadyExists(_) => (StatusCode::CONFLICT, "ROOM_NUMBER_ALREADY_EXISTS"),
            AppError::RoomOccupied(_) => (StatusCode::CONFLICT, "ROOM_OCCUPIED"),
            AppError::RoomCapacityBelowOccupancy { .. } => {
                (StatusCode::CONFLICT, "ROOM_CAPACITY_BELOW_OCCUPANCY")
            }
            AppError::ResidentNotFound => (StatusCode::NOT_FOUND, "RESIDENT_NOT_FOUND"),
            // O quarto referenciado pelo hóspede não existe: o pedido é inválido, não a rota.
            AppError::Occupancy(SyncError::RoomNotFound(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "ROOM_NOT_FOUND")
            }
            AppError::Occupancy(SyncError::RoomFull(_)) => (StatusCode::CONFLICT, "ROOM_FULL"),
            AppError::Occupancy(SyncError::StoreUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
            }
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "error": "Um ou mais campos são inválidos.",
                    "code": code,
                    "details": details,
                })
            }

            // Erros 5xx: o detalhe vai para o log, nunca para o cliente.
            ref e if status.is_server_error() => {
                tracing::error!(error = %e, source = ?e, "Erro Interno do Servidor");
                let message = if status == StatusCode::SERVICE_UNAVAILABLE {
                    "O banco de dados está indisponível no momento."
                } else {
                    "Ocorreu um erro inesperado."
                };
                json!({ "error": message, "code": code })
            }

            ref e => json!({ "error": e.to_string(), "code": code }),
        };

        (status, Json(body)).into_response()
    }
}
