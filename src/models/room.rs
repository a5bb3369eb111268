// src/models/room.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Tipo do quarto: define a capacidade ---
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "room_type", rename_all = "lowercase")] // Banco
#[serde(rename_all = "lowercase")] // JSON
pub enum RoomType {
    #[default]
    Single,
    Double,
    Triple,
    Quad,
}

impl RoomType {
    /// Número máximo de hóspedes simultâneos.
    pub fn capacity(self) -> usize {
        match self {
            RoomType::Single => 1,
            RoomType::Double => 2,
            RoomType::Triple => 3,
            RoomType::Quad => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "room_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Available,
    Occupied,
    Maintenance,
}

impl RoomStatus {
    /// Status que a ocupação atual implica (fora de manutenção).
    pub fn from_occupancy(occupants: usize) -> Self {
        if occupants == 0 {
            RoomStatus::Available
        } else {
            RoomStatus::Occupied
        }
    }

    /// Resolve um status pedido pela administração.
    /// Só `maintenance` é aceito literalmente; os demais são recalculados.
    pub fn resolve_requested(requested: RoomStatus, occupants: usize) -> Self {
        match requested {
            RoomStatus::Maintenance => RoomStatus::Maintenance,
            RoomStatus::Available | RoomStatus::Occupied => Self::from_occupancy(occupants),
        }
    }
}

// --- Quarto (linha da tabela 'rooms') ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Uuid,
    pub number: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub price_per_month: Decimal,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Ocupante: montado a partir do hóspede, nunca gravado como cópia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Occupant {
    pub resident_id: Uuid,
    pub name: String,
    pub check_in: NaiveDate,
}

/// O quarto como a API o devolve: linha + capacidade + ocupantes em ordem de entrada.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    #[serde(flatten)]
    pub room: Room,
    pub capacity: usize,
    pub occupants: Vec<Occupant>,
}

impl RoomView {
    pub fn new(room: Room, occupants: Vec<Occupant>) -> Self {
        Self {
            capacity: room.room_type.capacity(),
            room,
            occupants,
        }
    }
}

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomPayload {
    #[validate(length(min = 1, message = "O número do quarto é obrigatório."))]
    pub number: String,

    #[serde(rename = "type", default)]
    pub room_type: RoomType,

    #[validate(custom(function = "validate_not_negative"))]
    pub price_per_month: Decimal,

    pub status: Option<RoomStatus>,
}

impl CreateRoomPayload {
    pub fn normalized(mut self) -> Self {
        self.number = self.number.trim().to_string();
        self
    }
}

// Atualização parcial. Os ocupantes não fazem parte do formulário:
// só o sincronizador de ocupação mexe neles.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoomPayload {
    #[validate(length(min = 1, message = "O número do quarto não pode ser vazio."))]
    pub number: Option<String>,

    #[serde(rename = "type")]
    pub room_type: Option<RoomType>,

    #[validate(custom(function = "validate_not_negative"))]
    pub price_per_month: Option<Decimal>,

    pub status: Option<RoomStatus>,
}

impl UpdateRoomPayload {
    pub fn normalized(mut self) -> Self {
        self.number = self.number.map(|n| n.trim().to_string());
        self
    }
}
