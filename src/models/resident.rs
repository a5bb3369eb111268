// src/models/resident.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "resident_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResidentStatus {
    #[default]
    Active,
    Inactive,
}

// --- Hóspede (tabela 'residents') ---
// O hóspede é a fonte da verdade sobre "quem mora onde".
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resident {
    pub id: Uuid,
    pub name: String,
    // Número externo do quarto (não o id interno)
    pub room_number: String,
    pub phone: String,
    pub status: ResidentStatus,
    pub check_in: NaiveDate,
    pub expected_checkout: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateResidentPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(length(min = 1, message = "O número do quarto é obrigatório."))]
    pub room_number: String,

    #[validate(length(min = 1, message = "O telefone é obrigatório."))]
    pub phone: String,

    pub status: Option<ResidentStatus>,

    pub expected_checkout: Option<NaiveDate>,
}

impl CreateResidentPayload {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.room_number = self.room_number.trim().to_string();
        self.phone = self.phone.trim().to_string();
        self
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResidentPayload {
    #[validate(length(min = 1, message = "O nome não pode ser vazio."))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "O número do quarto não pode ser vazio."))]
    pub room_number: Option<String>,

    #[validate(length(min = 1, message = "O telefone não pode ser vazio."))]
    pub phone: Option<String>,

    pub status: Option<ResidentStatus>,

    // Campo ausente mantém a data; `null` apaga.
    #[serde(default, deserialize_with = "present_or_null")]
    pub expected_checkout: Option<Option<NaiveDate>>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateResidentPayload {
    pub fn normalized(mut self) -> Self {
        let trim = |value: Option<String>| value.map(|v| v.trim().to_string());
        self.name = trim(self.name);
        self.room_number = trim(self.room_number);
        self.phone = trim(self.phone);
        self
    }
}
