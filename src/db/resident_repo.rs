// src/db/resident_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::resident::{Resident, ResidentStatus},
};

const RESIDENT_COLUMNS: &str =
    "id, name, room_number, phone, status, check_in, expected_checkout, created_at, updated_at";

/// Campos alteráveis de um hóspede; `None` mantém o valor atual.
/// Em `expected_checkout`, `Some(None)` apaga a data.
#[derive(Debug, Default)]
pub struct ResidentChanges<'a> {
    pub name: Option<&'a str>,
    pub room_number: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub status: Option<ResidentStatus>,
    pub expected_checkout: Option<Option<NaiveDate>>,
}

#[derive(Clone)]
pub struct ResidentRepository {
    pool: PgPool,
}

impl ResidentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Mais recentes primeiro
    pub async fn list_residents(&self) -> Result<Vec<Resident>, AppError> {
        let residents = sqlx::query_as::<_, Resident>(&format!(
            "SELECT {RESIDENT_COLUMNS} FROM residents ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(residents)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Resident>, AppError> {
        let resident = sqlx::query_as::<_, Resident>(&format!(
            "SELECT {RESIDENT_COLUMNS} FROM residents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(resident)
    }

    pub async fn find_by_id_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Resident>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let resident = sqlx::query_as::<_, Resident>(&format!(
            "SELECT {RESIDENT_COLUMNS} FROM residents WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(resident)
    }

    pub async fn create_resident<'e, E>(
        &self,
        executor: E,
        name: &str,
        room_number: &str,
        phone: &str,
        status: ResidentStatus,
        check_in: NaiveDate,
        expected_checkout: Option<NaiveDate>,
    ) -> Result<Resident, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let resident = sqlx::query_as::<_, Resident>(&format!(
            r#"
            INSERT INTO residents (name, room_number, phone, status, check_in, expected_checkout)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RESIDENT_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(room_number)
        .bind(phone)
        .bind(status)
        .bind(check_in)
        .bind(expected_checkout)
        .fetch_one(executor)
        .await?;
        Ok(resident)
    }

    pub async fn update_resident<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: &ResidentChanges<'_>,
    ) -> Result<Resident, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let resident = sqlx::query_as::<_, Resident>(&format!(
            r#"
            UPDATE residents
            SET name = COALESCE($2, name),
                room_number = COALESCE($3, room_number),
                phone = COALESCE($4, phone),
                status = COALESCE($5, status),
                expected_checkout = CASE WHEN $6 THEN $7 ELSE expected_checkout END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {RESIDENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.room_number)
        .bind(changes.phone)
        .bind(changes.status)
        .bind(changes.expected_checkout.is_some())
        .bind(changes.expected_checkout.flatten())
        .fetch_optional(executor)
        .await?;

        resident.ok_or(AppError::ResidentNotFound)
    }

    /// Apaga e devolve o registro removido (para limpar o quarto depois).
    pub async fn delete_resident<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Resident>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let resident = sqlx::query_as::<_, Resident>(&format!(
            "DELETE FROM residents WHERE id = $1 RETURNING {RESIDENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(resident)
    }
}
