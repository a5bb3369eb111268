// src/db/room_repo.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::room::{Occupant, Room, RoomStatus, RoomType},
};

// Colunas da tabela 'rooms', na ordem do struct Room
const ROOM_COLUMNS: &str = "id, number, room_type, price_per_month, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OccupantRow {
    room_id: Uuid,
    resident_id: Uuid,
    name: String,
    check_in: chrono::NaiveDate,
}

// O repositório de quartos. A lista de ocupantes é só leitura aqui;
// quem escreve em 'room_occupants' é o PgOccupancyStore.
#[derive(Clone)]
pub struct RoomRepository {
    pool: PgPool,
}

impl RoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    pub async fn list_rooms(&self) -> Result<Vec<Room>, AppError> {
        let rooms = sqlx::query_as::<_, Room>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms ORDER BY number ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rooms)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Room>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let room = sqlx::query_as::<_, Room>(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(room)
    }

    /// Igual a `find_by_id`, mas trava a linha até o fim da transação.
    pub async fn find_by_id_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Room>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let room = sqlx::query_as::<_, Room>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(room)
    }

    /// Ocupantes de todos os quartos, agrupados por quarto e em ordem de entrada.
    /// Nome e check-in vêm do próprio hóspede (join), nunca de uma cópia.
    pub async fn occupants_by_room(&self) -> Result<HashMap<Uuid, Vec<Occupant>>, AppError> {
        let rows = sqlx::query_as::<_, OccupantRow>(
            r#"
            SELECT o.room_id, r.id AS resident_id, r.name, r.check_in
            FROM room_occupants o
            JOIN residents r ON r.id = o.resident_id
            ORDER BY o.room_id, o.position ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<Occupant>> = HashMap::new();
        for row in rows {
            grouped.entry(row.room_id).or_default().push(Occupant {
                resident_id: row.resident_id,
                name: row.name,
                check_in: row.check_in,
            });
        }
        Ok(grouped)
    }

    pub async fn occupants_of<'e, E>(&self, executor: E, room_id: Uuid) -> Result<Vec<Occupant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let occupants = sqlx::query_as::<_, Occupant>(
            r#"
            SELECT r.id AS resident_id, r.name, r.check_in
            FROM room_occupants o
            JOIN residents r ON r.id = o.resident_id
            WHERE o.room_id = $1
            ORDER BY o.position ASC
            "#,
        )
        .bind(room_id)
        .fetch_all(executor)
        .await?;
        Ok(occupants)
    }

    // ---
    // Escrita (aceitam executor para rodar dentro de transações)
    // ---

    pub async fn create_room<'e, E>(
        &self,
        executor: E,
        number: &str,
        room_type: RoomType,
        price_per_month: Decimal,
        status: RoomStatus,
    ) -> Result<Room, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Room>(&format!(
            r#"
            INSERT INTO rooms (number, room_type, price_per_month, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {ROOM_COLUMNS}
            "#
        ))
        .bind(number)
        .bind(room_type)
        .bind(price_per_month)
        .bind(status)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_number(e, number))
    }

    pub async fn update_room<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        number: &str,
        room_type: RoomType,
        price_per_month: Decimal,
        status: RoomStatus,
    ) -> Result<Room, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Room>(&format!(
            r#"
            UPDATE rooms
            SET number = $2, room_type = $3, price_per_month = $4, status = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {ROOM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(number)
        .bind(room_type)
        .bind(price_per_month)
        .bind(status)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_number(e, number))
    }

    // Chamado com o quarto já travado pelo serviço
    pub async fn delete_room<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}

// Converte a violação de unicidade do número em um erro amigável
fn map_unique_number(e: sqlx::Error, number: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() && db_err.constraint() == Some("rooms_number_key") {
            return AppError::RoomNumberAlreadyExists(number.to_string());
        }
    }
    e.into()
}
