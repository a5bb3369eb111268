// src/db/occupancy_store.rs

use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    models::room::{RoomStatus, RoomType},
    services::occupancy::{OccupancyStore, PushOutcome, RoomSlot},
};

/// Porta de ocupação sobre uma conexão Postgres.
///
/// Deve receber a conexão de uma transação aberta (`&mut *tx`): as travas
/// `FOR UPDATE` sobre o quarto só duram até o commit.
pub struct PgOccupancyStore<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgOccupancyStore<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    async fn lock_room(&mut self, room_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT id FROM rooms WHERE id = $1 FOR UPDATE")
            .bind(room_id)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(())
    }

    async fn count_occupants(&mut self, room_id: Uuid) -> Result<usize, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM room_occupants WHERE room_id = $1")
            .bind(room_id)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[derive(sqlx::FromRow)]
struct RoomSlotRow {
    id: Uuid,
    number: String,
    room_type: RoomType,
    status: RoomStatus,
}

#[async_trait]
impl<'c> OccupancyStore for PgOccupancyStore<'c> {
    async fn find_room(&mut self, number: &str) -> Result<Option<RoomSlot>, sqlx::Error> {
        // Trava o quarto já na leitura: o status lido continua valendo até o commit.
        let row = sqlx::query_as::<_, RoomSlotRow>(
            "SELECT id, number, room_type, status FROM rooms WHERE number = $1 FOR UPDATE",
        )
        .bind(number)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(|r| RoomSlot {
            id: r.id,
            number: r.number,
            room_type: r.room_type,
            status: r.status,
        }))
    }

    async fn lock_rooms(&mut self, numbers: &[&str]) -> Result<(), sqlx::Error> {
        // As travas seguem a ordem do ORDER BY, igual para todas as transações.
        sqlx::query("SELECT id FROM rooms WHERE number = ANY($1) ORDER BY number FOR UPDATE")
            .bind(numbers)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(())
    }

    async fn push_occupant(
        &mut self,
        room_id: Uuid,
        resident_id: Uuid,
        capacity: usize,
    ) -> Result<PushOutcome, sqlx::Error> {
        self.lock_room(room_id).await?;

        let present: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM room_occupants WHERE room_id = $1 AND resident_id = $2)",
        )
        .bind(room_id)
        .bind(resident_id)
        .fetch_one(&mut *self.conn)
        .await?;

        if present {
            return Ok(PushOutcome::AlreadyPresent);
        }

        if self.count_occupants(room_id).await? >= capacity {
            return Ok(PushOutcome::Full);
        }

        sqlx::query("INSERT INTO room_occupants (room_id, resident_id) VALUES ($1, $2)")
            .bind(room_id)
            .bind(resident_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(PushOutcome::Added)
    }

    async fn pull_occupant(&mut self, room_id: Uuid, resident_id: Uuid) -> Result<usize, sqlx::Error> {
        self.lock_room(room_id).await?;

        sqlx::query("DELETE FROM room_occupants WHERE room_id = $1 AND resident_id = $2")
            .bind(room_id)
            .bind(resident_id)
            .execute(&mut *self.conn)
            .await?;

        self.count_occupants(room_id).await
    }

    async fn set_status(&mut self, room_id: Uuid, status: RoomStatus) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE rooms SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(room_id)
            .bind(status)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }
}
