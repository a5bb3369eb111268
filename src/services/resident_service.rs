// src/services/resident_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{PgOccupancyStore, ResidentChanges, ResidentRepository},
    models::resident::{CreateResidentPayload, Resident, UpdateResidentPayload},
    services::occupancy::{OccupancySynchronizer, Placement},
};

#[derive(Clone)]
pub struct ResidentService {
    resident_repo: ResidentRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl ResidentService {
    pub fn new(resident_repo: ResidentRepository, pool: PgPool) -> Self {
        Self { resident_repo, pool }
    }

    pub async fn list_residents(&self) -> Result<Vec<Resident>, AppError> {
        self.resident_repo.list_residents().await
    }

    pub async fn get_resident(&self, id: Uuid) -> Result<Resident, AppError> {
        self.resident_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::ResidentNotFound)
    }

    /// Cria o hóspede e o coloca no quarto, atomicamente.
    /// Se o quarto não existe ou está lotado, nada é gravado.
    pub async fn create_resident(&self, payload: &CreateResidentPayload) -> Result<Resident, AppError> {
        let mut tx = self.pool.begin().await?;

        let resident = self
            .resident_repo
            .create_resident(
                &mut *tx,
                &payload.name,
                &payload.room_number,
                &payload.phone,
                payload.status.unwrap_or_default(),
                Utc::now().date_naive(),
                payload.expected_checkout,
            )
            .await?;

        // Se falhar aqui, o tx sofre rollback automático ao sair do escopo (drop)
        OccupancySynchronizer::new(PgOccupancyStore::new(&mut *tx))
            .on_resident_added(&Placement::from(&resident))
            .await?;

        tx.commit().await?;

        tracing::info!(resident_id = %resident.id, room = %resident.room_number, "Hóspede criado");
        Ok(resident)
    }

    /// Atualização parcial; troca de quarto ou de status passa pelo sincronizador
    /// na mesma transação, então uma falha desfaz a atualização inteira.
    pub async fn update_resident(&self, id: Uuid, payload: &UpdateResidentPayload) -> Result<Resident, AppError> {
        let mut tx = self.pool.begin().await?;

        let previous = self
            .resident_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::ResidentNotFound)?;

        let changes = ResidentChanges {
            name: payload.name.as_deref(),
            room_number: payload.room_number.as_deref(),
            phone: payload.phone.as_deref(),
            status: payload.status,
            expected_checkout: payload.expected_checkout,
        };
        let updated = self.resident_repo.update_resident(&mut *tx, id, &changes).await?;

        OccupancySynchronizer::new(PgOccupancyStore::new(&mut *tx))
            .on_resident_updated(&Placement::from(&previous), &Placement::from(&updated))
            .await?;

        tx.commit().await?;

        tracing::info!(resident_id = %id, "Hóspede atualizado");
        Ok(updated)
    }

    /// Apagar o hóspede é a operação principal; a limpeza do quarto é melhor esforço.
    pub async fn delete_resident(&self, id: Uuid) -> Result<(), AppError> {
        let removed = self
            .resident_repo
            .delete_resident(&self.pool, id)
            .await?
            .ok_or(AppError::ResidentNotFound)?;

        tracing::info!(resident_id = %id, "Hóspede removido");

        if let Err(e) = self.release_room(&removed).await {
            tracing::warn!(
                resident_id = %id,
                room = %removed.room_number,
                error = %e,
                "Não foi possível atualizar o quarto após remover o hóspede"
            );
        }

        Ok(())
    }

    async fn release_room(&self, removed: &Resident) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        OccupancySynchronizer::new(PgOccupancyStore::new(&mut *tx))
            .on_resident_removed(&removed.room_number, removed.id)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::{
        db::RoomRepository,
        models::{
            resident::ResidentStatus,
            room::{Occupant, Room, RoomStatus, RoomType},
        },
        services::occupancy::SyncError,
    };

    // Roda contra o Postgres de DATABASE_URL; cada teste ganha um banco novo já migrado.

    fn service(pool: &PgPool) -> ResidentService {
        ResidentService::new(ResidentRepository::new(pool.clone()), pool.clone())
    }

    async fn seed_room(pool: &PgPool, number: &str, room_type: RoomType) -> Room {
        RoomRepository::new(pool.clone())
            .create_room(pool, number, room_type, Decimal::new(30000, 2), RoomStatus::Available)
            .await
            .unwrap()
    }

    async fn reload(pool: &PgPool, room: &Room) -> (RoomStatus, Vec<Uuid>) {
        let repo = RoomRepository::new(pool.clone());
        let current = repo.find_by_id(pool, room.id).await.unwrap().unwrap();
        let occupants: Vec<Occupant> = repo.occupants_of(pool, room.id).await.unwrap();
        (current.status, occupants.into_iter().map(|o| o.resident_id).collect())
    }

    async fn resident_count(pool: &PgPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM residents")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn new_resident(name: &str, room_number: &str) -> CreateResidentPayload {
        CreateResidentPayload {
            name: name.into(),
            room_number: room_number.into(),
            phone: "11 99999-0000".into(),
            status: None,
            expected_checkout: None,
        }
    }

    fn move_to(room_number: &str) -> UpdateResidentPayload {
        UpdateResidentPayload {
            room_number: Some(room_number.into()),
            ..Default::default()
        }
    }

    #[sqlx::test]
    async fn create_into_unknown_room_persists_nothing(pool: PgPool) {
        let err = service(&pool)
            .create_resident(&new_resident("Ana", "999"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Occupancy(SyncError::RoomNotFound(ref n)) if n == "999"));
        assert_eq!(resident_count(&pool).await, 0);
    }

    #[sqlx::test]
    async fn create_into_full_room_rolls_back(pool: PgPool) {
        let room = seed_room(&pool, "101", RoomType::Single).await;
        let residents = service(&pool);

        let alice = residents.create_resident(&new_resident("Alice", "101")).await.unwrap();
        let err = residents
            .create_resident(&new_resident("Bob", "101"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Occupancy(SyncError::RoomFull(_))));
        assert_eq!(resident_count(&pool).await, 1);
        assert_eq!(reload(&pool, &room).await, (RoomStatus::Occupied, vec![alice.id]));
    }

    #[sqlx::test]
    async fn moving_frees_the_old_room_and_fills_the_new_one(pool: PgPool) {
        let single = seed_room(&pool, "101", RoomType::Single).await;
        let double = seed_room(&pool, "102", RoomType::Double).await;
        let residents = service(&pool);

        let alice = residents.create_resident(&new_resident("Alice", "101")).await.unwrap();
        let moved = residents.update_resident(alice.id, &move_to("102")).await.unwrap();

        assert_eq!(moved.room_number, "102");
        assert_eq!(reload(&pool, &single).await, (RoomStatus::Available, vec![]));
        assert_eq!(reload(&pool, &double).await, (RoomStatus::Occupied, vec![alice.id]));
    }

    #[sqlx::test]
    async fn failed_move_leaves_the_resident_where_it_was(pool: PgPool) {
        let first = seed_room(&pool, "101", RoomType::Single).await;
        let second = seed_room(&pool, "103", RoomType::Single).await;
        let residents = service(&pool);

        let alice = residents.create_resident(&new_resident("Alice", "101")).await.unwrap();
        let bob = residents.create_resident(&new_resident("Bob", "103")).await.unwrap();

        let err = residents.update_resident(alice.id, &move_to("103")).await.unwrap_err();
        assert!(matches!(err, AppError::Occupancy(SyncError::RoomFull(_))));

        let alice = residents.get_resident(alice.id).await.unwrap();
        assert_eq!(alice.room_number, "101");
        assert_eq!(reload(&pool, &first).await, (RoomStatus::Occupied, vec![alice.id]));
        assert_eq!(reload(&pool, &second).await, (RoomStatus::Occupied, vec![bob.id]));
    }

    #[sqlx::test]
    async fn deactivating_frees_the_bed(pool: PgPool) {
        let room = seed_room(&pool, "101", RoomType::Single).await;
        let residents = service(&pool);

        let alice = residents.create_resident(&new_resident("Alice", "101")).await.unwrap();
        let changes = UpdateResidentPayload {
            status: Some(ResidentStatus::Inactive),
            ..Default::default()
        };
        residents.update_resident(alice.id, &changes).await.unwrap();

        assert_eq!(reload(&pool, &room).await, (RoomStatus::Available, vec![]));
    }

    #[sqlx::test]
    async fn checkout_date_can_be_kept_or_cleared(pool: PgPool) {
        seed_room(&pool, "101", RoomType::Single).await;
        let residents = service(&pool);
        let checkout = NaiveDate::from_ymd_opt(2026, 12, 1);

        let alice = residents
            .create_resident(&CreateResidentPayload {
                expected_checkout: checkout,
                ..new_resident("Alice", "101")
            })
            .await
            .unwrap();

        let renamed = UpdateResidentPayload {
            name: Some("Alice Souza".into()),
            ..Default::default()
        };
        let alice = residents.update_resident(alice.id, &renamed).await.unwrap();
        assert_eq!(alice.expected_checkout, checkout);

        let cleared = UpdateResidentPayload {
            expected_checkout: Some(None),
            ..Default::default()
        };
        let alice = residents.update_resident(alice.id, &cleared).await.unwrap();
        assert_eq!(alice.expected_checkout, None);
    }

    #[sqlx::test]
    async fn deleting_frees_the_room(pool: PgPool) {
        let room = seed_room(&pool, "101", RoomType::Single).await;
        let residents = service(&pool);

        let alice = residents.create_resident(&new_resident("Alice", "101")).await.unwrap();
        residents.delete_resident(alice.id).await.unwrap();

        assert_eq!(reload(&pool, &room).await, (RoomStatus::Available, vec![]));
        assert!(matches!(
            residents.get_resident(alice.id).await,
            Err(AppError::ResidentNotFound)
        ));
    }

    #[sqlx::test]
    async fn deleting_succeeds_even_when_the_room_cannot_be_updated(pool: PgPool) {
        seed_room(&pool, "101", RoomType::Single).await;
        let residents = service(&pool);
        let alice = residents.create_resident(&new_resident("Alice", "101")).await.unwrap();

        // Sem a tabela de quartos, a limpeza falha; a remoção do hóspede não.
        sqlx::query("ALTER TABLE rooms RENAME TO rooms_offline")
            .execute(&pool)
            .await
            .unwrap();

        residents.delete_resident(alice.id).await.unwrap();
        assert_eq!(resident_count(&pool).await, 0);
    }

    #[sqlx::test]
    async fn concurrent_creates_never_overfill_a_room(pool: PgPool) {
        let room = seed_room(&pool, "201", RoomType::Double).await;
        let residents = service(&pool);

        let attempts: Vec<_> = (0..8)
            .map(|i| {
                let residents = residents.clone();
                tokio::spawn(async move {
                    residents
                        .create_resident(&new_resident(&format!("Hóspede {i}"), "201"))
                        .await
                })
            })
            .collect();

        let mut placed = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => placed += 1,
                Err(e) => assert!(matches!(e, AppError::Occupancy(SyncError::RoomFull(_))), "{e:?}"),
            }
        }

        assert_eq!(placed, 2);
        assert_eq!(resident_count(&pool).await, 2);
        let (status, occupants) = reload(&pool, &room).await;
        assert_eq!(status, RoomStatus::Occupied);
        assert_eq!(occupants.len(), 2);
    }

    #[sqlx::test]
    async fn simultaneous_opposite_moves_both_succeed(pool: PgPool) {
        let left = seed_room(&pool, "401", RoomType::Double).await;
        let right = seed_room(&pool, "402", RoomType::Double).await;
        let residents = service(&pool);

        let x = residents.create_resident(&new_resident("X", "401")).await.unwrap();
        let y = residents.create_resident(&new_resident("Y", "402")).await.unwrap();

        let (mut x_room, mut y_room) = ("401", "402");
        for _ in 0..10 {
            let (x_moves, y_moves) = (move_to(y_room), move_to(x_room));
            let (moved_x, moved_y) = tokio::join!(
                residents.update_resident(x.id, &x_moves),
                residents.update_resident(y.id, &y_moves),
            );
            moved_x.unwrap();
            moved_y.unwrap();
            (x_room, y_room) = (y_room, x_room);
        }

        // Dez trocas: cada um volta ao quarto de origem.
        assert_eq!(reload(&pool, &left).await, (RoomStatus::Occupied, vec![x.id]));
        assert_eq!(reload(&pool, &right).await, (RoomStatus::Occupied, vec![y.id]));
    }
}
