// src/services/room_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RoomRepository,
    models::room::{CreateRoomPayload, Room, RoomStatus, RoomType, RoomView, UpdateRoomPayload},
};

#[derive(Clone)]
pub struct RoomService {
    room_repo: RoomRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

/// Valores finais de uma atualização de quarto, já conferidos contra a ocupação.
#[derive(Debug, PartialEq)]
pub struct RoomUpdatePlan {
    pub number: String,
    pub room_type: RoomType,
    pub price_per_month: Decimal,
    pub status: RoomStatus,
}

impl RoomUpdatePlan {
    /// Aplica o pedido sobre o quarto atual.
    ///
    /// O número é a chave usada pelos hóspedes, então não muda com gente dentro;
    /// o tipo não pode baixar a capacidade abaixo da ocupação atual.
    pub fn build(current: &Room, occupants: usize, changes: &UpdateRoomPayload) -> Result<Self, AppError> {
        let number = changes.number.clone().unwrap_or_else(|| current.number.clone());
        if number != current.number && occupants > 0 {
            return Err(AppError::RoomOccupied(current.number.clone()));
        }

        let room_type = changes.room_type.unwrap_or(current.room_type);
        if room_type.capacity() < occupants {
            return Err(AppError::RoomCapacityBelowOccupancy {
                number: current.number.clone(),
                capacity: room_type.capacity(),
                occupants,
            });
        }

        let status = match changes.status {
            Some(requested) => RoomStatus::resolve_requested(requested, occupants),
            None => current.status,
        };

        Ok(Self {
            number,
            room_type,
            price_per_month: changes.price_per_month.unwrap_or(current.price_per_month),
            status,
        })
    }
}

impl RoomService {
    pub fn new(room_repo: RoomRepository, pool: PgPool) -> Self {
        Self { room_repo, pool }
    }

    pub async fn list_rooms(&self) -> Result<Vec<RoomView>, AppError> {
        let rooms = self.room_repo.list_rooms().await?;
        let mut occupants = self.room_repo.occupants_by_room().await?;

        Ok(rooms
            .into_iter()
            .map(|room| {
                let list = occupants.remove(&room.id).unwrap_or_default();
                RoomView::new(room, list)
            })
            .collect())
    }

    pub async fn get_room(&self, id: Uuid) -> Result<RoomView, AppError> {
        let room = self
            .room_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::RoomNotFound)?;
        let occupants = self.room_repo.occupants_of(&self.pool, id).await?;
        Ok(RoomView::new(room, occupants))
    }

    /// Quarto novo nasce vazio: só `maintenance` é respeitado no pedido.
    pub async fn create_room(&self, payload: &CreateRoomPayload) -> Result<RoomView, AppError> {
        let status = payload
            .status
            .map(|s| RoomStatus::resolve_requested(s, 0))
            .unwrap_or(RoomStatus::Available);

        let room = self
            .room_repo
            .create_room(
                &self.pool,
                &payload.number,
                payload.room_type,
                payload.price_per_month,
                status,
            )
            .await?;

        tracing::info!(room = %room.number, "Quarto criado");
        Ok(RoomView::new(room, Vec::new()))
    }

    pub async fn update_room(&self, id: Uuid, changes: &UpdateRoomPayload) -> Result<RoomView, AppError> {
        let mut tx = self.pool.begin().await?;

        // Trava o quarto para que o sincronizador não mude a ocupação no meio
        let current = self
            .room_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::RoomNotFound)?;
        let occupants = self.room_repo.occupants_of(&mut *tx, id).await?;

        let plan = RoomUpdatePlan::build(&current, occupants.len(), changes)?;

        let room = self
            .room_repo
            .update_room(
                &mut *tx,
                id,
                &plan.number,
                plan.room_type,
                plan.price_per_month,
                plan.status,
            )
            .await?;

        tx.commit().await?;

        if current.status != room.status {
            tracing::info!(room = %room.number, from = ?current.status, to = ?room.status, "Status do quarto alterado");
        }

        Ok(RoomView::new(room, occupants))
    }

    /// Só apaga quartos vazios; hóspedes ativos precisam sair antes.
    pub async fn delete_room(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let room = self
            .room_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::RoomNotFound)?;

        if !self.room_repo.occupants_of(&mut *tx, id).await?.is_empty() {
            return Err(AppError::RoomOccupied(room.number));
        }

        self.room_repo.delete_room(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(room = %room.number, "Quarto removido");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::{
        db::ResidentRepository,
        models::resident::CreateResidentPayload,
        services::resident_service::ResidentService,
    };

    fn room(number: &str, room_type: RoomType, status: RoomStatus) -> Room {
        let now = Utc::now();
        Room {
            id: Uuid::new_v4(),
            number: number.into(),
            room_type,
            price_per_month: Decimal::new(30000, 2),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_room_can_be_renumbered_and_retyped() {
        let current = room("101", RoomType::Single, RoomStatus::Available);
        let changes = UpdateRoomPayload {
            number: Some("201".into()),
            room_type: Some(RoomType::Quad),
            ..Default::default()
        };

        let plan = RoomUpdatePlan::build(&current, 0, &changes).unwrap();

        assert_eq!(plan.number, "201");
        assert_eq!(plan.room_type, RoomType::Quad);
        assert_eq!(plan.price_per_month, current.price_per_month);
        assert_eq!(plan.status, RoomStatus::Available);
    }

    #[test]
    fn occupied_room_keeps_its_number() {
        let current = room("101", RoomType::Double, RoomStatus::Occupied);
        let changes = UpdateRoomPayload {
            number: Some("103".into()),
            ..Default::default()
        };

        let err = RoomUpdatePlan::build(&current, 1, &changes).unwrap_err();
        assert!(matches!(err, AppError::RoomOccupied(ref n) if n == "101"));

        // Reenviar o mesmo número não é mudança.
        let same = UpdateRoomPayload {
            number: Some("101".into()),
            ..Default::default()
        };
        assert!(RoomUpdatePlan::build(&current, 1, &same).is_ok());
    }

    #[test]
    fn type_cannot_shrink_below_occupancy() {
        let current = room("102", RoomType::Double, RoomStatus::Occupied);
        let changes = UpdateRoomPayload {
            room_type: Some(RoomType::Single),
            ..Default::default()
        };

        let err = RoomUpdatePlan::build(&current, 2, &changes).unwrap_err();
        assert!(matches!(
            err,
            AppError::RoomCapacityBelowOccupancy { capacity: 1, occupants: 2, .. }
        ));
    }

    #[test]
    fn clearing_maintenance_recomputes_status_from_occupants() {
        let current = room("102", RoomType::Double, RoomStatus::Maintenance);
        let changes = UpdateRoomPayload {
            status: Some(RoomStatus::Available),
            ..Default::default()
        };

        let plan = RoomUpdatePlan::build(&current, 1, &changes).unwrap();
        assert_eq!(plan.status, RoomStatus::Occupied);
    }

    #[test]
    fn status_is_kept_when_not_requested() {
        let current = room("102", RoomType::Double, RoomStatus::Maintenance);
        let changes = UpdateRoomPayload {
            price_per_month: Some(Decimal::new(45000, 2)),
            ..Default::default()
        };

        let plan = RoomUpdatePlan::build(&current, 0, &changes).unwrap();
        assert_eq!(plan.status, RoomStatus::Maintenance);
        assert_eq!(plan.price_per_month, Decimal::new(45000, 2));
    }

    #[sqlx::test]
    async fn only_empty_rooms_can_be_deleted(pool: PgPool) {
        let rooms = RoomService::new(RoomRepository::new(pool.clone()), pool.clone());
        let create = |number: &str| CreateRoomPayload {
            number: number.into(),
            room_type: RoomType::Single,
            price_per_month: Decimal::new(30000, 2),
            status: None,
        };
        let empty = rooms.create_room(&create("101")).await.unwrap();
        let taken = rooms.create_room(&create("102")).await.unwrap();

        ResidentService::new(ResidentRepository::new(pool.clone()), pool.clone())
            .create_resident(&CreateResidentPayload {
                name: "Alice".into(),
                room_number: "102".into(),
                phone: "11 99999-0000".into(),
                status: None,
                expected_checkout: None,
            })
            .await
            .unwrap();

        rooms.delete_room(empty.room.id).await.unwrap();
        assert!(matches!(rooms.get_room(empty.room.id).await, Err(AppError::RoomNotFound)));
        assert!(matches!(rooms.delete_room(empty.room.id).await, Err(AppError::RoomNotFound)));

        let err = rooms.delete_room(taken.room.id).await.unwrap_err();
        assert!(matches!(err, AppError::RoomOccupied(ref n) if n == "102"));
        assert_eq!(rooms.get_room(taken.room.id).await.unwrap().occupants.len(), 1);
    }
}
