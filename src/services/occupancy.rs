// src/services/occupancy.rs

//! Sincronização de ocupação entre hóspedes e quartos.
//!
//! O hóspede é a fonte da verdade; a lista de ocupantes do quarto é derivada
//! e só é escrita por aqui. Regras mantidas a cada operação:
//!
//! - hóspede `active` com número de quarto aparece exatamente uma vez nesse quarto;
//! - hóspede `inactive` não aparece em quarto nenhum;
//! - ocupantes nunca passam da capacidade do tipo do quarto;
//! - fora de `maintenance`, o quarto está `occupied` se e só se tem ocupantes.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    resident::{Resident, ResidentStatus},
    room::{RoomStatus, RoomType},
};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("O quarto '{0}' não existe")]
    RoomNotFound(String),

    #[error("O quarto '{0}' está lotado")]
    RoomFull(String),

    #[error("Falha ao acessar o banco de dados")]
    StoreUnavailable(#[from] sqlx::Error),
}

/// O que o sincronizador precisa saber de um quarto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSlot {
    pub id: Uuid,
    pub number: String,
    pub room_type: RoomType,
    pub status: RoomStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Added,
    AlreadyPresent,
    Full,
}

/// Porta de persistência da ocupação.
///
/// Cada `push_occupant`/`pull_occupant` é atômico em relação aos demais
/// sobre o mesmo quarto (a implementação Postgres trava a linha do quarto).
#[async_trait]
pub trait OccupancyStore: Send {
    async fn find_room(&mut self, number: &str) -> Result<Option<RoomSlot>, sqlx::Error>;

    /// Trava de uma vez os quartos informados, sempre na mesma ordem.
    /// Usado antes de mexer em dois quartos na mesma transação.
    async fn lock_rooms(&mut self, numbers: &[&str]) -> Result<(), sqlx::Error>;

    /// Anexa o hóspede ao fim da lista se houver vaga.
    async fn push_occupant(
        &mut self,
        room_id: Uuid,
        resident_id: Uuid,
        capacity: usize,
    ) -> Result<PushOutcome, sqlx::Error>;

    /// Remove o hóspede e devolve quantos ocupantes restaram.
    async fn pull_occupant(&mut self, room_id: Uuid, resident_id: Uuid) -> Result<usize, sqlx::Error>;

    async fn set_status(&mut self, room_id: Uuid, status: RoomStatus) -> Result<(), sqlx::Error>;
}

/// A parte do hóspede que importa para a ocupação.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub resident_id: Uuid,
    pub room_number: String,
    pub status: ResidentStatus,
}

impl Placement {
    fn holds_a_bed(&self) -> bool {
        self.status == ResidentStatus::Active && !self.room_number.is_empty()
    }
}

impl From<&Resident> for Placement {
    fn from(resident: &Resident) -> Self {
        Self {
            resident_id: resident.id,
            room_number: resident.room_number.clone(),
            status: resident.status,
        }
    }
}

pub struct OccupancySynchronizer<S> {
    store: S,
}

impl<S: OccupancyStore> OccupancySynchronizer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub async fn on_resident_added(&mut self, resident: &Placement) -> Result<(), SyncError> {
        if !resident.holds_a_bed() {
            return Ok(());
        }

        let room = self
            .store
            .find_room(&resident.room_number)
            .await?
            .ok_or_else(|| SyncError::RoomNotFound(resident.room_number.clone()))?;

        let outcome = self
            .store
            .push_occupant(room.id, resident.resident_id, room.room_type.capacity())
            .await?;

        match outcome {
            PushOutcome::Full => return Err(SyncError::RoomFull(room.number)),
            PushOutcome::AlreadyPresent => {
                tracing::debug!(resident_id = %resident.resident_id, room = %room.number, "Hóspede já estava no quarto");
            }
            PushOutcome::Added => {
                tracing::info!(resident_id = %resident.resident_id, room = %room.number, "Hóspede adicionado ao quarto");
            }
        }

        // Manutenção é ortogonal à ocupação: só a administração a retira.
        if room.status == RoomStatus::Available {
            self.store.set_status(room.id, RoomStatus::Occupied).await?;
        }

        Ok(())
    }

    pub async fn on_resident_removed(&mut self, room_number: &str, resident_id: Uuid) -> Result<(), SyncError> {
        if room_number.is_empty() {
            return Ok(());
        }

        let Some(room) = self.store.find_room(room_number).await? else {
            tracing::debug!(room = %room_number, "Quarto não existe mais; nada a remover");
            return Ok(());
        };

        let remaining = self.store.pull_occupant(room.id, resident_id).await?;

        if remaining == 0 && room.status == RoomStatus::Occupied {
            self.store.set_status(room.id, RoomStatus::Available).await?;
        }

        Ok(())
    }

    /// Remove do quarto antigo e depois adiciona no novo, nessa ordem,
    /// para que a vaga liberada já conte na checagem de capacidade.
    pub async fn on_resident_updated(&mut self, previous: &Placement, updated: &Placement) -> Result<(), SyncError> {
        if previous.room_number == updated.room_number && previous.status == updated.status {
            return Ok(());
        }

        // Troca de quarto: os dois quartos são travados juntos, em ordem fixa.
        let mut rooms: Vec<&str> = [previous, updated]
            .into_iter()
            .filter(|p| p.holds_a_bed())
            .map(|p| p.room_number.as_str())
            .collect();
        rooms.sort_unstable();
        rooms.dedup();
        if rooms.len() > 1 {
            self.store.lock_rooms(&rooms).await?;
        }

        if previous.holds_a_bed() {
            self.on_resident_removed(&previous.room_number, previous.resident_id)
                .await?;
        }

        if updated.holds_a_bed() {
            self.on_resident_added(updated).await?;
        }

        Ok(())
    }
}
