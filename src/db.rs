pub mod user_repo;
pub use user_repo::UserRepository;
pub mod room_repo;
pub use room_repo::RoomRepository;
pub mod resident_repo;
pub use resident_repo::{ResidentChanges, ResidentRepository};
pub mod occupancy_store;
pub use occupancy_store::PgOccupancyStore;
