pub mod auth;
pub mod occupancy;
pub mod resident_service;
pub mod room_service;
