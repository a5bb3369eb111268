pub mod auth;
pub mod residents;
pub mod rooms;
