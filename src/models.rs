pub mod auth;
pub mod resident;
pub mod room;
