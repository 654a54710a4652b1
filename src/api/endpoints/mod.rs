//! API endpoint handlers, one module per feature area.

pub mod appointments;
pub mod guidance;
pub mod health;
pub mod medications;
pub mod users;
